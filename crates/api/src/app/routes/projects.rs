use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};

use shopfloor_core::ProjectId;
use shopfloor_infra::store::ProjectStore;
use shopfloor_projects::ProjectDraft;

use crate::app::errors;
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_projects).post(create_project))
        .route(
            "/:id",
            get(get_project).put(update_project).delete(delete_project),
        )
}

pub(crate) fn parse_project_id(id: String) -> Result<ProjectId, axum::response::Response> {
    ProjectId::try_from(id).map_err(errors::domain_error_to_response)
}

pub async fn list_projects(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.projects.list().await {
        Ok(list) => Json(list).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn get_project(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match parse_project_id(id) {
        Ok(id) => id,
        Err(res) => return res,
    };

    match services.projects.get(&id).await {
        Ok(project) => Json(project).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn create_project(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<ProjectDraft>, JsonRejection>,
) -> axum::response::Response {
    let Json(draft) = match body {
        Ok(body) => body,
        Err(rejection) => return errors::json_rejection_to_response(rejection),
    };

    let id = draft.id.clone().unwrap_or_else(ProjectId::generate);
    let project = match draft.into_project(id) {
        Ok(p) => p,
        Err(e) => return errors::domain_error_to_response(e),
    };

    if let Err(e) = services.projects.insert(&project).await {
        return errors::store_error_to_response(e);
    }

    tracing::info!(project_id = %project.id, code = %project.code, "project created");
    (StatusCode::CREATED, Json(project)).into_response()
}

pub async fn update_project(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    body: Result<Json<ProjectDraft>, JsonRejection>,
) -> axum::response::Response {
    let id = match parse_project_id(id) {
        Ok(id) => id,
        Err(res) => return res,
    };
    let Json(draft) = match body {
        Ok(body) => body,
        Err(rejection) => return errors::json_rejection_to_response(rejection),
    };

    let project = match draft.into_project(id) {
        Ok(p) => p,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services.projects.update(&project).await {
        Ok(()) => Json(project).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn delete_project(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match parse_project_id(id) {
        Ok(id) => id,
        Err(res) => return res,
    };

    match services.projects.delete(&id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}
