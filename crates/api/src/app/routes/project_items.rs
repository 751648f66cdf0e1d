use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};

use shopfloor_core::ProjectItemId;
use shopfloor_infra::store::ProjectItemStore;
use shopfloor_projects::ProjectItemDraft;

use super::projects::parse_project_id;
use crate::app::errors;
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_items).post(create_item))
        .route("/project/:project_id", get(list_by_project))
        .route("/:id", get(get_item).put(update_item).delete(delete_item))
}

pub(crate) fn parse_item_id(id: String) -> Result<ProjectItemId, axum::response::Response> {
    ProjectItemId::try_from(id).map_err(errors::domain_error_to_response)
}

pub async fn list_items(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.project_items.list().await {
        Ok(list) => Json(list).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

/// 404 when the project does not exist; an empty array when it has no items.
pub async fn list_by_project(
    Extension(services): Extension<Arc<AppServices>>,
    Path(project_id): Path<String>,
) -> axum::response::Response {
    let project_id = match parse_project_id(project_id) {
        Ok(id) => id,
        Err(res) => return res,
    };

    match services.project_items.list_by_project(&project_id).await {
        Ok(list) => Json(list).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn get_item(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match parse_item_id(id) {
        Ok(id) => id,
        Err(res) => return res,
    };

    match services.project_items.get(&id).await {
        Ok(item) => Json(item).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn create_item(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<ProjectItemDraft>, JsonRejection>,
) -> axum::response::Response {
    let Json(draft) = match body {
        Ok(body) => body,
        Err(rejection) => return errors::json_rejection_to_response(rejection),
    };

    let id = draft.id.clone().unwrap_or_else(ProjectItemId::generate);
    let item = match draft.into_item(id) {
        Ok(item) => item,
        Err(e) => return errors::domain_error_to_response(e),
    };

    if let Err(e) = services.project_items.insert(&item).await {
        return errors::store_error_to_response(e);
    }

    tracing::info!(item_id = %item.id, project_id = %item.project_id, "project item created");
    (StatusCode::CREATED, Json(item)).into_response()
}

pub async fn update_item(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    body: Result<Json<ProjectItemDraft>, JsonRejection>,
) -> axum::response::Response {
    let id = match parse_item_id(id) {
        Ok(id) => id,
        Err(res) => return res,
    };
    let Json(draft) = match body {
        Ok(body) => body,
        Err(rejection) => return errors::json_rejection_to_response(rejection),
    };

    let item = match draft.into_item(id) {
        Ok(item) => item,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services.project_items.update(&item).await {
        Ok(()) => Json(item).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn delete_item(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match parse_item_id(id) {
        Ok(id) => id,
        Err(res) => return res,
    };

    match services.project_items.delete(&id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}
