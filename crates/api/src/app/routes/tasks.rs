use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};

use shopfloor_core::TaskId;
use shopfloor_infra::store::TaskStore;
use shopfloor_production::TaskDraft;

use super::project_items::parse_item_id;
use super::projects::parse_project_id;
use crate::app::errors;
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_tasks).post(create_task))
        .route("/project/:project_id", get(list_by_project))
        .route("/item/:item_id", get(list_by_item))
        .route("/:id", get(get_task).put(update_task).delete(delete_task))
}

pub(crate) fn parse_task_id(id: String) -> Result<TaskId, axum::response::Response> {
    TaskId::try_from(id).map_err(errors::domain_error_to_response)
}

pub async fn list_tasks(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.tasks.list().await {
        Ok(list) => Json(list).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn list_by_project(
    Extension(services): Extension<Arc<AppServices>>,
    Path(project_id): Path<String>,
) -> axum::response::Response {
    let project_id = match parse_project_id(project_id) {
        Ok(id) => id,
        Err(res) => return res,
    };

    match services.tasks.list_by_project(&project_id).await {
        Ok(list) => Json(list).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn list_by_item(
    Extension(services): Extension<Arc<AppServices>>,
    Path(item_id): Path<String>,
) -> axum::response::Response {
    let item_id = match parse_item_id(item_id) {
        Ok(id) => id,
        Err(res) => return res,
    };

    match services.tasks.list_by_item(&item_id).await {
        Ok(list) => Json(list).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn get_task(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match parse_task_id(id) {
        Ok(id) => id,
        Err(res) => return res,
    };

    match services.tasks.get(&id).await {
        Ok(task) => Json(task).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn create_task(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<TaskDraft>, JsonRejection>,
) -> axum::response::Response {
    let Json(draft) = match body {
        Ok(body) => body,
        Err(rejection) => return errors::json_rejection_to_response(rejection),
    };

    let id = draft.id.clone().unwrap_or_else(TaskId::generate);
    let task = match draft.into_task(id) {
        Ok(t) => t,
        Err(e) => return errors::domain_error_to_response(e),
    };

    if let Err(e) = services.tasks.insert(&task).await {
        return errors::store_error_to_response(e);
    }

    tracing::info!(
        task_id = %task.id,
        item_id = %task.item_id,
        step = task.step.as_str(),
        "task created"
    );
    (StatusCode::CREATED, Json(task)).into_response()
}

pub async fn update_task(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    body: Result<Json<TaskDraft>, JsonRejection>,
) -> axum::response::Response {
    let id = match parse_task_id(id) {
        Ok(id) => id,
        Err(res) => return res,
    };
    let Json(draft) = match body {
        Ok(body) => body,
        Err(rejection) => return errors::json_rejection_to_response(rejection),
    };

    let task = match draft.into_task(id) {
        Ok(t) => t,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services.tasks.update(&task).await {
        Ok(()) => Json(task).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn delete_task(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match parse_task_id(id) {
        Ok(id) => id,
        Err(res) => return res,
    };

    match services.tasks.delete(&id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}
