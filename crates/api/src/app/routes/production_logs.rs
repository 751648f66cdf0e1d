use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use chrono::Utc;

use shopfloor_core::ProductionLogId;
use shopfloor_infra::store::ProductionLogStore;
use shopfloor_production::ProductionLogDraft;

use super::projects::parse_project_id;
use super::tasks::parse_task_id;
use crate::app::errors;
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_logs).post(create_log))
        .route("/task/:task_id", get(list_by_task))
        .route("/project/:project_id", get(list_by_project))
        .route("/:id", get(get_log).put(update_log).delete(delete_log))
}

fn parse_id(id: String) -> Result<ProductionLogId, axum::response::Response> {
    ProductionLogId::try_from(id).map_err(errors::domain_error_to_response)
}

pub async fn list_logs(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.production_logs.list().await {
        Ok(list) => Json(list).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn list_by_task(
    Extension(services): Extension<Arc<AppServices>>,
    Path(task_id): Path<String>,
) -> axum::response::Response {
    let task_id = match parse_task_id(task_id) {
        Ok(id) => id,
        Err(res) => return res,
    };

    match services.production_logs.list_by_task(&task_id).await {
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

    match services.production_logs.list_by_project(&project_id).await {
        Ok(list) => Json(list).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn get_log(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match parse_id(id) {
        Ok(id) => id,
        Err(res) => return res,
    };

    match services.production_logs.get(&id).await {
        Ok(log) => Json(log).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

/// Record a log entry stamped with the current time. Task counters are not
/// touched.
pub async fn create_log(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<ProductionLogDraft>, JsonRejection>,
) -> axum::response::Response {
    let Json(draft) = match body {
        Ok(body) => body,
        Err(rejection) => return errors::json_rejection_to_response(rejection),
    };

    let id = draft.id.clone().unwrap_or_else(ProductionLogId::generate);
    let log = match draft.into_log(id, Utc::now()) {
        Ok(log) => log,
        Err(e) => return errors::domain_error_to_response(e),
    };

    if let Err(e) = services.production_logs.insert(&log).await {
        return errors::store_error_to_response(e);
    }

    tracing::info!(
        log_id = %log.id,
        task_id = %log.task_id,
        log_type = log.log_type.as_str(),
        good_qty = log.good_qty,
        defect_qty = log.defect_qty,
        "production log recorded"
    );
    (StatusCode::CREATED, Json(log)).into_response()
}

pub async fn update_log(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    body: Result<Json<ProductionLogDraft>, JsonRejection>,
) -> axum::response::Response {
    let id = match parse_id(id) {
        Ok(id) => id,
        Err(res) => return res,
    };
    let Json(draft) = match body {
        Ok(body) => body,
        Err(rejection) => return errors::json_rejection_to_response(rejection),
    };

    let current = match services.production_logs.get(&id).await {
        Ok(log) => log,
        Err(e) => return errors::store_error_to_response(e),
    };
    let log = match draft.into_log(id, current.timestamp) {
        Ok(log) => log,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services.production_logs.update(&log).await {
        Ok(()) => Json(log).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn delete_log(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match parse_id(id) {
        Ok(id) => id,
        Err(res) => return res,
    };

    match services.production_logs.delete(&id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}
