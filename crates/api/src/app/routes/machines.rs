use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, put},
};

use shopfloor_core::MachineId;
use shopfloor_infra::store::MachineStore;
use shopfloor_production::MachineDraft;

use crate::app::errors;
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_machines).post(create_machine))
        .route(
            "/:id",
            get(get_machine).put(update_machine).delete(delete_machine),
        )
        .route("/:id/toggle-maintenance", put(toggle_maintenance))
}

fn parse_id(id: String) -> Result<MachineId, axum::response::Response> {
    MachineId::try_from(id).map_err(errors::domain_error_to_response)
}

pub async fn list_machines(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.machines.list().await {
        Ok(list) => Json(list).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn get_machine(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match parse_id(id) {
        Ok(id) => id,
        Err(res) => return res,
    };

    match services.machines.get(&id).await {
        Ok(machine) => Json(machine).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn create_machine(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<MachineDraft>, JsonRejection>,
) -> axum::response::Response {
    let Json(draft) = match body {
        Ok(body) => body,
        Err(rejection) => return errors::json_rejection_to_response(rejection),
    };

    let id = draft.id.clone().unwrap_or_else(MachineId::generate);
    let machine = match draft.into_machine(id) {
        Ok(m) => m,
        Err(e) => return errors::domain_error_to_response(e),
    };

    if let Err(e) = services.machines.insert(&machine).await {
        return errors::store_error_to_response(e);
    }

    tracing::info!(machine_id = %machine.id, code = %machine.code, "machine created");
    (StatusCode::CREATED, Json(machine)).into_response()
}

pub async fn update_machine(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    body: Result<Json<MachineDraft>, JsonRejection>,
) -> axum::response::Response {
    let id = match parse_id(id) {
        Ok(id) => id,
        Err(res) => return res,
    };
    let Json(draft) = match body {
        Ok(body) => body,
        Err(rejection) => return errors::json_rejection_to_response(rejection),
    };

    let machine = match draft.into_machine(id) {
        Ok(m) => m,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services.machines.update(&machine).await {
        Ok(()) => Json(machine).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn delete_machine(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match parse_id(id) {
        Ok(id) => id,
        Err(res) => return res,
    };

    match services.machines.delete(&id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn toggle_maintenance(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match parse_id(id) {
        Ok(id) => id,
        Err(res) => return res,
    };

    match services.machines.toggle_maintenance(&id).await {
        Ok(machine) => Json(machine).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}
