use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, put},
};

use shopfloor_core::MaterialId;
use shopfloor_infra::store::MaterialStore;
use shopfloor_inventory::MaterialDraft;

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_materials).post(create_material))
        .route(
            "/:id",
            get(get_material).put(update_material).delete(delete_material),
        )
        .route("/:id/adjust-stock", put(adjust_stock))
}

fn parse_id(id: String) -> Result<MaterialId, axum::response::Response> {
    MaterialId::try_from(id).map_err(errors::domain_error_to_response)
}

pub async fn list_materials(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.materials.list().await {
        Ok(materials) => Json(
            materials
                .into_iter()
                .map(dto::MaterialResponse::from)
                .collect::<Vec<_>>(),
        )
        .into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn get_material(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match parse_id(id) {
        Ok(id) => id,
        Err(res) => return res,
    };

    match services.materials.get(&id).await {
        Ok(material) => Json(dto::MaterialResponse::from(material)).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn create_material(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<MaterialDraft>, JsonRejection>,
) -> axum::response::Response {
    let Json(draft) = match body {
        Ok(body) => body,
        Err(rejection) => return errors::json_rejection_to_response(rejection),
    };

    let id = draft.id.clone().unwrap_or_else(MaterialId::generate);
    let material = match draft.into_material(id) {
        Ok(m) => m,
        Err(e) => return errors::domain_error_to_response(e),
    };

    if let Err(e) = services.materials.insert(&material).await {
        return errors::store_error_to_response(e);
    }

    tracing::info!(material_id = %material.id, code = %material.code, "material created");
    (StatusCode::CREATED, Json(dto::MaterialResponse::from(material))).into_response()
}

pub async fn update_material(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    body: Result<Json<MaterialDraft>, JsonRejection>,
) -> axum::response::Response {
    let id = match parse_id(id) {
        Ok(id) => id,
        Err(res) => return res,
    };
    let Json(draft) = match body {
        Ok(body) => body,
        Err(rejection) => return errors::json_rejection_to_response(rejection),
    };

    let material = match draft.into_material(id) {
        Ok(m) => m,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services.materials.update(&material).await {
        Ok(()) => Json(dto::MaterialResponse::from(material)).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn delete_material(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match parse_id(id) {
        Ok(id) => id,
        Err(res) => return res,
    };

    match services.materials.delete(&id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

/// Manual stock correction; goes through the same atomic delta as receipts.
pub async fn adjust_stock(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    body: Result<Json<dto::AdjustStockRequest>, JsonRejection>,
) -> axum::response::Response {
    let id = match parse_id(id) {
        Ok(id) => id,
        Err(res) => return res,
    };
    let Json(body) = match body {
        Ok(body) => body,
        Err(rejection) => return errors::json_rejection_to_response(rejection),
    };

    if let Err(e) = services.materials.adjust_stock(&id, body.amount).await {
        return errors::store_error_to_response(e);
    }
    tracing::info!(material_id = %id, delta = body.amount, "stock adjusted manually");

    match services.materials.get(&id).await {
        Ok(material) => Json(dto::MaterialResponse::from(material)).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}
