use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};

use shopfloor_core::SupplierId;
use shopfloor_infra::store::SupplierStore;
use shopfloor_parties::SupplierDraft;

use crate::app::errors;
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_suppliers).post(create_supplier))
        .route(
            "/:id",
            get(get_supplier).put(update_supplier).delete(delete_supplier),
        )
}

fn parse_id(id: String) -> Result<SupplierId, axum::response::Response> {
    SupplierId::try_from(id).map_err(errors::domain_error_to_response)
}

pub async fn list_suppliers(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.suppliers.list().await {
        Ok(list) => Json(list).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn get_supplier(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match parse_id(id) {
        Ok(id) => id,
        Err(res) => return res,
    };

    match services.suppliers.get(&id).await {
        Ok(supplier) => Json(supplier).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn create_supplier(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<SupplierDraft>, JsonRejection>,
) -> axum::response::Response {
    let Json(draft) = match body {
        Ok(body) => body,
        Err(rejection) => return errors::json_rejection_to_response(rejection),
    };

    let id = draft.id.clone().unwrap_or_else(SupplierId::generate);
    let supplier = match draft.into_supplier(id) {
        Ok(s) => s,
        Err(e) => return errors::domain_error_to_response(e),
    };

    if let Err(e) = services.suppliers.insert(&supplier).await {
        return errors::store_error_to_response(e);
    }

    tracing::info!(supplier_id = %supplier.id, "supplier created");
    (StatusCode::CREATED, Json(supplier)).into_response()
}

pub async fn update_supplier(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    body: Result<Json<SupplierDraft>, JsonRejection>,
) -> axum::response::Response {
    let id = match parse_id(id) {
        Ok(id) => id,
        Err(res) => return res,
    };
    let Json(draft) = match body {
        Ok(body) => body,
        Err(rejection) => return errors::json_rejection_to_response(rejection),
    };

    let supplier = match draft.into_supplier(id) {
        Ok(s) => s,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services.suppliers.update(&supplier).await {
        Ok(()) => Json(supplier).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

/// 409 while purchase orders still reference the supplier.
pub async fn delete_supplier(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match parse_id(id) {
        Ok(id) => id,
        Err(res) => return res,
    };

    match services.suppliers.delete(&id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}
