use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};

use shopfloor_core::PurchaseOrderId;
use shopfloor_infra::store::PurchaseOrderStore;
use shopfloor_purchasing::PurchaseOrderDraft;

use crate::app::errors;
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_orders).post(create_order))
        .route("/:id", get(get_order).put(update_order).delete(delete_order))
}

fn parse_id(id: String) -> Result<PurchaseOrderId, axum::response::Response> {
    PurchaseOrderId::try_from(id).map_err(errors::domain_error_to_response)
}

pub async fn list_orders(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.purchase_orders.list().await {
        Ok(orders) => Json(orders).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn get_order(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match parse_id(id) {
        Ok(id) => id,
        Err(res) => return res,
    };

    match services.purchase_orders.get(&id).await {
        Ok(order) => Json(order).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn create_order(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<PurchaseOrderDraft>, JsonRejection>,
) -> axum::response::Response {
    let Json(draft) = match body {
        Ok(body) => body,
        Err(rejection) => return errors::json_rejection_to_response(rejection),
    };

    let id = draft.id.clone().unwrap_or_else(PurchaseOrderId::generate);
    let order = match draft.into_order(id) {
        Ok(o) => o,
        Err(e) => return errors::domain_error_to_response(e),
    };

    if let Err(e) = services.purchase_orders.insert(&order).await {
        return errors::store_error_to_response(e);
    }

    tracing::info!(po_id = %order.id, lines = order.items.len(), "purchase order created");
    (StatusCode::CREATED, Json(order)).into_response()
}

pub async fn update_order(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    body: Result<Json<PurchaseOrderDraft>, JsonRejection>,
) -> axum::response::Response {
    let id = match parse_id(id) {
        Ok(id) => id,
        Err(res) => return res,
    };
    let Json(draft) = match body {
        Ok(body) => body,
        Err(rejection) => return errors::json_rejection_to_response(rejection),
    };

    let order = match draft.into_order(id) {
        Ok(o) => o,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services.purchase_orders.update(&order).await {
        Ok(()) => Json(order).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn delete_order(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match parse_id(id) {
        Ok(id) => id,
        Err(res) => return res,
    };

    match services.purchase_orders.delete(&id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}
