use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};

use shopfloor_core::GoodsReceiptId;
use shopfloor_infra::store::GoodsReceiptStore;
use shopfloor_purchasing::GoodsReceiptDraft;

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_receipts).post(create_receipt))
        .route(
            "/:id",
            get(get_receipt).put(update_receipt).delete(delete_receipt),
        )
}

fn parse_id(id: String) -> Result<GoodsReceiptId, axum::response::Response> {
    GoodsReceiptId::try_from(id).map_err(errors::domain_error_to_response)
}

pub async fn list_receipts(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.receipts.list().await {
        Ok(receipts) => Json(receipts).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn get_receipt(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match parse_id(id) {
        Ok(id) => id,
        Err(res) => return res,
    };

    match services.receipts.get(&id).await {
        Ok(receipt) => Json(receipt).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

/// Store a receipt and apply its lines to material stock.
pub async fn create_receipt(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<GoodsReceiptDraft>, JsonRejection>,
) -> axum::response::Response {
    let Json(draft) = match body {
        Ok(body) => body,
        Err(rejection) => return errors::json_rejection_to_response(rejection),
    };

    let id = draft.id.clone().unwrap_or_else(GoodsReceiptId::generate);
    let receipt = match draft.into_receipt(id) {
        Ok(r) => r,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services.receiving.create_receipt(receipt).await {
        Ok((receipt, reconciliation)) => (
            StatusCode::CREATED,
            Json(dto::ReceiptCreatedResponse {
                receipt,
                reconciliation,
            }),
        )
            .into_response(),
        Err(e) => errors::reconcile_error_to_response(e),
    }
}

/// Edits the record only; stock already applied is left as is.
pub async fn update_receipt(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    body: Result<Json<GoodsReceiptDraft>, JsonRejection>,
) -> axum::response::Response {
    let id = match parse_id(id) {
        Ok(id) => id,
        Err(res) => return res,
    };
    let Json(draft) = match body {
        Ok(body) => body,
        Err(rejection) => return errors::json_rejection_to_response(rejection),
    };

    let receipt = match draft.into_receipt(id) {
        Ok(r) => r,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services.receipts.update(&receipt).await {
        Ok(()) => Json(receipt).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

/// Deleting a receipt does not reverse its stock adjustments.
pub async fn delete_receipt(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match parse_id(id) {
        Ok(id) => id,
        Err(res) => return res,
    };

    match services.receipts.delete(&id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}
