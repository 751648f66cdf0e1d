use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};

use shopfloor_core::BomItemId;
use shopfloor_infra::store::BomItemStore;
use shopfloor_projects::BomItemDraft;

use super::project_items::parse_item_id;
use crate::app::errors;
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_bom_items).post(create_bom_item))
        .route("/item/:item_id", get(list_by_item))
        .route(
            "/:id",
            get(get_bom_item).put(update_bom_item).delete(delete_bom_item),
        )
}

fn parse_id(id: String) -> Result<BomItemId, axum::response::Response> {
    BomItemId::try_from(id).map_err(errors::domain_error_to_response)
}

pub async fn list_bom_items(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.bom_items.list().await {
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

    match services.bom_items.list_by_item(&item_id).await {
        Ok(list) => Json(list).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn get_bom_item(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match parse_id(id) {
        Ok(id) => id,
        Err(res) => return res,
    };

    match services.bom_items.get(&id).await {
        Ok(bom_item) => Json(bom_item).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn create_bom_item(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<BomItemDraft>, JsonRejection>,
) -> axum::response::Response {
    let Json(draft) = match body {
        Ok(body) => body,
        Err(rejection) => return errors::json_rejection_to_response(rejection),
    };

    let id = draft.id.clone().unwrap_or_else(BomItemId::generate);
    let bom_item = match draft.into_bom_item(id) {
        Ok(b) => b,
        Err(e) => return errors::domain_error_to_response(e),
    };

    if let Err(e) = services.bom_items.insert(&bom_item).await {
        return errors::store_error_to_response(e);
    }

    tracing::info!(
        bom_item_id = %bom_item.id,
        item_id = %bom_item.item_id,
        material_id = %bom_item.material_id,
        "bom line created"
    );
    (StatusCode::CREATED, Json(bom_item)).into_response()
}

pub async fn update_bom_item(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    body: Result<Json<BomItemDraft>, JsonRejection>,
) -> axum::response::Response {
    let id = match parse_id(id) {
        Ok(id) => id,
        Err(res) => return res,
    };
    let Json(draft) = match body {
        Ok(body) => body,
        Err(rejection) => return errors::json_rejection_to_response(rejection),
    };

    let bom_item = match draft.into_bom_item(id) {
        Ok(b) => b,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services.bom_items.update(&bom_item).await {
        Ok(()) => Json(bom_item).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn delete_bom_item(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match parse_id(id) {
        Ok(id) => id,
        Err(res) => return res,
    };

    match services.bom_items.delete(&id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}
