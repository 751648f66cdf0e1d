use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, put},
};

use shopfloor_core::{ProjectItemId, SubAssemblyId};
use shopfloor_infra::store::SubAssemblyStore;
use shopfloor_production::SubAssemblyDraft;

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_sub_assemblies).post(create_sub_assembly))
        .route("/item/:item_id", get(list_by_item))
        .route("/item/:item_id/lock", put(lock_by_item))
        .route(
            "/:id",
            get(get_sub_assembly)
                .put(update_sub_assembly)
                .delete(delete_sub_assembly),
        )
}

fn parse_id(id: String) -> Result<SubAssemblyId, axum::response::Response> {
    SubAssemblyId::try_from(id).map_err(errors::domain_error_to_response)
}

fn parse_item_id(id: String) -> Result<ProjectItemId, axum::response::Response> {
    ProjectItemId::try_from(id).map_err(errors::domain_error_to_response)
}

pub async fn list_sub_assemblies(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.sub_assemblies.list().await {
        Ok(list) => Json(list).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn get_sub_assembly(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match parse_id(id) {
        Ok(id) => id,
        Err(res) => return res,
    };

    match services.sub_assemblies.get(&id).await {
        Ok(sa) => Json(sa).into_response(),
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

    match services.sub_assemblies.list_by_item(&item_id).await {
        Ok(list) => Json(list).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

/// Create a sub-assembly; the first process step starts with `totalNeeded`
/// units available.
pub async fn create_sub_assembly(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<SubAssemblyDraft>, JsonRejection>,
) -> axum::response::Response {
    let Json(draft) = match body {
        Ok(body) => body,
        Err(rejection) => return errors::json_rejection_to_response(rejection),
    };

    let id = draft.id.clone().unwrap_or_else(SubAssemblyId::generate);
    let sub_assembly = match draft.into_sub_assembly(id) {
        Ok(sa) => sa,
        Err(e) => return errors::domain_error_to_response(e),
    };

    if let Err(e) = services.sub_assemblies.insert(&sub_assembly).await {
        return errors::store_error_to_response(e);
    }

    tracing::info!(
        sub_assembly_id = %sub_assembly.id,
        item_id = %sub_assembly.item_id,
        steps = sub_assembly.processes.len(),
        "sub-assembly created"
    );
    (StatusCode::CREATED, Json(sub_assembly)).into_response()
}

pub async fn update_sub_assembly(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    body: Result<Json<SubAssemblyDraft>, JsonRejection>,
) -> axum::response::Response {
    let id = match parse_id(id) {
        Ok(id) => id,
        Err(res) => return res,
    };
    let Json(draft) = match body {
        Ok(body) => body,
        Err(rejection) => return errors::json_rejection_to_response(rejection),
    };

    match services.sub_assemblies.update(&id, draft).await {
        Ok(sa) => Json(sa).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn delete_sub_assembly(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match parse_id(id) {
        Ok(id) => id,
        Err(res) => return res,
    };

    match services.sub_assemblies.delete(&id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

/// 404 when the item does not exist; an item without sub-assemblies answers
/// 200 with `count: 0`.
pub async fn lock_by_item(
    Extension(services): Extension<Arc<AppServices>>,
    Path(item_id): Path<String>,
    body: Result<Json<dto::LockRequest>, JsonRejection>,
) -> axum::response::Response {
    let item_id = match parse_item_id(item_id) {
        Ok(id) => id,
        Err(res) => return res,
    };
    let Json(body) = match body {
        Ok(body) => body,
        Err(rejection) => return errors::json_rejection_to_response(rejection),
    };

    match services
        .sub_assemblies
        .set_locked_for_item(&item_id, body.is_locked)
        .await
    {
        Ok(sub_assemblies) => Json(dto::LockResponse {
            message: format!(
                "Sub-assemblies for item {item_id} {} successfully",
                if body.is_locked { "locked" } else { "unlocked" }
            ),
            count: sub_assemblies.len(),
            sub_assemblies,
        })
        .into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}
