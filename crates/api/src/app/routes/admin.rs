use std::sync::Arc;

use axum::{
    Json, Router,
    extract::Extension,
    response::IntoResponse,
    routing::post,
};

use shopfloor_infra::store::SubAssemblyStore;

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new().route(
        "/sub-assemblies/backfill-step-stats",
        post(backfill_step_stats),
    )
}

/// Repair every stored sub-assembly's step counters and re-seed the first
/// step's availability from `totalNeeded`.
pub async fn backfill_step_stats(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.sub_assemblies.backfill_step_stats().await {
        Ok(rewritten) => Json(dto::BackfillResponse { rewritten }).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}
