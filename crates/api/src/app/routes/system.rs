use axum::{Json, http::StatusCode};
use chrono::{SecondsFormat, Utc};

use crate::app::{dto, errors};

pub async fn health() -> Json<dto::HealthResponse> {
    Json(dto::HealthResponse {
        status: "OK",
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
    })
}

pub async fn not_found() -> axum::response::Response {
    errors::json_error(StatusCode::NOT_FOUND, "not_found", "route not found")
}
