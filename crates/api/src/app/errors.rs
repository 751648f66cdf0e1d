use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use shopfloor_core::DomainError;
use shopfloor_infra::{ReconcileError, StoreError};

pub fn store_error_to_response(err: StoreError) -> axum::response::Response {
    match err {
        StoreError::NotFound(kind) => {
            json_error(StatusCode::NOT_FOUND, "not_found", format!("{kind} not found"))
        }
        StoreError::Conflict(msg) => json_error(StatusCode::CONFLICT, "conflict", msg),
        StoreError::Validation(msg) => json_error(StatusCode::BAD_REQUEST, "validation_error", msg),
        err @ (StoreError::Corrupt(_) | StoreError::Database(_)) => {
            tracing::error!(error = %err, "store failure");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "store_error", err.to_string())
        }
    }
}

pub fn domain_error_to_response(err: DomainError) -> axum::response::Response {
    match err {
        DomainError::Validation(msg) => json_error(StatusCode::BAD_REQUEST, "validation_error", msg),
        DomainError::InvalidId(msg) => json_error(StatusCode::BAD_REQUEST, "invalid_id", msg),
        DomainError::NotFound(kind) => {
            json_error(StatusCode::NOT_FOUND, "not_found", format!("{kind} not found"))
        }
    }
}

pub fn reconcile_error_to_response(err: ReconcileError) -> axum::response::Response {
    match err {
        ReconcileError::OrderNotFound(id) => json_error(
            StatusCode::NOT_FOUND,
            "not_found",
            format!("purchase order {id} not found"),
        ),
        ReconcileError::Store(e) => store_error_to_response(e),
    }
}

/// Malformed or mistyped JSON bodies are a 400 with the parser's message.
pub fn json_rejection_to_response(rejection: JsonRejection) -> axum::response::Response {
    json_error(StatusCode::BAD_REQUEST, "invalid_body", rejection.body_text())
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_errors_map_to_http_statuses() {
        let cases = [
            (StoreError::NotFound("material"), StatusCode::NOT_FOUND),
            (StoreError::Conflict("dup".into()), StatusCode::CONFLICT),
            (StoreError::Validation("bad".into()), StatusCode::BAD_REQUEST),
            (StoreError::Corrupt("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
            (StoreError::Database("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(store_error_to_response(err).status(), status);
        }
    }

    #[test]
    fn missing_order_during_receipt_is_404() {
        let res = reconcile_error_to_response(ReconcileError::OrderNotFound("po1".parse().unwrap()));
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }
}
