use std::fmt::Display;

use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use heroes_core::DomainError;
use heroes_infra::CrudError;

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

/// Store failure: logged in full, answered generically.
pub fn internal_error(context: &str, err: &CrudError) -> axum::response::Response {
    tracing::error!(error = %err, "{context}");
    json_error(
        StatusCode::INTERNAL_SERVER_ERROR,
        "internal_error",
        "internal server error",
    )
}

/// Malformed input rejected by an extractor (body, query or path).
pub fn bad_request(message: impl Display) -> axum::response::Response {
    json_error(StatusCode::BAD_REQUEST, "validation_error", message.to_string())
}

pub fn domain_error_to_response(err: DomainError) -> axum::response::Response {
    match err {
        DomainError::Validation(msg) => json_error(StatusCode::BAD_REQUEST, "validation_error", msg),
        DomainError::InvalidId(msg) => json_error(StatusCode::BAD_REQUEST, "invalid_id", msg),
    }
}

/// Id-scoped mutation matched nothing.
pub fn id_not_found() -> axum::response::Response {
    json_error(
        StatusCode::PRECONDITION_FAILED,
        "precondition_failed",
        "id not found",
    )
}
