//! JSON error responses in the relay's `{"error": ...}` shape.

use axum::Json;
use axum::http::StatusCode;
use tripchat_types::RelayResponse;

pub type ErrorResponse = (StatusCode, Json<RelayResponse>);

fn error(status: StatusCode, message: impl Into<String>) -> ErrorResponse {
    (status, Json(RelayResponse::error(message)))
}

pub fn bad_request(message: impl Into<String>) -> ErrorResponse {
    error(StatusCode::BAD_REQUEST, message)
}

pub fn method_not_allowed() -> ErrorResponse {
    error(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed")
}

pub fn internal_error(message: impl Into<String>) -> ErrorResponse {
    error(StatusCode::INTERNAL_SERVER_ERROR, message)
}
