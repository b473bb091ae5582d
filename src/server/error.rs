// Error handling utilities and response helpers

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

/// Helper to create a JSON error response
pub fn json_error(status: StatusCode, message: &str) -> Response {
    (status, axum::Json(json!({"error": message}))).into_response()
}

/// Helper for "not found" errors
pub fn not_found(message: &str) -> Response {
    json_error(StatusCode::NOT_FOUND, message)
}

/// Helper for internal server errors
pub fn internal_error(message: &str) -> Response {
    json_error(StatusCode::INTERNAL_SERVER_ERROR, message)
}

/// Helper for task join errors
pub fn task_join_error(e: impl std::fmt::Display) -> Response {
    internal_error(&format!("Task join error: {}", e))
}

/// Helper for bad request errors
pub fn bad_request(message: &str) -> Response {
    json_error(StatusCode::BAD_REQUEST, message)
}

/// Check if an engine error is a lookup miss
pub fn is_not_found_error(e: &anyhow::Error) -> bool {
    let msg = e.to_string();
    msg.contains("not found") || msg.contains("no main entry") || msg.contains("Dangling redirect")
}

/// Map an engine error to 404 or 500
pub fn engine_error(e: &anyhow::Error) -> Response {
    if is_not_found_error(e) {
        not_found(&e.to_string())
    } else {
        internal_error(&format!("{:#}", e))
    }
}
