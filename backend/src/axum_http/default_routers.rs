use axum::{Json, http::StatusCode, response::IntoResponse};
use serde_json::json;
use tracing::debug;

pub async fn not_found() -> impl IntoResponse {
    debug!("router: not_found handler invoked");
    (StatusCode::NOT_FOUND, Json(json!({ "message": "Not Found" })))
}

pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({ "status": "ok" })))
}
