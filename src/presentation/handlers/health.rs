use axum::Json;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::Serialize;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

pub async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, Json(HealthResponse { status: "OK" }))
}
