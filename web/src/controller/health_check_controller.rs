use axum::http::StatusCode;
use axum::response::IntoResponse;

/// GET liveness probe; answers without touching the session or record store.
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "healthy")
}
