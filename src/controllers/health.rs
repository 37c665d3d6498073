use crate::infrastructure::cache::ArtifactStore;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use std::sync::Arc;

pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

pub async fn health_ready(State(store): State<Arc<ArtifactStore>>) -> impl IntoResponse {
    match tokio::fs::metadata(store.root()).await {
        Ok(meta) if meta.is_dir() => (
            StatusCode::OK,
            Json(json!({
                "status": "ready",
                "cache": "accessible",
            })),
        ),
        _ => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "status": "not_ready",
                "cache": "inaccessible",
            })),
        ),
    }
}
