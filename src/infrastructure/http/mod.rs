use axum::{
    extract::Request, http::HeaderValue, middleware, middleware::Next, response::Response,
    routing::get, Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use uuid::Uuid;

use crate::controllers::{health, ItemController, PlaylistController};
use crate::infrastructure::cache::ArtifactStore;
use crate::infrastructure::config::Config;

pub const X_REQUEST_ID: &str = "x-request-id";

/// Request ID wrapper type for extension
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

/// Middleware to generate and attach a request ID to each request
pub async fn request_id_middleware(mut request: Request, next: Next) -> Response {
    let request_id = Uuid::new_v4().to_string();
    request
        .extensions_mut()
        .insert(RequestId(request_id.clone()));

    let mut response = next.run(request).await;

    if let Ok(header_value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(X_REQUEST_ID, header_value);
    }

    response
}

/// Start the HTTP server with all routes configured
pub async fn start_http_server(
    config: Arc<Config>,
    store: Arc<ArtifactStore>,
    playlist_controller: Arc<PlaylistController>,
    item_controller: Arc<ItemController>,
) -> Result<(), Box<dyn std::error::Error>> {
    // Playlist routes
    let playlist_routes = Router::new()
        .route(
            "/api/playlist",
            get(PlaylistController::get_playlist).post(PlaylistController::submit),
        )
        .route(
            "/api/playlist/:entryId",
            axum::routing::delete(PlaylistController::remove_entry),
        )
        .with_state(playlist_controller);

    // Item routes
    let item_routes = Router::new()
        .route("/api/items/:itemId", get(ItemController::get_status))
        .route(
            "/api/items/:itemId/retry",
            axum::routing::post(ItemController::retry),
        )
        .route(
            "/api/items/:itemId/cancel",
            axum::routing::post(ItemController::cancel),
        )
        .route(
            "/api/items/:itemId/audio",
            get(ItemController::download_audio),
        )
        .with_state(item_controller);

    // Build application routes
    let app = Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::health_ready))
        .with_state(store)
        .merge(playlist_routes)
        .merge(item_routes)
        .layer(middleware::from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    // Start server
    let listener =
        tokio::net::TcpListener::bind(format!("{}:{}", config.host, config.port)).await?;

    tracing::info!("Server listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;

    Ok(())
}
