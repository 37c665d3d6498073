use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    domain::pipeline::{PipelineItem, PipelineService},
    error::{AppError, AppResult},
};

pub struct ItemController {
    pipeline_service: Arc<PipelineService>,
}

impl ItemController {
    pub fn new(pipeline_service: Arc<PipelineService>) -> Self {
        Self { pipeline_service }
    }

    /// GET /api/items/:itemId - Live status of one pipeline item
    pub async fn get_status(
        State(controller): State<Arc<ItemController>>,
        Path(item_id): Path<Uuid>,
    ) -> AppResult<Json<PipelineItem>> {
        controller
            .pipeline_service
            .get_item(item_id)
            .await
            .map(Json)
            .ok_or_else(|| AppError::NotFound("pipeline item".to_string()))
    }

    /// POST /api/items/:itemId/retry - Resubmit a terminal item as a new one.
    /// The new item reuses the same fingerprint, so a warm cache is honored.
    pub async fn retry(
        State(controller): State<Arc<ItemController>>,
        Path(item_id): Path<Uuid>,
    ) -> AppResult<(StatusCode, Json<PipelineItem>)> {
        let item = controller
            .pipeline_service
            .retry(item_id)
            .await
            .map_err(AppError::from)?;
        Ok((StatusCode::ACCEPTED, Json(item)))
    }

    /// POST /api/items/:itemId/cancel - Abandon a running item
    pub async fn cancel(
        State(controller): State<Arc<ItemController>>,
        Path(item_id): Path<Uuid>,
    ) -> AppResult<StatusCode> {
        controller
            .pipeline_service
            .cancel(item_id)
            .await
            .map_err(AppError::from)?;
        Ok(StatusCode::ACCEPTED)
    }

    /// GET /api/items/:itemId/audio - Serve the rendered MP3 for a completed
    /// item, with synthesis metadata in response headers
    pub async fn download_audio(
        State(controller): State<Arc<ItemController>>,
        Path(item_id): Path<Uuid>,
    ) -> AppResult<(StatusCode, HeaderMap, Body)> {
        let (artifact, audio_data) = controller
            .pipeline_service
            .audio_for_item(item_id)
            .await
            .map_err(AppError::from)?;

        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, "audio/mpeg".parse().unwrap());
        headers.insert(
            "X-Duration-Seconds",
            (artifact.duration_seconds as u64).to_string().parse().unwrap(),
        );
        headers.insert(
            "X-Provider-Used",
            artifact.provider_used.parse().map_err(|_| {
                AppError::Internal("provider name is not a valid header value".to_string())
            })?,
        );

        Ok((StatusCode::OK, headers, Body::from(audio_data)))
    }
}
