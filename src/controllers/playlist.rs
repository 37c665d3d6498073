use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    domain::{
        pipeline::{ItemStatus, PipelineItem, PipelineService},
        playlist::PlaylistService,
        speech::LanguageCode,
    },
    error::{AppError, AppResult},
};

/// Request for POST /api/playlist
#[derive(Debug, Serialize, Deserialize)]
pub struct SubmitPlaylistRequest {
    pub topics: Vec<String>,
    pub language: String,
    pub duration_minutes: u8,
}

#[derive(Debug, Serialize)]
pub struct SubmitPlaylistResponse {
    pub items: Vec<PipelineItem>,
}

/// One playlist slot joined with its item's live status
#[derive(Debug, Serialize)]
pub struct PlaylistEntryResponse {
    pub entry_id: Uuid,
    pub position: u32,
    pub added_at: DateTime<Utc>,
    pub removed: bool,
    pub topic: String,
    pub status: ItemStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_detail: Option<String>,
    pub playable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PlaylistResponse {
    pub entries: Vec<PlaylistEntryResponse>,
}

pub struct PlaylistController {
    pipeline_service: Arc<PipelineService>,
    playlist_service: Arc<PlaylistService>,
}

impl PlaylistController {
    pub fn new(
        pipeline_service: Arc<PipelineService>,
        playlist_service: Arc<PlaylistService>,
    ) -> Self {
        Self {
            pipeline_service,
            playlist_service,
        }
    }

    /// POST /api/playlist - Submit a batch of topics for generation
    pub async fn submit(
        State(controller): State<Arc<PlaylistController>>,
        Json(request): Json<SubmitPlaylistRequest>,
    ) -> AppResult<(StatusCode, Json<SubmitPlaylistResponse>)> {
        let language = LanguageCode::from_code(&request.language)
            .ok_or_else(|| AppError::UnsupportedLanguage(request.language.clone()))?;

        let items = controller
            .pipeline_service
            .submit_playlist(request.topics, language, request.duration_minutes)
            .await
            .map_err(AppError::from)?;

        Ok((StatusCode::ACCEPTED, Json(SubmitPlaylistResponse { items })))
    }

    /// GET /api/playlist - Ordered entries joined with item status.
    /// Only Completed items are playable; others are listed with status but
    /// carry no audio reference.
    pub async fn get_playlist(
        State(controller): State<Arc<PlaylistController>>,
    ) -> AppResult<Json<PlaylistResponse>> {
        let mut entries = Vec::new();
        for entry in controller.playlist_service.list().await {
            let Some(item) = controller.pipeline_service.get_item(entry.item_id).await else {
                continue;
            };
            let playable = !entry.is_removed() && item.status == ItemStatus::Completed;
            entries.push(PlaylistEntryResponse {
                entry_id: entry.id,
                position: entry.position,
                added_at: entry.added_at,
                removed: entry.is_removed(),
                topic: item.request.topic.clone(),
                status: item.status,
                error_detail: item.error_detail.clone(),
                playable,
                audio_url: playable.then(|| format!("/api/items/{}/audio", item.id)),
            });
        }

        Ok(Json(PlaylistResponse { entries }))
    }

    /// DELETE /api/playlist/:entryId - Tombstone an entry
    pub async fn remove_entry(
        State(controller): State<Arc<PlaylistController>>,
        Path(entry_id): Path<Uuid>,
    ) -> AppResult<StatusCode> {
        controller
            .playlist_service
            .remove(entry_id)
            .await
            .map_err(AppError::from)?;
        Ok(StatusCode::NO_CONTENT)
    }
}
