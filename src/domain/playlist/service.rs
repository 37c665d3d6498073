use super::error::PlaylistServiceError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use uuid::Uuid;

/// One slot of the playlist. Append-only: removal tombstones the entry so
/// positions of later entries stay stable for concurrent readers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaylistEntry {
    pub id: Uuid,
    pub item_id: Uuid,
    pub position: u32,
    pub added_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub removed_at: Option<DateTime<Utc>>,
}

impl PlaylistEntry {
    pub fn is_removed(&self) -> bool {
        self.removed_at.is_some()
    }
}

/// Ordered collection of pipeline items, in submission order.
pub struct PlaylistService {
    entries: RwLock<Vec<PlaylistEntry>>,
}

impl Default for PlaylistService {
    fn default() -> Self {
        Self::new()
    }
}

impl PlaylistService {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
        }
    }

    /// Append an item at the next position. Positions are assigned at
    /// submission time and never reused, tombstoned or not.
    pub async fn append(&self, item_id: Uuid) -> PlaylistEntry {
        let mut entries = self.entries.write().await;
        let entry = PlaylistEntry {
            id: Uuid::new_v4(),
            item_id,
            position: entries.len() as u32,
            added_at: Utc::now(),
            removed_at: None,
        };
        entries.push(entry.clone());
        entry
    }

    /// All entries in position order, tombstones included. Callers decide how
    /// to render removed slots.
    pub async fn list(&self) -> Vec<PlaylistEntry> {
        self.entries.read().await.clone()
    }

    /// Tombstone an entry. Idempotent removal is a conflict, not a no-op, so
    /// callers notice double deletes.
    pub async fn remove(&self, entry_id: Uuid) -> Result<(), PlaylistServiceError> {
        let mut entries = self.entries.write().await;
        let entry = entries
            .iter_mut()
            .find(|entry| entry.id == entry_id)
            .ok_or(PlaylistServiceError::NotFound)?;
        if entry.is_removed() {
            return Err(PlaylistServiceError::AlreadyRemoved);
        }
        entry.removed_at = Some(Utc::now());
        Ok(())
    }
}
