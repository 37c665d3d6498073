use crate::domain::speech::LanguageCode;
use crate::infrastructure::cache::{AudioArtifact, Fingerprint, ScriptArtifact};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One topic to turn into audio. Immutable once submitted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub topic: String,
    pub language: LanguageCode,
    pub duration_minutes: u8,
}

impl GenerationRequest {
    pub const MIN_DURATION_MINUTES: u8 = 3;
    pub const MAX_DURATION_MINUTES: u8 = 10;
}

/// Lifecycle state of a pipeline item. Transitions are driven solely by the
/// orchestrator; Completed and Failed are terminal and an item is never
/// resurrected — a retry creates a new item for the same fingerprint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    Pending,
    Fingerprinted,
    CacheHit,
    Generating,
    Synthesizing,
    Completed,
    Failed,
}

impl ItemStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ItemStatus::Completed | ItemStatus::Failed)
    }

    /// The allowed transition table. Any non-terminal state may force-fail
    /// (deadline or cancellation can fire at any stage).
    pub fn can_transition_to(&self, next: ItemStatus) -> bool {
        use ItemStatus::*;
        matches!(
            (self, next),
            (Pending, Fingerprinted)
                | (Fingerprinted, CacheHit)
                | (Fingerprinted, Generating)
                | (CacheHit, Completed)
                | (Generating, Synthesizing)
                | (Synthesizing, Completed)
        ) || (!self.is_terminal() && next == Failed)
    }
}

/// Summary of the cached script attached to a completed or synthesizing item
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScriptRef {
    pub title: String,
    pub word_count: usize,
    pub provider_used: String,
}

impl From<&ScriptArtifact> for ScriptRef {
    fn from(artifact: &ScriptArtifact) -> Self {
        Self {
            title: artifact.title.clone(),
            word_count: artifact.word_count,
            provider_used: artifact.provider_used.clone(),
        }
    }
}

/// Summary of the rendered audio attached to a completed item
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioRef {
    pub duration_seconds: f32,
    pub encoding: String,
    pub provider_used: String,
    pub size_bytes: u64,
}

impl From<&AudioArtifact> for AudioRef {
    fn from(artifact: &AudioArtifact) -> Self {
        Self {
            duration_seconds: artifact.duration_seconds,
            encoding: artifact.encoding.clone(),
            provider_used: artifact.provider_used.clone(),
            size_bytes: artifact.size_bytes,
        }
    }
}

/// One topic's end-to-end generation unit and its state-machine status
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineItem {
    pub id: Uuid,
    pub request: GenerationRequest,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<Fingerprint>,
    pub status: ItemStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_detail: Option<String>,
    pub cache_hit: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub script: Option<ScriptRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio: Option<AudioRef>,
    pub submitted_at: DateTime<Utc>,
}

impl PipelineItem {
    pub fn new(request: GenerationRequest) -> Self {
        Self {
            id: Uuid::new_v4(),
            request,
            fingerprint: None,
            status: ItemStatus::Pending,
            error_detail: None,
            cache_hit: false,
            script: None,
            audio: None,
            submitted_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path_transitions_are_allowed() {
        use ItemStatus::*;
        assert!(Pending.can_transition_to(Fingerprinted));
        assert!(Fingerprinted.can_transition_to(Generating));
        assert!(Generating.can_transition_to(Synthesizing));
        assert!(Synthesizing.can_transition_to(Completed));
    }

    #[test]
    fn test_cache_hit_path_transitions_are_allowed() {
        use ItemStatus::*;
        assert!(Fingerprinted.can_transition_to(CacheHit));
        assert!(CacheHit.can_transition_to(Completed));
    }

    #[test]
    fn test_any_active_state_may_fail() {
        use ItemStatus::*;
        for state in [Pending, Fingerprinted, CacheHit, Generating, Synthesizing] {
            assert!(state.can_transition_to(Failed), "{state:?} must be able to fail");
        }
    }

    #[test]
    fn test_terminal_states_never_transition() {
        use ItemStatus::*;
        for next in [Pending, Fingerprinted, CacheHit, Generating, Synthesizing, Completed, Failed] {
            assert!(!Completed.can_transition_to(next));
            assert!(!Failed.can_transition_to(next));
        }
    }

    #[test]
    fn test_stage_skipping_is_rejected() {
        use ItemStatus::*;
        assert!(!Pending.can_transition_to(Generating));
        assert!(!Fingerprinted.can_transition_to(Completed));
        assert!(!Generating.can_transition_to(Completed));
    }

    #[test]
    fn test_new_item_starts_pending() {
        let item = PipelineItem::new(GenerationRequest {
            topic: "Photosynthesis".to_string(),
            language: LanguageCode::English,
            duration_minutes: 5,
        });
        assert_eq!(item.status, ItemStatus::Pending);
        assert!(item.fingerprint.is_none());
        assert!(!item.cache_hit);
    }
}
