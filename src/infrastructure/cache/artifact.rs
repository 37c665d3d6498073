use super::fingerprint::Fingerprint;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Generated script for one fingerprint. Immutable once written: a
/// regeneration happens under a new fingerprint, never in place.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScriptArtifact {
    pub fingerprint: Fingerprint,
    pub title: String,
    pub text: String,
    pub word_count: usize,
    pub provider_used: String,
    pub generated_at: DateTime<Utc>,
}

impl ScriptArtifact {
    /// The text handed to speech synthesis: the title spoken first, then the
    /// body, with a pause between them.
    pub fn speech_text(&self) -> String {
        format!("{}. {}", self.title, self.text)
    }
}

/// Rendered audio for one fingerprint. The payload lives on disk at `path`;
/// this struct is the JSON sidecar metadata. Never exists without the
/// ScriptArtifact for the same fingerprint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioArtifact {
    pub fingerprint: Fingerprint,
    pub path: PathBuf,
    pub size_bytes: u64,
    pub duration_seconds: f32,
    pub encoding: String,
    pub provider_used: String,
    pub generated_at: DateTime<Utc>,
}
