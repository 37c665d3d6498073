use crate::domain::speech::error::SpeechProviderError;
use crate::domain::speech::registry::ProviderId;
use async_trait::async_trait;

/// Repository for speech synthesis operations.
/// Abstracts one underlying TTS provider (AWS Polly, OpenAI, ...).
///
/// Implementations are responsible for:
/// - Provider-specific request shape and voice identifiers
/// - Requesting MP3 output so callers never branch on encoding
/// - Mapping provider errors to the shared failure kinds
///
/// Splitting long scripts and merging chunk audio happens above this trait,
/// so every provider sees one chunk per call.
#[async_trait]
pub trait SpeechRepository: Send + Sync {
    /// Which provider this repository wraps
    fn provider(&self) -> ProviderId;

    /// The provider's per-request character limit; scripts are chunked to it
    fn max_chunk_len(&self) -> usize;

    /// Synthesize a single chunk with the given voice
    ///
    /// Returns MP3 audio bytes for the chunk
    async fn synthesize_chunk(
        &self,
        text: &str,
        voice_id: &str,
    ) -> Result<Vec<u8>, SpeechProviderError>;
}
