use super::chunking::split_into_chunks;
use super::error::{ProviderFailure, SpeechProviderError, SynthesisError};
use super::language::LanguageCode;
use super::registry::{ProviderId, VoiceRegistry, VoiceSpec};
use super::text::clean_for_speech;
use crate::domain::shared::RetryPolicy;
use crate::infrastructure::repositories::SpeechRepository;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// Assumed MP3 bitrate for duration estimates. Both providers return MP3 at
/// this rate unless asked otherwise.
const MP3_BITS_PER_SECOND: f32 = 128_000.0;

/// Result of a successful synthesis: merged MP3 bytes plus which chain entry
/// ultimately served the request.
#[derive(Debug, Clone)]
pub struct SynthesizedAudio {
    pub audio_data: Vec<u8>,
    pub provider: ProviderId,
    pub voice_id: String,
    pub duration_seconds: f32,
}

pub struct SynthesisService {
    registry: Arc<VoiceRegistry>,
    providers: HashMap<ProviderId, Arc<dyn SpeechRepository>>,
    attempt_timeout: Duration,
    retry: RetryPolicy,
}

impl SynthesisService {
    pub fn new(
        registry: Arc<VoiceRegistry>,
        providers: Vec<Arc<dyn SpeechRepository>>,
        attempt_timeout: Duration,
        retry: RetryPolicy,
    ) -> Self {
        let providers = providers
            .into_iter()
            .map(|repo| (repo.provider(), repo))
            .collect();
        Self {
            registry,
            providers,
            attempt_timeout,
            retry,
        }
    }

    /// Synthesize script text into a single MP3, attempting the language's
    /// voice chain in order. The whole script falls back to the next chain
    /// entry on failure; chunk retries never switch voice mid-artifact.
    pub async fn synthesize(
        &self,
        text: &str,
        language: LanguageCode,
    ) -> Result<SynthesizedAudio, SynthesisError> {
        let cleaned = clean_for_speech(text, language);
        if cleaned.is_empty() {
            return Err(SynthesisError::EmptyScript);
        }

        let chain = self.registry.resolve_chain(language)?;
        let mut failures: Vec<ProviderFailure> = Vec::new();

        for spec in &chain.entries {
            let Some(repo) = self.providers.get(&spec.provider) else {
                tracing::warn!(
                    provider = %spec.provider,
                    voice = %spec.voice_id,
                    "Chain entry skipped: provider not configured"
                );
                failures.push(ProviderFailure {
                    provider: spec.provider,
                    voice_id: spec.voice_id.clone(),
                    reason: "provider not configured".to_string(),
                });
                continue;
            };

            match self.attempt_chain_entry(repo.as_ref(), spec, &cleaned).await {
                Ok(audio_data) => {
                    let duration_seconds = estimate_duration_seconds(audio_data.len());
                    tracing::info!(
                        provider = %spec.provider,
                        voice = %spec.voice_id,
                        language = %language,
                        fallback_position = failures.len(),
                        audio_size_bytes = audio_data.len(),
                        duration_seconds = duration_seconds,
                        "Speech synthesis completed"
                    );
                    return Ok(SynthesizedAudio {
                        audio_data,
                        provider: spec.provider,
                        voice_id: spec.voice_id.clone(),
                        duration_seconds,
                    });
                }
                Err(err) => {
                    tracing::warn!(
                        provider = %spec.provider,
                        voice = %spec.voice_id,
                        error = %err,
                        "Chain entry failed, advancing to next voice"
                    );
                    failures.push(ProviderFailure {
                        provider: spec.provider,
                        voice_id: spec.voice_id.clone(),
                        reason: err.to_string(),
                    });
                }
            }
        }

        Err(SynthesisError::AllProvidersExhausted(failures))
    }

    /// Synthesize the full script with one chain entry: chunk to the
    /// provider's limit, synthesize chunks in order with retries, merge.
    async fn attempt_chain_entry(
        &self,
        repo: &dyn SpeechRepository,
        spec: &VoiceSpec,
        text: &str,
    ) -> Result<Vec<u8>, SpeechProviderError> {
        let chunks = split_into_chunks(text, repo.max_chunk_len());
        tracing::info!(
            provider = %spec.provider,
            voice = %spec.voice_id,
            chunk_count = chunks.len(),
            text_length = text.len(),
            "Text split into chunks"
        );

        let mut merged_audio = Vec::new();
        for (index, chunk) in chunks.iter().enumerate() {
            let audio_data = self
                .retry
                .run(|_attempt| self.timed_chunk_call(repo, chunk, &spec.voice_id))
                .await?;
            merged_audio.extend(audio_data);

            tracing::debug!(
                chunk_index = index,
                total_audio_size = merged_audio.len(),
                "Chunk synthesized and merged"
            );
        }

        Ok(merged_audio)
    }

    async fn timed_chunk_call(
        &self,
        repo: &dyn SpeechRepository,
        chunk: &str,
        voice_id: &str,
    ) -> Result<Vec<u8>, SpeechProviderError> {
        match tokio::time::timeout(self.attempt_timeout, repo.synthesize_chunk(chunk, voice_id))
            .await
        {
            Ok(result) => result,
            Err(_) => Err(SpeechProviderError::Timeout(self.attempt_timeout)),
        }
    }
}

fn estimate_duration_seconds(size_bytes: usize) -> f32 {
    (size_bytes as f32 * 8.0) / MP3_BITS_PER_SECOND
}
