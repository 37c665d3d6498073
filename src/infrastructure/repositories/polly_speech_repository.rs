use super::speech_repository::SpeechRepository;
use crate::domain::speech::error::SpeechProviderError;
use crate::domain::speech::registry::ProviderId;
use async_trait::async_trait;
use aws_sdk_polly::{
    error::ProvideErrorMetadata,
    types::{Engine, OutputFormat, VoiceId},
    Client as PollyClient,
};
use std::sync::Arc;

/// AWS Polly has a limit of 3000 characters per request
const MAX_CHUNK_LEN: usize = 3000;

/// AWS Polly implementation of the speech repository
pub struct PollySpeechRepository {
    polly_client: Arc<PollyClient>,
}

impl PollySpeechRepository {
    pub fn new(polly_client: Arc<PollyClient>) -> Self {
        Self { polly_client }
    }
}

#[async_trait]
impl SpeechRepository for PollySpeechRepository {
    fn provider(&self) -> ProviderId {
        ProviderId::Polly
    }

    fn max_chunk_len(&self) -> usize {
        MAX_CHUNK_LEN
    }

    async fn synthesize_chunk(
        &self,
        text: &str,
        voice_id: &str,
    ) -> Result<Vec<u8>, SpeechProviderError> {
        let voice = VoiceId::from(voice_id);
        let engine = Engine::Neural;

        tracing::info!(
            voice = voice_id,
            engine = ?engine,
            output_format = "Mp3",
            text_length = text.len(),
            text_preview = &text[..text.len().min(200)],
            "Calling AWS Polly synthesize_speech"
        );

        let result = self
            .polly_client
            .synthesize_speech()
            .text(text)
            .voice_id(voice)
            .output_format(OutputFormat::Mp3)
            .engine(engine)
            .send()
            .await
            .map_err(|e| {
                let code = e.code().unwrap_or_default().to_string();
                let message = e.message().unwrap_or("synthesize_speech failed").to_string();
                tracing::error!(
                    error = ?e,
                    code = %code,
                    voice = voice_id,
                    text_length = text.len(),
                    "AWS Polly synthesize_speech failed"
                );
                if code == "ThrottlingException" || code == "TooManyRequestsException" {
                    SpeechProviderError::QuotaExceeded(format!("{code}: {message}"))
                } else {
                    SpeechProviderError::Transport(format!("{code}: {message}"))
                }
            })?;

        tracing::debug!("AWS Polly synthesize_speech successful, reading audio stream");

        let audio_stream = result.audio_stream.collect().await.map_err(|e| {
            tracing::error!(error = %e, "Failed to collect audio stream from Polly response");
            SpeechProviderError::Transport(format!("failed to read audio stream: {e}"))
        })?;

        let audio_bytes = audio_stream.into_bytes().to_vec();
        tracing::debug!(
            audio_size = audio_bytes.len(),
            "Audio stream collected successfully"
        );

        Ok(audio_bytes)
    }
}
