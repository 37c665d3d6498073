use super::speech_repository::SpeechRepository;
use crate::domain::speech::error::SpeechProviderError;
use crate::domain::speech::registry::ProviderId;
use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::{CreateSpeechRequest, SpeechModel, SpeechResponseFormat, Voice},
    Client,
};
use async_trait::async_trait;
use std::sync::Arc;

/// OpenAI has a limit of 4096 characters per request
const MAX_CHUNK_LEN: usize = 4096;

/// OpenAI TTS implementation of the speech repository
pub struct OpenAiSpeechRepository {
    client: Arc<Client<OpenAIConfig>>,
    model: String,
}

impl OpenAiSpeechRepository {
    pub fn new(client: Arc<Client<OpenAIConfig>>, model: String) -> Self {
        Self { client, model }
    }

    fn parse_voice(voice_id: &str) -> Result<Voice, SpeechProviderError> {
        match voice_id.to_lowercase().as_str() {
            "alloy" => Ok(Voice::Alloy),
            "echo" => Ok(Voice::Echo),
            "fable" => Ok(Voice::Fable),
            "onyx" => Ok(Voice::Onyx),
            "nova" => Ok(Voice::Nova),
            "shimmer" => Ok(Voice::Shimmer),
            other => Err(SpeechProviderError::InvalidVoice(other.to_string())),
        }
    }
}

#[async_trait]
impl SpeechRepository for OpenAiSpeechRepository {
    fn provider(&self) -> ProviderId {
        ProviderId::OpenAi
    }

    fn max_chunk_len(&self) -> usize {
        MAX_CHUNK_LEN
    }

    async fn synthesize_chunk(
        &self,
        text: &str,
        voice_id: &str,
    ) -> Result<Vec<u8>, SpeechProviderError> {
        tracing::info!(
            model = %self.model,
            voice = voice_id,
            text_length = text.len(),
            text_preview = &text[..text.len().min(200)],
            "Calling OpenAI TTS API"
        );

        // Parse model string to SpeechModel enum
        let model = match self.model.as_str() {
            "tts-1" => SpeechModel::Tts1,
            "tts-1-hd" => SpeechModel::Tts1Hd,
            other => SpeechModel::Other(other.to_string()),
        };

        let request = CreateSpeechRequest {
            model,
            input: text.to_string(),
            voice: Self::parse_voice(voice_id)?,
            response_format: Some(SpeechResponseFormat::Mp3),
            speed: None, // Defaults to 1.0
        };

        let response = self.client.audio().speech(request).await.map_err(|e| {
            tracing::error!(
                error = %e,
                model = %self.model,
                voice = voice_id,
                text_length = text.len(),
                "OpenAI TTS API call failed"
            );
            classify_openai_error(e)
        })?;

        let audio_bytes = response.bytes.to_vec();
        tracing::debug!(
            audio_size = audio_bytes.len(),
            "OpenAI TTS audio received successfully"
        );

        Ok(audio_bytes)
    }
}

fn classify_openai_error(err: OpenAIError) -> SpeechProviderError {
    match err {
        OpenAIError::ApiError(api) => {
            let kind = api.r#type.clone().unwrap_or_default();
            if kind.contains("rate_limit") || kind.contains("insufficient_quota") {
                SpeechProviderError::QuotaExceeded(api.message)
            } else {
                SpeechProviderError::Transport(api.message)
            }
        }
        other => SpeechProviderError::Transport(other.to_string()),
    }
}
