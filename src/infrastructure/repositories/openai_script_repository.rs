use super::script_repository::ScriptRepository;
use crate::domain::script::error::GenerationError;
use crate::domain::script::prompt::SnippetPrompt;
use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::{
        ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;
use std::sync::Arc;

/// OpenAI chat-completion implementation of the script repository
pub struct OpenAiScriptRepository {
    client: Arc<Client<OpenAIConfig>>,
    model: String,
    temperature: f32,
}

impl OpenAiScriptRepository {
    pub fn new(client: Arc<Client<OpenAIConfig>>, model: String, temperature: f32) -> Self {
        Self {
            client,
            model,
            temperature,
        }
    }
}

#[async_trait]
impl ScriptRepository for OpenAiScriptRepository {
    fn provider_id(&self) -> &str {
        "openai"
    }

    async fn generate(
        &self,
        prompt: &SnippetPrompt,
        max_tokens: u32,
    ) -> Result<String, GenerationError> {
        let start_time = std::time::Instant::now();

        tracing::info!(
            model = %self.model,
            max_tokens = max_tokens,
            prompt_length = prompt.user.len(),
            "Calling OpenAI chat completion"
        );

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .temperature(self.temperature)
            .max_tokens(max_tokens)
            .messages([
                ChatCompletionRequestSystemMessageArgs::default()
                    .content(prompt.system.clone())
                    .build()
                    .map_err(|e| GenerationError::MalformedResponse(e.to_string()))?
                    .into(),
                ChatCompletionRequestUserMessageArgs::default()
                    .content(prompt.user.clone())
                    .build()
                    .map_err(|e| GenerationError::MalformedResponse(e.to_string()))?
                    .into(),
            ])
            .build()
            .map_err(|e| GenerationError::MalformedResponse(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| {
                tracing::error!(
                    error = %e,
                    model = %self.model,
                    "OpenAI chat completion failed"
                );
                classify_openai_error(e)
            })?;

        let content = response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .unwrap_or_default();
        if content.trim().is_empty() {
            return Err(GenerationError::MalformedResponse(
                "completion contained no content".to_string(),
            ));
        }

        tracing::info!(
            model = %self.model,
            latency_ms = start_time.elapsed().as_millis() as u64,
            content_length = content.len(),
            "Chat completion received"
        );
        Ok(content)
    }
}

/// Map OpenAI SDK errors to the classified generation failures. Only the
/// stable `message`/`type` strings are inspected.
fn classify_openai_error(err: OpenAIError) -> GenerationError {
    match err {
        OpenAIError::ApiError(api) => {
            let kind = api.r#type.clone().unwrap_or_default();
            let message = api.message.clone();
            if kind.contains("rate_limit")
                || kind.contains("insufficient_quota")
                || message.contains("Rate limit")
            {
                GenerationError::ProviderRateLimited(message)
            } else if kind.contains("content_policy") || kind.contains("content_filter") {
                GenerationError::ContentPolicyRejected(message)
            } else if kind.contains("invalid_request") {
                GenerationError::MalformedResponse(message)
            } else {
                GenerationError::ProviderUnavailable(message)
            }
        }
        OpenAIError::Reqwest(e) => GenerationError::ProviderUnavailable(e.to_string()),
        OpenAIError::JSONDeserialize(e) => GenerationError::MalformedResponse(e.to_string()),
        other => GenerationError::ProviderUnavailable(other.to_string()),
    }
}
