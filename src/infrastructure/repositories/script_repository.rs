use crate::domain::script::error::GenerationError;
use crate::domain::script::prompt::SnippetPrompt;
use async_trait::async_trait;

/// Repository for script generation.
/// Abstracts the underlying language-model provider.
///
/// Implementations are responsible for:
/// - Provider-specific request shape (messages, model id, sampling params)
/// - Mapping provider error codes to the classified failure kinds
#[async_trait]
pub trait ScriptRepository: Send + Sync {
    /// Provider identifier recorded on generated artifacts
    fn provider_id(&self) -> &str;

    /// Generate raw script text for the given prompt
    ///
    /// # Errors
    /// Returns a classified `GenerationError`; callers decide which kinds to
    /// retry.
    async fn generate(
        &self,
        prompt: &SnippetPrompt,
        max_tokens: u32,
    ) -> Result<String, GenerationError>;
}
