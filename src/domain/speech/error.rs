use super::registry::ProviderId;
use crate::domain::shared::retry::Retryable;
use std::time::Duration;

/// Failure of a single provider attempt
#[derive(Debug, Clone, thiserror::Error)]
pub enum SpeechProviderError {
    #[error("attempt timed out after {0:?}")]
    Timeout(Duration),
    #[error("quota exceeded: {0}")]
    QuotaExceeded(String),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("invalid voice {0}")]
    InvalidVoice(String),
}

impl Retryable for SpeechProviderError {
    fn is_retryable(&self) -> bool {
        // A timed-out attempt already consumed its full budget; retrying it
        // within the same chain entry starves the fallback voices.
        matches!(
            self,
            SpeechProviderError::QuotaExceeded(_) | SpeechProviderError::Transport(_)
        )
    }
}

/// Why one chain entry ultimately failed, recorded in chain order
#[derive(Debug, Clone)]
pub struct ProviderFailure {
    pub provider: ProviderId,
    pub voice_id: String,
    pub reason: String,
}

impl std::fmt::Display for ProviderFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}: {}", self.provider, self.voice_id, self.reason)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SynthesisError {
    #[error("unsupported language: {0}")]
    UnsupportedLanguage(String),

    #[error("all providers exhausted: [{}]", format_failures(.0))]
    AllProvidersExhausted(Vec<ProviderFailure>),

    #[error("nothing to synthesize: cleaned script is empty")]
    EmptyScript,
}

fn format_failures(failures: &[ProviderFailure]) -> String {
    failures
        .iter()
        .map(|failure| failure.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exhausted_error_lists_failures_in_chain_order() {
        let err = SynthesisError::AllProvidersExhausted(vec![
            ProviderFailure {
                provider: ProviderId::Polly,
                voice_id: "Hala".to_string(),
                reason: "attempt timed out after 30s".to_string(),
            },
            ProviderFailure {
                provider: ProviderId::OpenAi,
                voice_id: "alloy".to_string(),
                reason: "quota exceeded: 429".to_string(),
            },
        ]);
        let rendered = err.to_string();
        let polly_at = rendered.find("polly/Hala").unwrap();
        let openai_at = rendered.find("openai/alloy").unwrap();
        assert!(polly_at < openai_at);
    }

    #[test]
    fn test_timeout_is_not_retried_within_a_chain_entry() {
        assert!(!SpeechProviderError::Timeout(Duration::from_secs(30)).is_retryable());
        assert!(SpeechProviderError::Transport("reset".to_string()).is_retryable());
        assert!(SpeechProviderError::QuotaExceeded("429".to_string()).is_retryable());
    }
}
