use crate::domain::shared::retry::Retryable;

/// Classified failure of a text-generation attempt.
/// Only the transient kinds are retried; the rest are terminal for the item.
#[derive(Debug, Clone, thiserror::Error)]
pub enum GenerationError {
    #[error("provider unavailable: {0}")]
    ProviderUnavailable(String),

    #[error("provider rate limited: {0}")]
    ProviderRateLimited(String),

    #[error("content policy rejected the topic: {0}")]
    ContentPolicyRejected(String),

    #[error("malformed provider response: {0}")]
    MalformedResponse(String),
}

impl Retryable for GenerationError {
    fn is_retryable(&self) -> bool {
        matches!(
            self,
            GenerationError::ProviderUnavailable(_) | GenerationError::ProviderRateLimited(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_transient_kinds_are_retryable() {
        assert!(GenerationError::ProviderUnavailable("503".to_string()).is_retryable());
        assert!(GenerationError::ProviderRateLimited("429".to_string()).is_retryable());
        assert!(!GenerationError::ContentPolicyRejected("flagged".to_string()).is_retryable());
        assert!(!GenerationError::MalformedResponse("empty".to_string()).is_retryable());
    }
}
