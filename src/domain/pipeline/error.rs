use crate::domain::script::GenerationError;
use crate::domain::speech::SynthesisError;
use crate::error::AppError;
use crate::infrastructure::cache::CacheError;
use std::time::Duration;

/// Why a pipeline item failed. Becomes the item's `error_detail`; never
/// surfaced to callers as a raw transport error.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    Generation(#[from] GenerationError),

    #[error(transparent)]
    Synthesis(#[from] SynthesisError),

    #[error("cache error: {0}")]
    Cache(#[from] CacheError),

    #[error("deadline exceeded after {0:?}")]
    DeadlineExceeded(Duration),

    #[error("cancelled by caller")]
    Cancelled,
}

/// Errors of the caller-facing orchestrator API
#[derive(Debug, thiserror::Error)]
pub enum PipelineServiceError {
    #[error("invalid input: {0}")]
    Invalid(String),

    #[error("item not found")]
    NotFound,

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("dependency error: {0}")]
    Dependency(String),
}

impl From<PipelineServiceError> for AppError {
    fn from(err: PipelineServiceError) -> Self {
        match err {
            PipelineServiceError::Invalid(msg) => AppError::BadRequest(msg),
            PipelineServiceError::NotFound => AppError::NotFound("pipeline item".to_string()),
            PipelineServiceError::Conflict(msg) => AppError::Conflict(msg),
            PipelineServiceError::Dependency(msg) => AppError::ExternalService(msg),
        }
    }
}
