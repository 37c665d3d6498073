pub mod error;
pub mod item;
pub mod service;

pub use error::{PipelineError, PipelineServiceError};
pub use item::{AudioRef, GenerationRequest, ItemStatus, PipelineItem, ScriptRef};
pub use service::{PipelineService, PipelineSettings};
