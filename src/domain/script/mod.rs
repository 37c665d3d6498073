pub mod error;
pub mod prompt;
pub mod service;

pub use error::GenerationError;
pub use prompt::{SnippetPrompt, PROMPT_TEMPLATE_VERSION};
pub use service::ScriptService;
