pub mod chunking;
pub mod error;
pub mod language;
pub mod registry;
pub mod service;
pub mod text;

pub use error::{ProviderFailure, SpeechProviderError, SynthesisError};
pub use language::LanguageCode;
pub use registry::{ProviderId, VoiceChain, VoiceRegistry, VoiceSpec, VOICE_CHAIN_VERSION};
pub use service::{SynthesisService, SynthesizedAudio};
