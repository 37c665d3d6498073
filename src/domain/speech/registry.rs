use super::language::LanguageCode;
use crate::domain::speech::error::SynthesisError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Version of the built-in voice-chain tables. Bumped whenever a chain is
/// added, reordered or re-voiced, so cached audio rendered under an older
/// chain is never served for a new one.
pub const VOICE_CHAIN_VERSION: u32 = 1;

/// Identifier of a speech-synthesis provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderId {
    Polly,
    OpenAi,
}

impl ProviderId {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::Polly => "polly",
            ProviderId::OpenAi => "openai",
        }
    }
}

impl std::fmt::Display for ProviderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One entry of a voice chain: which provider and voice to try for a language
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoiceSpec {
    pub provider: ProviderId,
    pub voice_id: String,
    pub language: LanguageCode,
    pub is_rtl: bool,
}

/// Ordered fallback chain of voices for one language, primary first
#[derive(Debug, Clone)]
pub struct VoiceChain {
    pub language: LanguageCode,
    pub entries: Vec<VoiceSpec>,
}

/// Per-language ordered voice configuration.
///
/// Chains are declarative data: adding a language or reordering its fallback
/// is a change to `with_default_chains`, not to the synthesis code. The
/// registry is built once at startup and read-only afterwards.
pub struct VoiceRegistry {
    chains: HashMap<LanguageCode, Vec<VoiceSpec>>,
}

impl VoiceRegistry {
    /// Build a registry from explicit chains. Empty chains are rejected so a
    /// resolvable language always has at least one voice to try.
    pub fn new(chains: HashMap<LanguageCode, Vec<VoiceSpec>>) -> Self {
        debug_assert!(chains.values().all(|c| !c.is_empty()));
        Self { chains }
    }

    /// The built-in chains: Polly neural voice first, OpenAI as fallback.
    pub fn with_default_chains() -> Self {
        let mut chains = HashMap::new();
        for language in LanguageCode::all() {
            let (polly_voice, openai_voice) = match language {
                LanguageCode::English => ("Joanna", "alloy"),
                LanguageCode::French => ("Lea", "nova"),
                LanguageCode::Spanish => ("Lupe", "echo"),
                LanguageCode::German => ("Vicki", "onyx"),
                LanguageCode::Italian => ("Bianca", "fable"),
                LanguageCode::Japanese => ("Takumi", "shimmer"),
                LanguageCode::Chinese => ("Zhiyu", "shimmer"),
                LanguageCode::Arabic => ("Hala", "alloy"),
            };
            chains.insert(
                *language,
                vec![
                    VoiceSpec {
                        provider: ProviderId::Polly,
                        voice_id: polly_voice.to_string(),
                        language: *language,
                        is_rtl: language.is_rtl(),
                    },
                    VoiceSpec {
                        provider: ProviderId::OpenAi,
                        voice_id: openai_voice.to_string(),
                        language: *language,
                        is_rtl: language.is_rtl(),
                    },
                ],
            );
        }
        Self::new(chains)
    }

    /// Resolve a language to its fallback chain. Fails fast for languages the
    /// registry does not know instead of defaulting to another voice.
    pub fn resolve_chain(&self, language: LanguageCode) -> Result<VoiceChain, SynthesisError> {
        self.chains
            .get(&language)
            .map(|entries| VoiceChain {
                language,
                entries: entries.clone(),
            })
            .ok_or_else(|| SynthesisError::UnsupportedLanguage(language.as_str().to_string()))
    }

    pub fn is_rtl(&self, language: LanguageCode) -> bool {
        language.is_rtl()
    }
}
