use crate::domain::speech::language::LanguageCode;
use serde::{Deserialize, Serialize};

/// Versions of the generation parameters that shape output. Both are part of
/// the digest input: a prompt-template or voice-chain change must never be
/// served from a cache entry rendered under the old parameters.
#[derive(Debug, Clone, Copy)]
pub struct FingerprintVersions {
    pub prompt_template: u32,
    pub voice_chains: u32,
}

/// Deterministic digest identifying a logical generation request.
///
/// Two requests with the same normalized topic, language, duration and
/// parameter versions always map to the same fingerprint, so coinciding
/// requests share cache entries and in-flight work.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn compute(
        topic: &str,
        language: LanguageCode,
        duration_minutes: u8,
        versions: FingerprintVersions,
    ) -> Self {
        let input = format!(
            "{}\n{}\n{}\nprompt-v{}\nvoices-v{}",
            normalize_topic(topic),
            language.as_str(),
            duration_minutes,
            versions.prompt_template,
            versions.voice_chains,
        );
        Fingerprint(format!("{:x}", md5::compute(input.as_bytes())))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Trim, lowercase and collapse internal whitespace so cosmetic differences
/// in how a topic is typed do not defeat the cache.
fn normalize_topic(topic: &str) -> String {
    topic
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}
