use serde::{Deserialize, Serialize};

/// ISO 639-1 language codes supported by the generation pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LanguageCode {
    #[serde(rename = "en")]
    English,
    #[serde(rename = "fr")]
    French,
    #[serde(rename = "es")]
    Spanish,
    #[serde(rename = "de")]
    German,
    #[serde(rename = "it")]
    Italian,
    #[serde(rename = "ja")]
    Japanese,
    #[serde(rename = "zh")]
    Chinese,
    #[serde(rename = "ar")]
    Arabic,
}

impl LanguageCode {
    /// Get the ISO 639-1 code as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            LanguageCode::English => "en",
            LanguageCode::French => "fr",
            LanguageCode::Spanish => "es",
            LanguageCode::German => "de",
            LanguageCode::Italian => "it",
            LanguageCode::Japanese => "ja",
            LanguageCode::Chinese => "zh",
            LanguageCode::Arabic => "ar",
        }
    }

    /// Parse an ISO 639-1 code; unknown codes are rejected so audio is never
    /// generated in the wrong voice.
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "en" => Some(LanguageCode::English),
            "fr" => Some(LanguageCode::French),
            "es" => Some(LanguageCode::Spanish),
            "de" => Some(LanguageCode::German),
            "it" => Some(LanguageCode::Italian),
            "ja" => Some(LanguageCode::Japanese),
            "zh" => Some(LanguageCode::Chinese),
            "ar" => Some(LanguageCode::Arabic),
            _ => None,
        }
    }

    /// English name of the language, used in generation prompts
    pub fn english_name(&self) -> &'static str {
        match self {
            LanguageCode::English => "English",
            LanguageCode::French => "French",
            LanguageCode::Spanish => "Spanish",
            LanguageCode::German => "German",
            LanguageCode::Italian => "Italian",
            LanguageCode::Japanese => "Japanese",
            LanguageCode::Chinese => "Mandarin Chinese",
            LanguageCode::Arabic => "Arabic",
        }
    }

    /// Average spoken words per minute, used to derive word targets from a
    /// requested audio duration
    pub fn words_per_minute(&self) -> usize {
        match self {
            LanguageCode::English => 150,
            LanguageCode::French => 160,
            LanguageCode::Spanish => 160,
            LanguageCode::German => 135,
            LanguageCode::Italian => 155,
            LanguageCode::Japanese => 115,
            LanguageCode::Chinese => 120,
            LanguageCode::Arabic => 130,
        }
    }

    /// Whether the language is written right-to-left
    pub fn is_rtl(&self) -> bool {
        matches!(self, LanguageCode::Arabic)
    }

    /// All supported languages, in registry declaration order
    pub fn all() -> &'static [LanguageCode] {
        &[
            LanguageCode::English,
            LanguageCode::French,
            LanguageCode::Spanish,
            LanguageCode::German,
            LanguageCode::Italian,
            LanguageCode::Japanese,
            LanguageCode::Chinese,
            LanguageCode::Arabic,
        ]
    }
}

impl std::fmt::Display for LanguageCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_code_roundtrip() {
        for language in LanguageCode::all() {
            assert_eq!(LanguageCode::from_code(language.as_str()), Some(*language));
        }
    }

    #[test]
    fn test_from_code_rejects_unknown() {
        assert_eq!(LanguageCode::from_code("xx"), None);
        assert_eq!(LanguageCode::from_code(""), None);
        assert_eq!(LanguageCode::from_code("EN"), None);
    }

    #[test]
    fn test_arabic_is_rtl() {
        assert!(LanguageCode::Arabic.is_rtl());
        assert!(!LanguageCode::English.is_rtl());
        assert!(!LanguageCode::Japanese.is_rtl());
    }

    #[test]
    fn test_words_per_minute_is_positive() {
        for language in LanguageCode::all() {
            assert!(language.words_per_minute() >= 100);
        }
    }
}
