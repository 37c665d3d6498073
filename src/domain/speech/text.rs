use super::language::LanguageCode;

/// Clean script text for speech synthesis: strip list markers and markdown
/// symbols, turn newlines into sentence pauses, collapse whitespace. Arabic
/// text is additionally filtered to the Arabic character ranges, since stray
/// Latin fragments make the Arabic voices stumble.
pub fn clean_for_speech(text: &str, language: LanguageCode) -> String {
    if text.trim().is_empty() {
        return String::new();
    }

    // Remove list bullets and numbering at line starts
    let bullet_pattern = regex::Regex::new(r"(?m)^\s*[-*]\s+").unwrap();
    let cleaned = bullet_pattern.replace_all(text, "");
    let numbering_pattern = regex::Regex::new(r"(?m)^\s*\d+\.\s+").unwrap();
    let cleaned = numbering_pattern.replace_all(&cleaned, "");

    // Strip markdown emphasis and heading markers
    let markdown_pattern = regex::Regex::new(r"[#*_]").unwrap();
    let cleaned = markdown_pattern.replace_all(&cleaned, "");

    // Newlines become natural pauses
    let newline_pattern = regex::Regex::new(r"\n+").unwrap();
    let cleaned = newline_pattern.replace_all(&cleaned, ". ");

    let cleaned = if language.is_rtl() {
        // Keep Arabic letters, Arabic-Indic digits, whitespace and basic punctuation
        let arabic_pattern =
            regex::Regex::new(r"[^\u{0600}-\u{06FF}\u{0660}-\u{0669}\s.,!?]").unwrap();
        arabic_pattern.replace_all(&cleaned, "").into_owned()
    } else {
        cleaned.into_owned()
    };

    // Collapse whitespace runs left behind by the removals
    let whitespace_pattern = regex::Regex::new(r"\s+").unwrap();
    whitespace_pattern.replace_all(&cleaned, " ").trim().to_string()
}
