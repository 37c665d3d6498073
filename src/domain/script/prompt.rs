use crate::domain::speech::LanguageCode;

/// Version of the prompt template below. Part of the cache fingerprint: a
/// wording change here must not be served from scripts generated under the
/// old template.
pub const PROMPT_TEMPLATE_VERSION: u32 = 1;

/// A fully built generation prompt: system role plus user instruction
#[derive(Debug, Clone)]
pub struct SnippetPrompt {
    pub system: String,
    pub user: String,
}

/// Build the learning-snippet prompt for a topic, target language and word
/// target. The word target is derived from the requested audio duration.
pub fn learning_prompt(topic: &str, language: LanguageCode, target_words: usize) -> SnippetPrompt {
    let system = format!(
        "You are an educational expert who creates clear, engaging and informative \
         explanations on a wide range of topics. Your task is to write spoken-audio \
         content that is both informative and enjoyable to listen to. Write entirely \
         in {}.",
        language.english_name()
    );

    let user = format!(
        "Create an engaging learning snippet on the topic: {topic}.\n\
         \n\
         Guidelines:\n\
         1. Start with a catchy title on its own line, prefixed with '# '\n\
         2. Write roughly {target_words} words of content\n\
         3. Use a conversational tone, as if talking to a curious friend\n\
         4. Structure the content with an introduction, key points and a conclusion\n\
         5. Include 2-3 surprising or little-known facts\n\
         6. Avoid heavy jargon, but do not oversimplify\n\
         7. End with a reflection or question that sparks curiosity\n\
         \n\
         The content must be informative, fascinating and easy to follow when \
         listened to as audio."
    );

    SnippetPrompt { system, user }
}

/// Corrective follow-up used when the first draft misses the word target by
/// more than the configured tolerance.
pub fn length_correction_prompt(previous_words: usize, target_words: usize) -> String {
    format!(
        "Your previous draft was about {previous_words} words. Rewrite the snippet to \
         approximately {target_words} words, keeping the same '# ' title format, tone \
         and structure."
    )
}
