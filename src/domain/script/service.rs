use super::error::GenerationError;
use super::prompt::{learning_prompt, length_correction_prompt, SnippetPrompt};
use crate::domain::shared::RetryPolicy;
use crate::domain::speech::LanguageCode;
use crate::infrastructure::cache::{Fingerprint, ScriptArtifact};
use crate::infrastructure::repositories::ScriptRepository;
use chrono::Utc;
use std::sync::Arc;

pub struct ScriptService {
    repo: Arc<dyn ScriptRepository>,
    retry: RetryPolicy,
    length_tolerance: f32,
    max_tokens: u32,
}

impl ScriptService {
    pub fn new(
        repo: Arc<dyn ScriptRepository>,
        retry: RetryPolicy,
        length_tolerance: f32,
        max_tokens: u32,
    ) -> Self {
        Self {
            repo,
            retry,
            length_tolerance,
            max_tokens,
        }
    }

    /// Generate a script for one topic, enforcing the word target derived
    /// from the requested duration. A draft outside the tolerance triggers a
    /// single corrective re-prompt; a still-overlong script is truncated at a
    /// sentence boundary, a still-short one accepted with a warning.
    pub async fn generate(
        &self,
        fingerprint: &Fingerprint,
        topic: &str,
        language: LanguageCode,
        target_minutes: u8,
    ) -> Result<ScriptArtifact, GenerationError> {
        let target_words = target_minutes as usize * language.words_per_minute();
        let prompt = learning_prompt(topic, language, target_words);

        tracing::info!(
            topic = topic,
            language = %language,
            target_minutes = target_minutes,
            target_words = target_words,
            "Generating learning script"
        );

        let content = self.call_provider(&prompt).await?;
        let (mut title, mut body) = parse_script(&content)?;
        let mut words = word_count(&body);

        if !self.within_tolerance(words, target_words) {
            tracing::info!(
                word_count = words,
                target_words = target_words,
                "Draft missed the word target, re-prompting once"
            );
            let corrective = SnippetPrompt {
                system: prompt.system.clone(),
                user: format!(
                    "{}\n\n{}",
                    prompt.user,
                    length_correction_prompt(words, target_words)
                ),
            };
            let retried = self.call_provider(&corrective).await?;
            let (new_title, new_body) = parse_script(&retried)?;
            title = new_title;
            body = new_body;
            words = word_count(&body);
        }

        let upper_bound = (target_words as f32 * (1.0 + self.length_tolerance)) as usize;
        if words > upper_bound {
            body = truncate_at_sentence(&body, upper_bound);
            words = word_count(&body);
            tracing::info!(word_count = words, "Overlong script truncated at sentence boundary");
        } else if !self.within_tolerance(words, target_words) {
            tracing::warn!(
                word_count = words,
                target_words = target_words,
                "Script still short of target after re-prompt, accepting"
            );
        }

        Ok(ScriptArtifact {
            fingerprint: fingerprint.clone(),
            title,
            text: body,
            word_count: words,
            provider_used: self.repo.provider_id().to_string(),
            generated_at: Utc::now(),
        })
    }

    async fn call_provider(&self, prompt: &SnippetPrompt) -> Result<String, GenerationError> {
        self.retry
            .run(|_attempt| self.repo.generate(prompt, self.max_tokens))
            .await
    }

    fn within_tolerance(&self, words: usize, target: usize) -> bool {
        let deviation = (words as f32 - target as f32).abs();
        deviation <= target as f32 * self.length_tolerance
    }
}

/// Split a raw completion into title and body. The template asks for a
/// '# '-prefixed title on the first line; a missing marker falls back to
/// treating the first line as the title.
fn parse_script(content: &str) -> Result<(String, String), GenerationError> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return Err(GenerationError::MalformedResponse(
            "empty completion".to_string(),
        ));
    }

    let mut lines = trimmed.lines();
    let first = lines.next().unwrap_or_default();
    let title = first.trim_start_matches('#').trim().to_string();
    let body = lines.collect::<Vec<_>>().join("\n").trim().to_string();

    if title.is_empty() || body.is_empty() {
        return Err(GenerationError::MalformedResponse(
            "completion missing title or body".to_string(),
        ));
    }

    Ok((title, body))
}

fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Cut the body back to at most `max_words`, ending on a sentence boundary
/// when one exists before the limit.
fn truncate_at_sentence(body: &str, max_words: usize) -> String {
    let sentence_pattern = regex::Regex::new(r"[.!?]+(\s+|$)").unwrap();
    let mut kept_end = 0;

    for mat in sentence_pattern.find_iter(body) {
        if word_count(&body[..mat.end()]) > max_words {
            break;
        }
        kept_end = mat.end();
    }

    if kept_end == 0 {
        // No sentence boundary inside the budget, cut on words
        return body
            .split_whitespace()
            .take(max_words)
            .collect::<Vec<_>>()
            .join(" ");
    }

    body[..kept_end].trim().to_string()
}
