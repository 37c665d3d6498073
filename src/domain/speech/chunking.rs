/// Split text into chunks that respect sentence boundaries, each at most
/// `max_len` bytes. Providers cap request size (Polly at 3000 characters,
/// OpenAI at 4096), so long scripts are synthesized per-chunk and the audio
/// concatenated in original order.
pub fn split_into_chunks(text: &str, max_len: usize) -> Vec<String> {
    if text.len() <= max_len {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut current_chunk = String::new();

    // Split on sentence-ending punctuation
    let sentence_pattern = regex::Regex::new(r"([.!?]+\s+)").unwrap();
    let mut last_end = 0;

    for mat in sentence_pattern.find_iter(text) {
        let sentence = &text[last_end..mat.end()];

        // If adding this sentence would exceed the limit, save current chunk
        if !current_chunk.is_empty() && current_chunk.len() + sentence.len() > max_len {
            chunks.push(current_chunk.trim().to_string());
            current_chunk = String::new();
        }

        current_chunk.push_str(sentence);
        last_end = mat.end();
    }

    // Handle remaining text after last sentence boundary
    if last_end < text.len() {
        let remaining = &text[last_end..];

        if !current_chunk.is_empty() && current_chunk.len() + remaining.len() > max_len {
            chunks.push(current_chunk.trim().to_string());
            current_chunk = String::new();
        }

        // If remaining text itself is too large, split it by characters
        if remaining.len() > max_len {
            let chars: Vec<char> = remaining.chars().collect();
            for chunk in chars.chunks(max_len) {
                chunks.push(chunk.iter().collect());
            }
        } else {
            current_chunk.push_str(remaining);
        }
    }

    if !current_chunk.is_empty() {
        chunks.push(current_chunk.trim().to_string());
    }

    chunks
}
