/// Keep at most `max_words` whitespace-separated words, rejoined by single spaces.
pub fn truncate_words(text: &str, max_words: usize) -> String {
    text.split_whitespace()
        .take(max_words)
        .collect::<Vec<&str>>()
        .join(" ")
}

/// Number of characters (Unicode scalar values), not bytes.
pub fn char_len(text: &str) -> usize {
    text.chars().count()
}
