//! Text helpers shared by the formatter and the stream proxy

/// Truncate to at most `max_chars` characters, never splitting a UTF-8 sequence
pub fn truncate_chars(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

/// Truncate with a note about how much was cut
pub fn truncate_with_note(s: &str, max_chars: usize) -> String {
    let total = s.chars().count();
    if total > max_chars {
        format!("{}... ({} chars truncated)", truncate_chars(s, max_chars), total - max_chars)
    } else {
        s.to_string()
    }
}
