//! String utility functions for safe UTF-8 text manipulation

/// Truncate a string to at most `max_chars` characters, respecting character
/// boundaries.
///
/// Unlike naive byte slicing (`&s[..n]`), this never slices in the middle of
/// a multi-byte UTF-8 character.
pub fn truncate_chars(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        s.chars().take(max_chars).collect()
    }
}

/// Short single-line preview of a string for log output, with ellipsis if
/// anything was cut.
pub fn preview(s: &str, max_chars: usize) -> String {
    let one_line = s.split_whitespace().collect::<Vec<_>>().join(" ");
    if one_line.chars().count() <= max_chars {
        one_line
    } else {
        format!("{}...", truncate_chars(&one_line, max_chars))
    }
}
