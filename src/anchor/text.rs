//! Text normalization with raw-offset recovery
//!
//! All matching is case-insensitive and whitespace-insensitive: consecutive
//! whitespace collapses to a single space and text is lower-cased before
//! comparison. [`NormalizedText`] additionally records, for every normalized
//! character, the byte span of the raw text it came from, so a hit found in
//! normalized space converts to exact raw offsets. One normalization serves
//! both locating a node and computing offsets within it; the two can never
//! disagree about which occurrence matched.

/// Collapse whitespace runs to single spaces and trim, preserving case.
pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// A normalized rendition of a raw string plus the per-character mapping
/// back into the raw bytes.
#[derive(Debug, Clone)]
pub struct NormalizedText {
    text: String,
    /// Byte offset in the raw text where normalized char `i` begins
    raw_starts: Vec<usize>,
    /// Byte offset in the raw text where normalized char `i` ends (exclusive)
    raw_ends: Vec<usize>,
}

/// Normalize `raw`: collapse whitespace runs to one space, trim, lower-case.
///
/// Characters whose lower-case expansion is longer than one character map
/// every expanded character to the same raw span. A collapsed space maps to
/// the whole whitespace run it replaced.
pub fn normalize(raw: &str) -> NormalizedText {
    let mut text = String::new();
    let mut raw_starts = Vec::new();
    let mut raw_ends = Vec::new();
    let mut pending_ws: Option<(usize, usize)> = None;

    for (start, ch) in raw.char_indices() {
        let end = start + ch.len_utf8();
        if ch.is_whitespace() {
            pending_ws = Some(match pending_ws {
                Some((run_start, _)) => (run_start, end),
                None => (start, end),
            });
            continue;
        }
        if let Some((run_start, run_end)) = pending_ws.take() {
            // Leading whitespace is trimmed, interior runs collapse to ' '.
            if !text.is_empty() {
                text.push(' ');
                raw_starts.push(run_start);
                raw_ends.push(run_end);
            }
        }
        for lowered in ch.to_lowercase() {
            text.push(lowered);
            raw_starts.push(start);
            raw_ends.push(end);
        }
    }

    NormalizedText {
        text,
        raw_starts,
        raw_ends,
    }
}

impl NormalizedText {
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Length in normalized characters
    pub fn char_len(&self) -> usize {
        self.raw_starts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.raw_starts.is_empty()
    }

    /// Position (in normalized characters) of the first occurrence of
    /// `needle`, which must itself be in normalized form.
    pub fn find(&self, needle: &str) -> Option<usize> {
        self.text
            .find(needle)
            .map(|byte_idx| self.text[..byte_idx].chars().count())
    }

    /// Convert a normalized character range back to a raw byte span.
    ///
    /// The range is `start_char .. start_char + len_chars`, clamped to the
    /// normalized length. Returns `None` for an empty or out-of-bounds span.
    pub fn raw_span(&self, start_char: usize, len_chars: usize) -> Option<(usize, usize)> {
        if start_char >= self.char_len() || len_chars == 0 {
            return None;
        }
        let end_char = usize::min(start_char + len_chars, self.char_len());
        Some((self.raw_starts[start_char], self.raw_ends[end_char - 1]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collapse_whitespace() {
        assert_eq!(collapse_whitespace("  a \n\t b  "), "a b");
        assert_eq!(collapse_whitespace(""), "");
    }

    #[test]
    fn test_normalize_lowercases_and_collapses() {
        let norm = normalize("  The   QUICK\nfox ");
        assert_eq!(norm.as_str(), "the quick fox");
        assert_eq!(norm.char_len(), 13);
    }

    #[test]
    fn test_raw_span_identity_text() {
        let norm = normalize("plain text");
        assert_eq!(norm.raw_span(0, 5), Some((0, 5)));
        assert_eq!(norm.raw_span(6, 4), Some((6, 10)));
    }

    #[test]
    fn test_raw_span_through_collapsed_run() {
        //         0123456789
        let raw = "ab   cd";
        let norm = normalize(raw);
        assert_eq!(norm.as_str(), "ab cd");
        // The span covering "ab cd" ends at the raw 'd'.
        assert_eq!(norm.raw_span(0, 5), Some((0, 7)));
        // "cd" alone starts after the whitespace run.
        assert_eq!(norm.raw_span(3, 2), Some((5, 7)));
    }

    #[test]
    fn test_raw_span_excludes_trailing_whitespace() {
        let raw = "  hello world  ";
        let norm = normalize(raw);
        assert_eq!(norm.as_str(), "hello world");
        let (start, end) = norm.raw_span(0, norm.char_len()).unwrap();
        assert_eq!(&raw[start..end], "hello world");
    }

    #[test]
    fn test_raw_span_clamps_to_length() {
        let norm = normalize("short");
        assert_eq!(norm.raw_span(0, 100), Some((0, 5)));
        assert_eq!(norm.raw_span(10, 5), None);
        assert_eq!(norm.raw_span(0, 0), None);
    }

    #[test]
    fn test_multibyte_offsets_stay_on_boundaries() {
        let raw = "Überraschung  kostet  12€";
        let norm = normalize(raw);
        assert_eq!(norm.as_str(), "überraschung kostet 12€");
        let (start, end) = norm.raw_span(0, norm.char_len()).unwrap();
        assert!(raw.is_char_boundary(start) && raw.is_char_boundary(end));
        assert_eq!(&raw[start..end], "Überraschung  kostet  12€");
    }

    #[test]
    fn test_find_reports_char_positions() {
        let norm = normalize("Grüße aus  Berlin");
        assert_eq!(norm.find("aus berlin"), Some(6));
        assert_eq!(norm.find("missing"), None);
    }
}
