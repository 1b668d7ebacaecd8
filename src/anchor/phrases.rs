//! Candidate phrase extraction
//!
//! A source chunk rarely survives the model's response pipeline verbatim, so
//! one search string is not enough. Candidates are produced in confidence
//! order: the full cleaned chunk first, then its sentences, then overlapping
//! windows that tolerate partial quoting. Short candidates are dropped
//! outright; they produce too many accidental matches.

use super::text::collapse_whitespace;

/// Candidates shorter than this (in characters) are never considered.
pub const MIN_CANDIDATE_LEN: usize = 20;

/// Sentence segments must be strictly longer than this to qualify.
const SENTENCE_MIN_LEN: usize = 20;

/// Sliding-window geometry, applied only to chunks longer than the
/// threshold.
const WINDOW_WIDTH: usize = 80;
const WINDOW_STRIDE: usize = 40;
const WINDOW_THRESHOLD: usize = 60;

/// Turn a source chunk into an ordered candidate list, highest confidence
/// first. Whitespace is collapsed; case is preserved (matching lower-cases
/// later). May be empty if the chunk is too short to anchor.
pub fn extract_phrases(chunk: &str) -> Vec<String> {
    let cleaned = collapse_whitespace(chunk);
    let mut candidates = Vec::new();

    candidates.push(cleaned.clone());

    for segment in cleaned.split(['.', '!', '?']) {
        let segment = segment.trim();
        if segment.chars().count() > SENTENCE_MIN_LEN {
            candidates.push(segment.to_string());
        }
    }

    let total = cleaned.chars().count();
    if total > WINDOW_THRESHOLD {
        let chars: Vec<char> = cleaned.chars().collect();
        let mut start = 0;
        while start + WINDOW_THRESHOLD < total {
            let end = usize::min(start + WINDOW_WIDTH, total);
            candidates.push(chars[start..end].iter().collect());
            start += WINDOW_STRIDE;
        }
    }

    candidates.retain(|c| c.chars().count() >= MIN_CANDIDATE_LEN);
    candidates
}
