//! Candidate-to-node resolution
//!
//! Finds the first text node (document order) containing a candidate phrase
//! and converts the hit to exact raw offsets within that node. Both the
//! containment test and the offset computation run on the same normalized
//! anchor, so they cannot disagree about which occurrence matched. Matches
//! never cross node boundaries.

use super::text::normalize;
use super::walker::{text_nodes, WalkerOptions};
use ego_tree::NodeId;
use scraper::Html;

/// Phrases with fewer normalized characters than this are unmatchable.
pub const MIN_MATCH_LEN: usize = 15;

/// How many normalized characters of the phrase anchor the node search.
pub const NODE_ANCHOR_LEN: usize = 40;

/// A resolved match: one text node and a byte range within its raw text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnchorMatch {
    pub node: NodeId,
    pub start: usize,
    pub end: usize,
}

/// Locate `phrase` in the document. Returns the first hit, or `None` when no
/// qualifying node contains it; the caller then tries its next candidate.
pub fn find_anchor(doc: &Html, options: &WalkerOptions, phrase: &str) -> Option<AnchorMatch> {
    let phrase_norm = normalize(phrase);
    if phrase_norm.char_len() < MIN_MATCH_LEN {
        return None;
    }

    let anchor: String = phrase_norm.as_str().chars().take(NODE_ANCHOR_LEN).collect();

    for node in text_nodes(doc, options) {
        let Some(start_char) = node.norm.find(&anchor) else {
            continue;
        };
        // End = match start + phrase length, clamped to the node.
        if let Some((start, end)) = node.norm.raw_span(start_char, phrase_norm.char_len()) {
            return Some(AnchorMatch {
                node: node.id,
                start,
                end,
            });
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn first_match(html: &str, phrase: &str) -> Option<(String, usize, usize)> {
        let doc = Html::parse_document(html);
        let options = WalkerOptions::default();
        let hit = find_anchor(&doc, &options, phrase)?;
        let raw = doc
            .tree
            .get(hit.node)
            .and_then(|n| n.value().as_text().map(|t| t.text.to_string()))?;
        Some((raw, hit.start, hit.end))
    }

    #[test]
    fn test_verbatim_match_with_exact_offsets() {
        let (raw, start, end) = first_match(
            "<html><body><p>The quick brown fox jumps over the lazy dog.</p></body></html>",
            "The quick brown fox jumps over the lazy dog.",
        )
        .unwrap();
        assert_eq!(&raw[start..end], "The quick brown fox jumps over the lazy dog.");
    }

    #[test]
    fn test_case_and_whitespace_insensitive() {
        let (raw, start, end) = first_match(
            "<html><body><p>prefix text THE  Quick\u{a0}brown FOX jumps over everything</p></body></html>",
            "the quick brown fox jumps",
        )
        .unwrap();
        assert_eq!(&raw[start..], "THE  Quick\u{a0}brown FOX jumps over everything");
        // End clamps to phrase length in normalized characters.
        assert!(raw[start..end].to_lowercase().starts_with("the"));
        assert!(end > start);
    }

    #[test]
    fn test_short_phrase_rejected_even_if_present() {
        assert!(first_match(
            "<html><body><p>verbatim target</p></body></html>",
            "verbatim target",
        )
        .is_none());
    }

    #[test]
    fn test_phrase_split_across_inline_element_is_unreachable() {
        assert!(first_match(
            "<html><body><p>The quick <b>brown fox</b> jumps over the lazy dog.</p></body></html>",
            "The quick brown fox jumps over the lazy dog.",
        )
        .is_none());
    }

    #[test]
    fn test_first_node_in_document_order_wins() {
        let html = "<html><body>\
                    <p>a shared sentence appears here first</p>\
                    <p>a shared sentence appears here first</p>\
                    </body></html>";
        let doc = Html::parse_document(html);
        let options = WalkerOptions::default();
        let hit = find_anchor(&doc, &options, "a shared sentence appears here first").unwrap();
        let first_id = text_nodes(&doc, &options).next().unwrap().id;
        assert_eq!(hit.node, first_id);
    }

    #[test]
    fn test_end_clamped_to_node_length() {
        // Node contains the 40-char anchor but is shorter than the phrase.
        let html =
            "<html><body><p>the answer to the question is fourty two</p></body></html>";
        let phrase = "the answer to the question is fourty two plus more trailing context";
        let (raw, start, end) = first_match(html, phrase).unwrap();
        assert_eq!(start, 0);
        assert_eq!(end, raw.len());
    }
}
