//! Filtered document-order walk over content-bearing text nodes
//!
//! Yields every text node a highlight could legitimately land in: document
//! order, skipping whole subtrees under non-content elements (scripts,
//! styles, input-like controls), under the overlay's own injected containers
//! (the engine must never highlight its own interface), and under markers
//! from the current session. Nodes whose trimmed text is very short are
//! skipped individually without affecting their siblings.

use super::marker::HIGHLIGHT_CLASS;
use super::text::{normalize, NormalizedText};
use ego_tree::iter::Edge;
use ego_tree::NodeId;
use scraper::node::Element;
use scraper::{Html, Node};

/// Elements whose text content is never highlightable, descendants included.
pub const SKIP_TAGS: [&str; 5] = ["script", "style", "noscript", "textarea", "input"];

/// Element ids of the overlay's own injected containers.
pub const DEFAULT_OVERLAY_IDS: [&str; 3] =
    ["__pagelens_chat__", "__pagelens_price__", "__pagelens_bubble__"];

/// Minimum trimmed length for an individual text node to be worth matching.
pub const MIN_NODE_TEXT_LEN: usize = 5;

/// Walker configuration
#[derive(Debug, Clone)]
pub struct WalkerOptions {
    /// Element ids whose subtrees are excluded wholesale
    pub excluded_ids: Vec<String>,
}

impl Default for WalkerOptions {
    fn default() -> Self {
        Self {
            excluded_ids: DEFAULT_OVERLAY_IDS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// One content-bearing text node, with its normalized form precomputed
#[derive(Debug)]
pub struct TextNodeRef {
    pub id: NodeId,
    pub raw: String,
    pub norm: NormalizedText,
}

/// Lazy iterator over the document's content text nodes. Restartable by
/// calling [`text_nodes`] again; enumeration never outlives one call.
pub struct TextNodes<'a> {
    traverse: ego_tree::iter::Traverse<'a, Node>,
    skip_depth: usize,
    options: &'a WalkerOptions,
}

/// Walk `doc` in document order, yielding highlightable text nodes.
pub fn text_nodes<'a>(doc: &'a Html, options: &'a WalkerOptions) -> TextNodes<'a> {
    TextNodes {
        traverse: doc.tree.root().traverse(),
        skip_depth: 0,
        options,
    }
}

fn is_excluded(el: &Element, options: &WalkerOptions) -> bool {
    if SKIP_TAGS.contains(&el.name()) {
        return true;
    }
    if let Some(id) = el.attr("id") {
        if options.excluded_ids.iter().any(|excluded| excluded == id) {
            return true;
        }
    }
    // Markers of the active session: re-matching inside one would nest
    // duplicate highlights for overlapping candidates.
    el.attr("class")
        .is_some_and(|classes| classes.split_whitespace().any(|c| c == HIGHLIGHT_CLASS))
}

impl<'a> Iterator for TextNodes<'a> {
    type Item = TextNodeRef;

    fn next(&mut self) -> Option<Self::Item> {
        for edge in self.traverse.by_ref() {
            match edge {
                Edge::Open(node) => match node.value() {
                    Node::Element(el) => {
                        if is_excluded(el, self.options) {
                            self.skip_depth += 1;
                        }
                    }
                    Node::Text(text) if self.skip_depth == 0 => {
                        if text.text.trim().chars().count() >= MIN_NODE_TEXT_LEN {
                            let raw = text.text.to_string();
                            let norm = normalize(&raw);
                            return Some(TextNodeRef {
                                id: node.id(),
                                raw,
                                norm,
                            });
                        }
                    }
                    _ => {}
                },
                Edge::Close(node) => {
                    if let Node::Element(el) = node.value() {
                        if is_excluded(el, self.options) && self.skip_depth > 0 {
                            self.skip_depth -= 1;
                        }
                    }
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn walk(html: &str) -> Vec<String> {
        let doc = Html::parse_document(html);
        let options = WalkerOptions::default();
        text_nodes(&doc, &options).map(|n| n.raw).collect()
    }

    #[test]
    fn test_document_order() {
        let texts = walk(
            "<html><body><p>first paragraph</p><div>second <em>emphasized run</em> third part</div></body></html>",
        );
        assert_eq!(
            texts,
            vec!["first paragraph", "second ", "emphasized run", " third part"]
        );
    }

    #[test]
    fn test_skips_script_and_style_subtrees() {
        let texts = walk(
            "<html><head><style>body { color: red; }</style></head>\
             <body><script>console.log(\"secret value\");</script><p>visible content</p></body></html>",
        );
        assert_eq!(texts, vec!["visible content"]);
    }

    #[test]
    fn test_skips_overlay_containers_recursively() {
        let texts = walk(
            "<html><body>\
             <div id=\"__pagelens_chat__\"><div><p>chat transcript text</p></div></div>\
             <p>actual page content</p>\
             </body></html>",
        );
        assert_eq!(texts, vec!["actual page content"]);
    }

    #[test]
    fn test_short_nodes_skipped_without_affecting_siblings() {
        let texts = walk("<html><body><p>ab</p><p>long enough text</p></body></html>");
        assert_eq!(texts, vec!["long enough text"]);
    }

    #[test]
    fn test_custom_excluded_id() {
        let doc = Html::parse_document(
            "<html><body><div id=\"sidebar\">sidebar words here</div><p>main body text</p></body></html>",
        );
        let options = WalkerOptions {
            excluded_ids: vec!["sidebar".to_string()],
        };
        let texts: Vec<String> = text_nodes(&doc, &options).map(|n| n.raw).collect();
        assert_eq!(texts, vec!["main body text"]);
    }

    #[test]
    fn test_restartable() {
        let doc = Html::parse_document("<html><body><p>only paragraph</p></body></html>");
        let options = WalkerOptions::default();
        assert_eq!(text_nodes(&doc, &options).count(), 1);
        assert_eq!(text_nodes(&doc, &options).count(), 1);
    }
}
