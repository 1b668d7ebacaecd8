//! Visible-text extraction for chat context
//!
//! Produces the plain text a reader actually sees: scripts, styles and
//! chrome-ish containers (navigation, headers, footers, asides, hidden
//! subtrees) are dropped wholesale, whitespace is collapsed. This is the
//! context string the page-chat prompt is grounded in.

use ego_tree::iter::Edge;
use scraper::node::Element;
use scraper::{Html, Node, Selector};

/// Subtrees that never contribute readable content.
const NON_CONTENT_TAGS: [&str; 7] = [
    "script", "style", "noscript", "nav", "footer", "header", "aside",
];

fn is_non_content(el: &Element) -> bool {
    NON_CONTENT_TAGS.contains(&el.name()) || el.attr("aria-hidden") == Some("true")
}

/// Extract the page's visible text, whitespace-collapsed.
pub fn page_text(doc: &Html) -> String {
    let mut chunks: Vec<String> = Vec::new();
    let mut skip_depth = 0usize;

    let body = Selector::parse("body").ok();
    let root = body
        .as_ref()
        .and_then(|sel| doc.select(sel).next())
        .map(|el| *el)
        .unwrap_or_else(|| doc.tree.root());

    for edge in root.traverse() {
        match edge {
            Edge::Open(node) => match node.value() {
                Node::Element(el) => {
                    if is_non_content(el) {
                        skip_depth += 1;
                    }
                }
                Node::Text(text) if skip_depth == 0 => {
                    let trimmed = text.text.trim();
                    if !trimmed.is_empty() {
                        chunks.push(trimmed.split_whitespace().collect::<Vec<_>>().join(" "));
                    }
                }
                _ => {}
            },
            Edge::Close(node) => {
                if let Node::Element(el) = node.value() {
                    if is_non_content(el) && skip_depth > 0 {
                        skip_depth -= 1;
                    }
                }
            }
        }
    }

    chunks.join(" ")
}

/// The document title, whitespace-collapsed, if present and non-empty.
pub fn extract_title(doc: &Html) -> Option<String> {
    let selector = Selector::parse("title").ok()?;
    doc.select(&selector).next().and_then(|el| {
        let title = el
            .text()
            .collect::<Vec<_>>()
            .join(" ")
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ");
        (!title.is_empty()).then_some(title)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_text_skips_non_content() {
        let doc = Html::parse_document(
            "<html><body>\
             <nav>Home About Contact</nav>\
             <script>var x = 1;</script>\
             <p>Real   article\ntext.</p>\
             <footer>copyright</footer>\
             </body></html>",
        );
        assert_eq!(page_text(&doc), "Real article text.");
    }

    #[test]
    fn test_page_text_skips_aria_hidden() {
        let doc = Html::parse_document(
            "<html><body><div aria-hidden=\"true\">decoration</div><p>content</p></body></html>",
        );
        assert_eq!(page_text(&doc), "content");
    }

    #[test]
    fn test_extract_title() {
        let doc = Html::parse_document(
            "<html><head><title>  Some \n Page  </title></head><body></body></html>",
        );
        assert_eq!(extract_title(&doc), Some("Some Page".to_string()));

        let untitled = Html::parse_document("<html><body></body></html>");
        assert_eq!(extract_title(&untitled), None);
    }
}
