//! Range wrapping and unwrapping
//!
//! Materializes a match as a `<mark>` element around exactly one text node's
//! sub-range, and restores the original text on clear. Offsets are validated
//! against the live node before any mutation; a residual wrap failure means
//! the structure changed since enumeration and is reported to the caller as
//! a non-match. Also owns the one-time injection of the highlight stylesheet.

use super::matcher::AnchorMatch;
use ego_tree::{NodeId, Tree};
use html5ever::{Attribute, LocalName, Namespace, QualName};
use scraper::node::{Element, Text};
use scraper::{Html, Node};

/// Class carried by every marker element
pub const HIGHLIGHT_CLASS: &str = "__pagelens_mark__";
/// Extra class on the primary marker
pub const ACTIVE_CLASS: &str = "__pagelens_mark_active__";
/// Transient emphasis on the primary marker, removed after a short delay
pub const PULSE_CLASS: &str = "__pagelens_mark_pulse__";
/// Id of the injected stylesheet element
pub const STYLE_ELEMENT_ID: &str = "__pagelens_styles__";

const HIGHLIGHT_CSS: &str = "
.__pagelens_mark__ {
  background: rgba(203, 166, 247, 0.35) !important;
  border-radius: 3px;
  cursor: pointer;
  transition: background 0.2s;
}
.__pagelens_mark__:hover,
.__pagelens_mark_active__ {
  background: rgba(203, 166, 247, 0.7) !important;
  outline: 2px solid rgba(203, 166, 247, 0.9);
  outline-offset: 1px;
}
.__pagelens_mark_pulse__ {
  animation: __pagelens_pulse__ 0.6s ease;
}
@keyframes __pagelens_pulse__ {
  0%   { background: rgba(203, 166, 247, 0.9) !important; }
  100% { background: rgba(203, 166, 247, 0.35) !important; }
}
";

const HTML_NS: &str = "http://www.w3.org/1999/xhtml";

fn element_name(local: &str) -> QualName {
    QualName::new(None, Namespace::from(HTML_NS), LocalName::from(local))
}

fn attribute_name(local: &str) -> QualName {
    QualName::new(None, Namespace::from(""), LocalName::from(local))
}

fn text_node(text: &str) -> Node {
    Node::Text(Text { text: text.into() })
}

fn marker_element() -> Node {
    Node::Element(Element::new(
        element_name("mark"),
        vec![Attribute {
            name: attribute_name("class"),
            value: HIGHLIGHT_CLASS.into(),
        }],
    ))
}

/// Wrap the byte range of `hit` in a marker element.
///
/// The matched text node is split in place: leading text stays in the
/// original node, the matched slice moves into a new `<mark>`, trailing text
/// becomes a sibling. Returns the marker's node id, or `None` when the node
/// no longer carries the expected text (validated before mutation, so the
/// tree is untouched on failure).
pub fn wrap_range(tree: &mut Tree<Node>, hit: &AnchorMatch) -> Option<NodeId> {
    let raw = match tree.get(hit.node)?.value() {
        Node::Text(t) => t.text.to_string(),
        _ => return None,
    };
    if hit.start >= hit.end
        || hit.end > raw.len()
        || !raw.is_char_boundary(hit.start)
        || !raw.is_char_boundary(hit.end)
    {
        return None;
    }

    let pre = &raw[..hit.start];
    let mid = &raw[hit.start..hit.end];
    let post = &raw[hit.end..];

    let mark_id = {
        let mut node = tree.get_mut(hit.node)?;
        let mut mark = node.insert_after(marker_element());
        let mark_id = mark.id();
        mark.append(text_node(mid));
        if !post.is_empty() {
            mark.insert_after(text_node(post));
        }
        mark_id
    };

    if let Some(mut node) = tree.get_mut(hit.node) {
        if pre.is_empty() {
            node.detach();
        } else if let Node::Text(t) = node.value() {
            t.text = pre.into();
        }
    }

    Some(mark_id)
}

/// Replace a marker with its text content and re-merge the parent's text
/// children, so the document text is byte-identical to its pre-wrap state
/// with no empty residue.
pub fn unwrap_marker(tree: &mut Tree<Node>, marker: NodeId) {
    let (content, parent) = {
        let Some(node) = tree.get(marker) else { return };
        if !matches!(node.value(), Node::Element(_)) {
            return;
        }
        let content: String = node
            .children()
            .filter_map(|c| c.value().as_text().map(|t| t.text.to_string()))
            .collect();
        (content, node.parent().map(|p| p.id()))
    };

    if let Some(mut node) = tree.get_mut(marker) {
        if !content.is_empty() {
            node.insert_before(text_node(&content));
        }
        node.detach();
    }

    if let Some(parent) = parent {
        merge_text_children(tree, parent);
    }
}

/// Merge adjacent text children of `parent` and drop empty ones.
fn merge_text_children(tree: &mut Tree<Node>, parent: NodeId) {
    let children: Vec<NodeId> = match tree.get(parent) {
        Some(p) => p.children().map(|c| c.id()).collect(),
        None => return,
    };

    let mut run_head: Option<NodeId> = None;
    for id in children {
        let content = match tree.get(id) {
            Some(node) => match node.value().as_text() {
                Some(t) => t.text.to_string(),
                None => {
                    run_head = None;
                    continue;
                }
            },
            None => continue,
        };

        if content.is_empty() {
            if let Some(mut node) = tree.get_mut(id) {
                node.detach();
            }
            continue;
        }

        match run_head {
            None => run_head = Some(id),
            Some(head) => {
                if let Some(mut node) = tree.get_mut(id) {
                    node.detach();
                }
                if let Some(mut head_mut) = tree.get_mut(head) {
                    if let Node::Text(t) = head_mut.value() {
                        t.text.push_slice(&content);
                    }
                }
            }
        }
    }
}

/// Inject the highlight stylesheet into `<head>` if not already present.
pub fn ensure_styles(doc: &mut Html) {
    if find_element(doc, |el| el.attr("id") == Some(STYLE_ELEMENT_ID)).is_some() {
        return;
    }
    let Some(head) = find_element(doc, |el| el.name() == "head") else {
        return;
    };
    if let Some(mut head_mut) = doc.tree.get_mut(head) {
        let mut style = head_mut.append(Node::Element(Element::new(
            element_name("style"),
            vec![Attribute {
                name: attribute_name("id"),
                value: STYLE_ELEMENT_ID.into(),
            }],
        )));
        style.append(text_node(HIGHLIGHT_CSS));
    }
}

fn find_element(doc: &Html, pred: impl Fn(&Element) -> bool) -> Option<NodeId> {
    doc.tree.root().descendants().find_map(|node| match node.value() {
        Node::Element(el) if pred(el) => Some(node.id()),
        _ => None,
    })
}

/// Add classes to an element, preserving existing ones.
pub fn add_classes(tree: &mut Tree<Node>, id: NodeId, classes: &[&str]) {
    if let Some(mut node) = tree.get_mut(id) {
        if let Node::Element(el) = node.value() {
            let mut current: Vec<String> = el
                .attr("class")
                .map(|c| c.split_whitespace().map(String::from).collect())
                .unwrap_or_default();
            for class in classes {
                if !current.iter().any(|c| c == class) {
                    current.push((*class).to_string());
                }
            }
            let joined = current.join(" ");
            el.attrs.insert(attribute_name("class"), joined.as_str().into());
        }
    }
}

/// Remove one class token from an element, leaving the rest.
pub fn remove_class(tree: &mut Tree<Node>, id: NodeId, class: &str) {
    if let Some(mut node) = tree.get_mut(id) {
        if let Node::Element(el) = node.value() {
            let Some(current) = el.attr("class") else {
                return;
            };
            let remaining: Vec<&str> = current
                .split_whitespace()
                .filter(|c| *c != class)
                .collect();
            let joined = remaining.join(" ");
            el.attrs.insert(attribute_name("class"), joined.as_str().into());
        }
    }
}
