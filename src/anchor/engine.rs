//! Highlight session lifecycle
//!
//! [`Highlighter`] owns the document it was built over and at most one
//! [`HighlightSession`] at a time. Starting a new session clears the
//! previous one unconditionally; the worst case of any call is "nothing
//! highlighted", never a partially modified document. Visual follow-ups for
//! the primary marker (pulse removal, scroll-into-view) are held as
//! cancellable deferred tasks bound to the marker's identity instead of
//! detached timers, so clearing a session also cancels its pending tasks.

use super::marker::{self, ACTIVE_CLASS, PULSE_CLASS};
use super::matcher::find_anchor;
use super::phrases::extract_phrases;
use super::walker::{self, WalkerOptions};
use ego_tree::iter::Edge;
use ego_tree::NodeId;
use scraper::{Html, Node};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Hard cap on markers per session
pub const MAX_MARKERS: usize = 5;

/// How long the primary marker keeps its pulse emphasis
pub const PULSE_DURATION: Duration = Duration::from_millis(700);

/// The markers produced by one `highlight` call. The first successfully
/// created marker is primary and receives the visual emphasis.
#[derive(Debug, Clone)]
pub struct HighlightSession {
    markers: Vec<NodeId>,
    primary: NodeId,
}

impl HighlightSession {
    pub fn markers(&self) -> &[NodeId] {
        &self.markers
    }

    pub fn primary(&self) -> NodeId {
        self.primary
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }
}

/// Host-side effect requested by a due deferred task
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisualEffect {
    /// Bring the marker into the viewport, centered, smooth
    ScrollIntoView { marker: NodeId },
}

#[derive(Debug, Clone, Copy)]
enum DeferredAction {
    RemovePulse,
    ScrollIntoView,
}

#[derive(Debug)]
struct DeferredTask {
    marker: NodeId,
    action: DeferredAction,
    due: Instant,
}

/// The text-anchoring and highlighting engine.
///
/// Construct over an explicit document (never an ambient one) so the engine
/// can be exercised against an in-memory fragment. Single-threaded and
/// synchronous: each call runs to completion; only the deferred visual tasks
/// outlive it, and those are drained by the host via [`Self::drain_due`].
pub struct Highlighter {
    doc: Html,
    options: WalkerOptions,
    session: Option<HighlightSession>,
    deferred: Vec<DeferredTask>,
}

impl Highlighter {
    /// Engine over a parsed document with default overlay exclusions.
    pub fn new(doc: Html) -> Self {
        Self::with_options(doc, WalkerOptions::default())
    }

    pub fn with_options(doc: Html, options: WalkerOptions) -> Self {
        Self {
            doc,
            options,
            session: None,
            deferred: Vec::new(),
        }
    }

    /// Parse `html` and build an engine over it.
    pub fn from_html(html: &str) -> Self {
        Self::new(Html::parse_document(html))
    }

    /// Locate `chunk` in the document and mark it. Returns true iff at least
    /// one marker was created. Any previous session is cleared first.
    pub fn highlight(&mut self, chunk: &str) -> bool {
        self.clear();
        marker::ensure_styles(&mut self.doc);

        let mut markers = Vec::new();
        for phrase in extract_phrases(chunk) {
            if markers.len() >= MAX_MARKERS {
                break;
            }
            let Some(hit) = find_anchor(&self.doc, &self.options, &phrase) else {
                continue;
            };
            match marker::wrap_range(&mut self.doc.tree, &hit) {
                Some(id) => markers.push(id),
                // Offsets were validated against the node at match time, so
                // this means the structure changed under us.
                None => warn!(node = ?hit.node, "matched range could not be wrapped"),
            }
        }

        let Some(&primary) = markers.first() else {
            debug!(chunk_len = chunk.len(), "no candidate matched");
            return false;
        };

        marker::add_classes(&mut self.doc.tree, primary, &[ACTIVE_CLASS, PULSE_CLASS]);
        let now = Instant::now();
        self.deferred.push(DeferredTask {
            marker: primary,
            action: DeferredAction::ScrollIntoView,
            due: now,
        });
        self.deferred.push(DeferredTask {
            marker: primary,
            action: DeferredAction::RemovePulse,
            due: now + PULSE_DURATION,
        });

        debug!(markers = markers.len(), "highlight session started");
        self.session = Some(HighlightSession { markers, primary });
        true
    }

    /// Remove every marker of the current session, restoring the document
    /// text exactly, and cancel the session's pending deferred tasks.
    /// No-op when no session is active.
    pub fn clear(&mut self) {
        let Some(session) = self.session.take() else {
            return;
        };
        self.deferred
            .retain(|task| !session.markers.contains(&task.marker));
        for id in session.markers {
            marker::unwrap_marker(&mut self.doc.tree, id);
        }
    }

    /// Run deferred tasks that are due at `now`. Pulse removal is applied to
    /// the tree directly; effects the engine cannot perform itself (scroll)
    /// are returned for the host.
    pub fn drain_due(&mut self, now: Instant) -> Vec<VisualEffect> {
        let mut effects = Vec::new();
        let tasks = std::mem::take(&mut self.deferred);
        for task in tasks {
            if task.due > now {
                self.deferred.push(task);
                continue;
            }
            match task.action {
                DeferredAction::RemovePulse => {
                    marker::remove_class(&mut self.doc.tree, task.marker, PULSE_CLASS);
                }
                DeferredAction::ScrollIntoView => {
                    effects.push(VisualEffect::ScrollIntoView {
                        marker: task.marker,
                    });
                }
            }
        }
        effects
    }

    /// Number of deferred tasks not yet run or cancelled.
    pub fn pending_tasks(&self) -> usize {
        self.deferred.len()
    }

    pub fn session(&self) -> Option<&HighlightSession> {
        self.session.as_ref()
    }

    pub fn marker_count(&self) -> usize {
        self.session.as_ref().map_or(0, |s| s.len())
    }

    pub fn document(&self) -> &Html {
        &self.doc
    }

    /// Serialized document markup.
    pub fn html(&self) -> String {
        self.doc.root_element().html()
    }

    /// The document's content text: every text node outside script/style
    /// subtrees, concatenated raw. Wrapping and clearing must leave this
    /// byte-identical.
    pub fn text(&self) -> String {
        content_text(&self.doc)
    }
}

fn content_text(doc: &Html) -> String {
    let mut out = String::new();
    let mut skip_depth = 0usize;
    for edge in doc.tree.root().traverse() {
        match edge {
            Edge::Open(node) => match node.value() {
                Node::Element(el) => {
                    if walker::SKIP_TAGS.contains(&el.name()) {
                        skip_depth += 1;
                    }
                }
                Node::Text(text) if skip_depth == 0 => out.push_str(&text.text),
                _ => {}
            },
            Edge::Close(node) => {
                if let Node::Element(el) = node.value() {
                    if walker::SKIP_TAGS.contains(&el.name()) && skip_depth > 0 {
                        skip_depth -= 1;
                    }
                }
            }
        }
    }
    out
}
