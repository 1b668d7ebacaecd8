//! Source-text anchoring and highlighting engine
//!
//! Given a snippet the assistant claims as its answer's source, relocate
//! that text inside an already-rendered document and mark it visually. The
//! document does not preserve the snippet's contiguity: content is split
//! across inline elements, whitespace is collapsed, casing varies. Matching
//! therefore happens in normalized space (whitespace runs collapsed,
//! lower-cased) with exact raw offsets recovered through a position map.
//!
//! Pipeline per [`Highlighter::highlight`] call:
//! candidate phrases ([`phrases`]) -> filtered text-node walk ([`walker`])
//! -> first containing node + offsets ([`matcher`]) -> in-place `<mark>`
//! wrap ([`marker`]) -> session tracking and visual lifecycle ([`engine`]).
//!
//! A marker never spans more than one text node; a phrase that the page
//! splits across elements is unreachable at that granularity, which is why
//! the extractor supplies sentence- and window-level fallbacks.

pub mod engine;
pub mod marker;
pub mod matcher;
pub mod phrases;
pub mod text;
pub mod walker;

pub use engine::{HighlightSession, Highlighter, VisualEffect, MAX_MARKERS, PULSE_DURATION};
pub use matcher::{find_anchor, AnchorMatch};
pub use phrases::extract_phrases;
pub use text::{collapse_whitespace, normalize, NormalizedText};
pub use walker::{text_nodes, TextNodeRef, WalkerOptions};
