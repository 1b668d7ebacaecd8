//! Pagelens - Local AI Page Companion
//!
//! The engine room behind a chat overlay for arbitrary web pages:
//! - Source-text anchoring: relocate the text an assistant cites inside the
//!   live page and mark it visually, tolerant of split inline elements,
//!   collapsed whitespace, and casing differences
//! - Page chat with retrieval over the current page's content
//! - Price tracking with per-product history and trend stats
//! - YouTube transcript chat with timeline markers
//!
//! # Architecture
//!
//! The crate is organized into several layers:
//! - **Anchor**: the highlighting engine (phrase candidates, document
//!   walking, matching, range wrapping, session lifecycle)
//! - **Extract**: visible-text and product-info extraction from parsed pages
//! - **Services**: LLM integration, embeddings, retrieval, price history,
//!   transcripts
//! - **Api**: the local HTTP surface consumed by the overlay
//!
//! # Example
//!
//! ```
//! use pagelens_core::anchor::Highlighter;
//!
//! let page = "<html><body><p>The quick brown fox jumps over the lazy dog.</p></body></html>";
//! let mut engine = Highlighter::from_html(page);
//!
//! assert!(engine.highlight("The quick brown fox jumps over the lazy dog."));
//! assert_eq!(engine.marker_count(), 1);
//!
//! engine.clear();
//! assert_eq!(engine.marker_count(), 0);
//! ```

pub mod anchor;
pub mod api;
pub mod config;
pub mod error;
pub mod extract;
pub mod services;
pub mod storage;
pub mod types;
pub mod utils;

// Re-export commonly used types
pub use anchor::{HighlightSession, Highlighter};
pub use config::Settings;
pub use error::{PagelensError, Result};
pub use services::{EmbeddingService, LlmService, PriceService, RagService, TranscriptService};
pub use storage::Storage;
