//! Services layer: LLM integration, embeddings, retrieval, price history,
//! and transcripts.

pub mod embeddings;
pub mod llm;
pub mod price;
pub mod rag;
pub mod transcript;

pub use embeddings::{cosine_similarity, EmbeddingService, EMBEDDING_DIM};
pub use llm::LlmService;
pub use price::{detect_currency, normalize_url, parse_price, PriceService};
pub use rag::{chunk_hash, split_text, RagService};
pub use transcript::{
    build_timed_chunks, extract_video_id, format_timestamp, TranscriptService, VideoSummary,
};
