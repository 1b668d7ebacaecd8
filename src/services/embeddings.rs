//! Embedding generation for retrieval
//!
//! Page chat embeds every chunk of every visited page, so embedding has to
//! be local and cheap: character n-gram and word hashing into a fixed-size
//! normalized vector. Coarse compared to a learned model, but deterministic,
//! dependency-free, and good enough to rank a page's own chunks against a
//! question about that page.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Embedding dimension
pub const EMBEDDING_DIM: usize = 384;

/// Local embedding service
#[derive(Debug, Default, Clone)]
pub struct EmbeddingService;

impl EmbeddingService {
    pub fn new() -> Self {
        Self
    }

    /// Generate a normalized embedding vector for `text`.
    pub fn embed(&self, text: &str) -> Vec<f32> {
        let mut embedding = vec![0.0; EMBEDDING_DIM];

        // Character n-grams capture sub-word overlap.
        let text_lower = text.to_lowercase();
        let chars: Vec<char> = text_lower.chars().collect();
        for window_size in 2..=4 {
            for window in chars.windows(window_size) {
                let mut hasher = DefaultHasher::new();
                window.iter().collect::<String>().hash(&mut hasher);
                let dim = (hasher.finish() as usize) % EMBEDDING_DIM;
                embedding[dim] += 1.0;
            }
        }

        // Words weighted more than character n-grams.
        for word in text_lower.split_whitespace() {
            let mut hasher = DefaultHasher::new();
            word.hash(&mut hasher);
            let dim = (hasher.finish() as usize) % EMBEDDING_DIM;
            embedding[dim] += 2.0;
        }

        let magnitude: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        if magnitude > 0.0 {
            for val in &mut embedding {
                *val /= magnitude;
            }
        }

        embedding
    }
}

/// Calculate cosine similarity between two vectors
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let magnitude_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let magnitude_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if magnitude_a == 0.0 || magnitude_b == 0.0 {
        return 0.0;
    }

    dot_product / (magnitude_a * magnitude_b)
}
