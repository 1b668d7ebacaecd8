//! Retrieval over the current page's content
//!
//! Pages are re-sent on every question, so the pipeline leans on caching:
//! chunks are content-addressed (SHA-256) and their embeddings cached in
//! SQLite with an in-memory LRU in front. Splitting is recursive: paragraph
//! breaks first, then lines, sentences, words, and finally raw characters
//! for pathological unbroken runs.

use crate::config::RagSettings;
use crate::error::Result;
use crate::services::embeddings::{cosine_similarity, EmbeddingService};
use crate::storage::Storage;
use lru::LruCache;
use sha2::{Digest, Sha256};
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};
use tracing::debug;

const SEPARATORS: [&str; 4] = ["\n\n", "\n", ".", " "];

const EMBED_CACHE_CAPACITY: usize = 512;

/// Content hash used as the chunk cache key
pub fn chunk_hash(text: &str) -> String {
    format!("{:x}", Sha256::digest(text.trim().as_bytes()))
}

/// Split `text` into chunks of roughly `chunk_size` characters with
/// `chunk_overlap` characters of overlap, preferring natural boundaries.
pub fn split_text(text: &str, chunk_size: usize, chunk_overlap: usize) -> Vec<String> {
    split_recursive(text, &SEPARATORS, chunk_size, chunk_overlap)
        .into_iter()
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .collect()
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

fn split_recursive(
    text: &str,
    separators: &[&str],
    chunk_size: usize,
    chunk_overlap: usize,
) -> Vec<String> {
    let Some((separator, rest)) = separators.split_first() else {
        // Out of separators: hard-split on characters.
        let chars: Vec<char> = text.chars().collect();
        return chars
            .chunks(chunk_size.max(1))
            .map(|c| c.iter().collect())
            .collect();
    };

    let splits: Vec<&str> = text.split(separator).collect();

    let mut chunks = Vec::new();
    let mut pending: Vec<String> = Vec::new();
    for split in splits {
        if char_len(split) < chunk_size {
            pending.push(split.to_string());
        } else {
            // Flush what fits, then break the oversized split further down.
            chunks.extend(merge_splits(&pending, separator, chunk_size, chunk_overlap));
            pending.clear();
            chunks.extend(split_recursive(split, rest, chunk_size, chunk_overlap));
        }
    }
    chunks.extend(merge_splits(&pending, separator, chunk_size, chunk_overlap));
    chunks
}

/// Greedily merge small splits back into chunks that respect `chunk_size`,
/// carrying `chunk_overlap` characters of trailing context forward.
fn merge_splits(
    splits: &[String],
    separator: &str,
    chunk_size: usize,
    chunk_overlap: usize,
) -> Vec<String> {
    let sep_len = char_len(separator);
    let mut docs = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    let mut total = 0usize;

    for split in splits {
        let len = char_len(split);
        let adjustment = if current.is_empty() { 0 } else { sep_len };

        if total + len + adjustment > chunk_size && !current.is_empty() {
            docs.push(current.join(separator));
            // Drop leading splits until the carried-over tail fits the
            // overlap budget.
            while total > chunk_overlap
                || (total + len + if current.is_empty() { 0 } else { sep_len } > chunk_size
                    && total > 0)
            {
                let dropped = char_len(current.remove(0));
                total -= dropped + if current.is_empty() { 0 } else { sep_len };
            }
        }

        total += len + if current.is_empty() { 0 } else { sep_len };
        current.push(split);
    }

    if !current.is_empty() {
        docs.push(current.join(separator));
    }
    docs.into_iter().filter(|d| !d.trim().is_empty()).collect()
}

/// Page retrieval service
pub struct RagService {
    storage: Arc<Storage>,
    embedder: EmbeddingService,
    cache: Mutex<LruCache<String, Vec<f32>>>,
    settings: RagSettings,
}

impl RagService {
    pub fn new(storage: Arc<Storage>, settings: RagSettings) -> Self {
        let capacity =
            NonZeroUsize::new(EMBED_CACHE_CAPACITY).expect("cache capacity is non-zero");
        Self {
            storage,
            embedder: EmbeddingService::new(),
            cache: Mutex::new(LruCache::new(capacity)),
            settings,
        }
    }

    /// Embedding for one chunk: LRU first, then the database, then compute
    /// and store in both.
    fn embedding_for(&self, content: &str) -> Result<Vec<f32>> {
        let hash = chunk_hash(content);

        if let Ok(mut cache) = self.cache.lock() {
            if let Some(embedding) = cache.get(&hash) {
                return Ok(embedding.clone());
            }
        }

        let embedding = match self.storage.chunk_embedding(&hash)? {
            Some(stored) => {
                debug!(hash = &hash[..8], "chunk cache hit");
                stored
            }
            None => {
                let computed = self.embedder.embed(content);
                self.storage.insert_chunk(&hash, content, &computed)?;
                debug!(hash = &hash[..8], "chunk cache miss, stored");
                computed
            }
        };

        if let Ok(mut cache) = self.cache.lock() {
            cache.put(hash, embedding.clone());
        }
        Ok(embedding)
    }

    /// Full retrieval pipeline: split the page, rank chunks against the
    /// query, return the joined context plus the chunks it was built from
    /// (highest score first). The sources feed the overlay's highlighter.
    pub fn context_for(&self, page_text: &str, query: &str) -> Result<(String, Vec<String>)> {
        let chunks = split_text(
            page_text,
            self.settings.chunk_size,
            self.settings.chunk_overlap,
        );
        if chunks.is_empty() {
            return Ok((String::new(), Vec::new()));
        }
        debug!(chunks = chunks.len(), "page split for retrieval");

        let query_embedding = self.embedder.embed(query);
        let mut scored: Vec<(f32, String)> = Vec::with_capacity(chunks.len());
        for chunk in chunks {
            let embedding = self.embedding_for(&chunk)?;
            scored.push((cosine_similarity(&query_embedding, &embedding), chunk));
        }

        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
        let sources: Vec<String> = scored
            .into_iter()
            .take(self.settings.top_k)
            .map(|(_, chunk)| chunk)
            .collect();

        let context = sources.join("\n\n---\n\n");
        Ok((context, sources))
    }
}
