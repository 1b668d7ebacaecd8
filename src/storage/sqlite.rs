//! SQLite persistence
//!
//! Three small tables behind one bundled-SQLite connection: the page-chunk
//! embedding cache, per-video transcript chunks, and price history.
//! Embeddings are stored as little-endian f32 blobs.

use crate::error::{PagelensError, Result};
use crate::types::TimedChunk;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS chunks (
    hash        TEXT PRIMARY KEY,
    content     TEXT NOT NULL,
    embedding   BLOB NOT NULL,
    created_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS video_chunks (
    hash        TEXT PRIMARY KEY,
    video_id    TEXT NOT NULL,
    text        TEXT NOT NULL,
    start_time  REAL NOT NULL,
    end_time    REAL NOT NULL,
    ts_label    TEXT NOT NULL,
    embedding   BLOB NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_video_chunks_vid ON video_chunks(video_id);

CREATE TABLE IF NOT EXISTS price_history (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    url         TEXT NOT NULL,
    domain      TEXT NOT NULL,
    title       TEXT,
    price       REAL NOT NULL,
    currency    TEXT NOT NULL,
    image_url   TEXT,
    recorded_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_price_history_url ON price_history(url);
";

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One stored price observation, oldest-first when listed
#[derive(Debug, Clone)]
pub struct PriceRow {
    pub price: f64,
    pub currency: String,
    pub title: Option<String>,
    pub image_url: Option<String>,
    pub recorded_at: String,
}

/// SQLite-backed storage
pub struct Storage {
    conn: Mutex<Connection>,
}

impl Storage {
    /// Open (creating if missing) the database at `path`.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        info!("Opening database at {}", path.display());
        let conn = Connection::open(path)?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// In-memory database, for tests and one-shot CLI runs.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| PagelensError::Other("storage connection poisoned".to_string()))
    }

    // ── Page chunk cache ────────────────────────────────────────────

    pub fn chunk_embedding(&self, hash: &str) -> Result<Option<Vec<f32>>> {
        let conn = self.conn()?;
        let blob: Option<Vec<u8>> = conn
            .query_row(
                "SELECT embedding FROM chunks WHERE hash = ?1",
                params![hash],
                |row| row.get(0),
            )
            .optional()?;
        blob.map(|b| deserialize_embedding(&b)).transpose()
    }

    pub fn insert_chunk(&self, hash: &str, content: &str, embedding: &[f32]) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT OR IGNORE INTO chunks (hash, content, embedding, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                hash,
                content,
                serialize_embedding(embedding),
                Utc::now().format(TIME_FORMAT).to_string()
            ],
        )?;
        debug!(hash = &hash[..8.min(hash.len())], "chunk stored");
        Ok(())
    }

    // ── Video transcript chunks ─────────────────────────────────────

    pub fn video_chunk_count(&self, video_id: &str) -> Result<usize> {
        let conn = self.conn()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM video_chunks WHERE video_id = ?1",
            params![video_id],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    pub fn insert_video_chunk(
        &self,
        hash: &str,
        video_id: &str,
        chunk: &TimedChunk,
        embedding: &[f32],
    ) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT OR IGNORE INTO video_chunks
               (hash, video_id, text, start_time, end_time, ts_label, embedding)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                hash,
                video_id,
                chunk.text,
                chunk.start_time,
                chunk.end_time,
                chunk.timestamp_label,
                serialize_embedding(embedding)
            ],
        )?;
        Ok(())
    }

    pub fn video_chunks(&self, video_id: &str) -> Result<Vec<(TimedChunk, Vec<f32>)>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT text, start_time, end_time, ts_label, embedding
             FROM video_chunks WHERE video_id = ?1 ORDER BY start_time ASC",
        )?;
        let rows = stmt.query_map(params![video_id], |row| {
            Ok((
                TimedChunk {
                    text: row.get(0)?,
                    start_time: row.get(1)?,
                    end_time: row.get(2)?,
                    timestamp_label: row.get(3)?,
                },
                row.get::<_, Vec<u8>>(4)?,
            ))
        })?;

        let mut chunks = Vec::new();
        for row in rows {
            let (chunk, blob) = row?;
            chunks.push((chunk, deserialize_embedding(&blob)?));
        }
        Ok(chunks)
    }

    // ── Price history ───────────────────────────────────────────────

    pub fn price_recorded_since(&self, url: &str, since: DateTime<Utc>) -> Result<bool> {
        let conn = self.conn()?;
        let found: Option<i64> = conn
            .query_row(
                "SELECT id FROM price_history WHERE url = ?1 AND recorded_at > ?2 LIMIT 1",
                params![url, since.format(TIME_FORMAT).to_string()],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    #[allow(clippy::too_many_arguments)]
    pub fn insert_price(
        &self,
        url: &str,
        domain: &str,
        title: &str,
        price: f64,
        currency: &str,
        image_url: &str,
    ) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO price_history (url, domain, title, price, currency, image_url, recorded_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                url,
                domain,
                title,
                price,
                currency,
                image_url,
                Utc::now().format(TIME_FORMAT).to_string()
            ],
        )?;
        Ok(())
    }

    pub fn price_rows(&self, url: &str) -> Result<Vec<PriceRow>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT price, currency, title, image_url, recorded_at
             FROM price_history WHERE url = ?1 ORDER BY recorded_at ASC, id ASC",
        )?;
        let rows = stmt.query_map(params![url], |row| {
            Ok(PriceRow {
                price: row.get(0)?,
                currency: row.get(1)?,
                title: row.get(2)?,
                image_url: row.get(3)?,
                recorded_at: row.get(4)?,
            })
        })?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Into::into)
    }
}

/// Serialize f32 vector to little-endian bytes
fn serialize_embedding(embedding: &[f32]) -> Vec<u8> {
    embedding.iter().flat_map(|f| f.to_le_bytes()).collect()
}

/// Deserialize little-endian bytes to f32 vector
fn deserialize_embedding(bytes: &[u8]) -> Result<Vec<f32>> {
    if bytes.len() % 4 != 0 {
        return Err(PagelensError::Other(
            "invalid embedding byte length".to_string(),
        ));
    }
    Ok(bytes
        .chunks_exact(4)
        .map(|chunk| {
            let mut arr = [0u8; 4];
            arr.copy_from_slice(chunk);
            f32::from_le_bytes(arr)
        })
        .collect())
}
