//! YouTube transcript retrieval and timeline search
//!
//! Transcripts come from the public caption tracks: the watch page names the
//! available tracks, the track's timedtext URL (json3 flavor) delivers timed
//! entries. Entries are grouped into ~30-entry chunks, embedded, and cached
//! per video; questions are answered against the top-scoring chunks, whose
//! timestamps become seekable timeline markers in the overlay.

use crate::error::{PagelensError, Result};
use crate::services::embeddings::{cosine_similarity, EmbeddingService};
use crate::storage::Storage;
use crate::types::{TimedChunk, Timeline, TranscriptEntry};
use once_cell::sync::Lazy;
use regex::Regex;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use tracing::{debug, info, warn};

static VIDEO_ID_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:v=|/v/|youtu\.be/|/embed/|/shorts/)([A-Za-z0-9_-]{11})")
        .expect("static regex")
});

static CAPTION_TRACKS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""captionTracks":(\[.*?\])"#).expect("static regex"));

/// Transcript entries grouped per chunk
pub const CHUNK_ENTRIES: usize = 30;

/// Languages tried, in order, before falling back to the first track.
const PREFERRED_LANGUAGES: [&str; 2] = ["en", "hi"];

/// Extract the 11-character video id from any YouTube URL form.
pub fn extract_video_id(url: &str) -> Option<String> {
    VIDEO_ID_RE
        .captures(url)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Seconds to `MM:SS` or `H:MM:SS`.
pub fn format_timestamp(seconds: f64) -> String {
    let total = seconds.max(0.0) as u64;
    let h = total / 3600;
    let m = (total % 3600) / 60;
    let s = total % 60;
    if h > 0 {
        format!("{h}:{m:02}:{s:02}")
    } else {
        format!("{m}:{s:02}")
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Group transcript entries into timed chunks of ~`chunk_entries` entries.
pub fn build_timed_chunks(entries: &[TranscriptEntry], chunk_entries: usize) -> Vec<TimedChunk> {
    if entries.is_empty() || chunk_entries == 0 {
        return Vec::new();
    }

    entries
        .chunks(chunk_entries)
        .map(|group| {
            let text = group
                .iter()
                .map(|e| e.text.as_str())
                .collect::<Vec<_>>()
                .join(" ");
            let start_time = group[0].start;
            let last = &group[group.len() - 1];
            TimedChunk {
                text,
                start_time,
                end_time: last.start + last.duration,
                timestamp_label: format_timestamp(start_time),
            }
        })
        .collect()
}

/// Summary returned after a video's transcript is loaded
#[derive(Debug, Clone)]
pub struct VideoSummary {
    pub video_id: String,
    pub chunk_count: usize,
    pub total_duration: String,
}

/// Transcript service
pub struct TranscriptService {
    client: reqwest::Client,
    storage: Arc<Storage>,
    embedder: EmbeddingService,
    top_k: usize,
}

impl TranscriptService {
    pub fn new(storage: Arc<Storage>, top_k: usize) -> Self {
        Self {
            client: reqwest::Client::new(),
            storage,
            embedder: EmbeddingService::new(),
            top_k,
        }
    }

    /// Load a video's transcript into the chunk store. Already-loaded videos
    /// are reused without refetching.
    pub async fn load_video(&self, url: &str) -> Result<VideoSummary> {
        let video_id = extract_video_id(url)
            .ok_or_else(|| PagelensError::InvalidUrl(format!("not a YouTube URL: {url}")))?;

        let existing = self.storage.video_chunks(&video_id)?;
        if !existing.is_empty() {
            info!(video_id = %video_id, "transcript already cached");
            let total = existing
                .iter()
                .map(|(c, _)| c.end_time)
                .fold(0.0, f64::max);
            return Ok(VideoSummary {
                video_id,
                chunk_count: existing.len(),
                total_duration: format_timestamp(total),
            });
        }

        let entries = self.fetch_transcript(&video_id).await?;
        let chunks = build_timed_chunks(&entries, CHUNK_ENTRIES);
        if chunks.is_empty() {
            return Err(PagelensError::TranscriptUnavailable(format!(
                "empty transcript for {video_id}"
            )));
        }

        for chunk in &chunks {
            let hash = chunk_key(&video_id, chunk.start_time);
            let embedding = self.embedder.embed(&chunk.text);
            self.storage
                .insert_video_chunk(&hash, &video_id, chunk, &embedding)?;
        }

        let total = chunks.iter().map(|c| c.end_time).fold(0.0, f64::max);
        info!(video_id = %video_id, chunks = chunks.len(), "transcript loaded");
        Ok(VideoSummary {
            video_id,
            chunk_count: chunks.len(),
            total_duration: format_timestamp(total),
        })
    }

    /// Top-scoring transcript chunks for a question, as timeline markers.
    pub fn query(&self, video_id: &str, question: &str) -> Result<Vec<Timeline>> {
        let chunks = self.storage.video_chunks(video_id)?;
        if chunks.is_empty() {
            return Err(PagelensError::NotFound(format!(
                "transcript not loaded for {video_id}"
            )));
        }

        let query_embedding = self.embedder.embed(question);
        let mut scored: Vec<(f32, &TimedChunk)> = chunks
            .iter()
            .map(|(chunk, embedding)| (cosine_similarity(&query_embedding, embedding), chunk))
            .collect();
        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));

        Ok(scored
            .into_iter()
            .take(self.top_k)
            .map(|(score, chunk)| Timeline {
                label: chunk.timestamp_label.clone(),
                text: chunk.text.clone(),
                start_time: chunk.start_time,
                end_time: chunk.end_time,
                score: (score as f64 * 1000.0).round() / 1000.0,
            })
            .collect())
    }

    /// Fetch the transcript through the caption track named on the watch
    /// page.
    pub async fn fetch_transcript(&self, video_id: &str) -> Result<Vec<TranscriptEntry>> {
        let watch_url = format!("https://www.youtube.com/watch?v={video_id}");
        let page = self.client.get(&watch_url).send().await?.text().await?;

        let tracks_json = CAPTION_TRACKS_RE
            .captures(&page)
            .and_then(|caps| caps.get(1))
            .ok_or_else(|| {
                PagelensError::TranscriptUnavailable(format!(
                    "no caption tracks on watch page for {video_id}"
                ))
            })?;

        let tracks: serde_json::Value = serde_json::from_str(tracks_json.as_str())?;
        let tracks = tracks.as_array().cloned().unwrap_or_default();
        if tracks.is_empty() {
            return Err(PagelensError::TranscriptUnavailable(format!(
                "caption track list empty for {video_id}"
            )));
        }

        let track = PREFERRED_LANGUAGES
            .iter()
            .find_map(|lang| {
                tracks
                    .iter()
                    .find(|t| t["languageCode"].as_str() == Some(lang))
            })
            .or_else(|| tracks.first())
            .cloned()
            .unwrap_or_default();

        let base_url = track["baseUrl"].as_str().ok_or_else(|| {
            PagelensError::TranscriptUnavailable(format!("caption track without URL for {video_id}"))
        })?;

        debug!(video_id = %video_id, lang = ?track["languageCode"].as_str(), "fetching timedtext");
        let timedtext_url = format!("{base_url}&fmt=json3");
        let payload: serde_json::Value =
            self.client.get(&timedtext_url).send().await?.json().await?;

        let entries = parse_json3_events(&payload);
        if entries.is_empty() {
            warn!(video_id = %video_id, "timedtext payload had no usable events");
            return Err(PagelensError::TranscriptUnavailable(format!(
                "no transcript entries for {video_id}"
            )));
        }
        Ok(entries)
    }
}

fn chunk_key(video_id: &str, start_time: f64) -> String {
    format!("{:x}", Sha256::digest(format!("{video_id}:{start_time}").as_bytes()))
}

fn parse_json3_events(payload: &serde_json::Value) -> Vec<TranscriptEntry> {
    let Some(events) = payload["events"].as_array() else {
        return Vec::new();
    };

    let mut entries = Vec::new();
    for event in events {
        let text: String = event["segs"]
            .as_array()
            .map(|segs| {
                segs.iter()
                    .filter_map(|seg| seg["utf8"].as_str())
                    .collect::<String>()
            })
            .unwrap_or_default();
        let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
        if text.is_empty() {
            continue;
        }

        let start = event["tStartMs"].as_f64().unwrap_or(0.0) / 1000.0;
        let duration = event["dDurationMs"].as_f64().unwrap_or(0.0) / 1000.0;
        entries.push(TranscriptEntry {
            text,
            start: round2(start),
            duration: round2(duration),
        });
    }
    entries
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_video_id_url_forms() {
        let id = "dQw4w9WgXcQ";
        for url in [
            "https://www.youtube.com/watch?v=dQw4w9WgXcQ",
            "https://youtu.be/dQw4w9WgXcQ",
            "https://www.youtube.com/embed/dQw4w9WgXcQ?autoplay=1",
            "https://www.youtube.com/shorts/dQw4w9WgXcQ",
            "https://www.youtube.com/v/dQw4w9WgXcQ",
        ] {
            assert_eq!(extract_video_id(url).as_deref(), Some(id), "failed: {url}");
        }
        assert_eq!(extract_video_id("https://example.com/page"), None);
    }

    #[test]
    fn test_format_timestamp() {
        assert_eq!(format_timestamp(0.0), "0:00");
        assert_eq!(format_timestamp(65.4), "1:05");
        assert_eq!(format_timestamp(3600.0), "1:00:00");
        assert_eq!(format_timestamp(3725.0), "1:02:05");
    }

    #[test]
    fn test_build_timed_chunks_groups_entries() {
        let entries: Vec<TranscriptEntry> = (0..70)
            .map(|i| TranscriptEntry {
                text: format!("segment {i}"),
                start: i as f64 * 2.0,
                duration: 2.0,
            })
            .collect();

        let chunks = build_timed_chunks(&entries, CHUNK_ENTRIES);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].start_time, 0.0);
        assert_eq!(chunks[0].end_time, 60.0);
        assert_eq!(chunks[0].timestamp_label, "0:00");
        assert_eq!(chunks[1].timestamp_label, "1:00");
        assert!(chunks[0].text.starts_with("segment 0 segment 1"));
        // Final partial group keeps its own bounds.
        assert_eq!(chunks[2].start_time, 120.0);
        assert_eq!(chunks[2].end_time, 140.0);
    }

    #[test]
    fn test_build_timed_chunks_empty() {
        assert!(build_timed_chunks(&[], CHUNK_ENTRIES).is_empty());
    }

    #[test]
    fn test_parse_json3_events() {
        let payload = serde_json::json!({
            "events": [
                { "tStartMs": 0, "dDurationMs": 1500, "segs": [{ "utf8": "hello " }, { "utf8": "world" }] },
                { "tStartMs": 1500, "dDurationMs": 900, "segs": [{ "utf8": "\n" }] },
                { "tStartMs": 2400, "dDurationMs": 1200, "segs": [{ "utf8": "again" }] }
            ]
        });
        let entries = parse_json3_events(&payload);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].text, "hello world");
        assert_eq!(entries[0].start, 0.0);
        assert_eq!(entries[0].duration, 1.5);
        assert_eq!(entries[1].start, 2.4);
    }

    #[test]
    fn test_query_ranks_matching_chunk_first() {
        let storage = Arc::new(Storage::open_in_memory().unwrap());
        let service = TranscriptService::new(storage.clone(), 2);
        let embedder = EmbeddingService::new();

        let chunks = [
            TimedChunk {
                text: "introduction and channel housekeeping".to_string(),
                start_time: 0.0,
                end_time: 60.0,
                timestamp_label: "0:00".to_string(),
            },
            TimedChunk {
                text: "benchmark results comparing rust and go performance".to_string(),
                start_time: 60.0,
                end_time: 120.0,
                timestamp_label: "1:00".to_string(),
            },
        ];
        for chunk in &chunks {
            let embedding = embedder.embed(&chunk.text);
            storage
                .insert_video_chunk(
                    &chunk_key("abcdefghijk", chunk.start_time),
                    "abcdefghijk",
                    chunk,
                    &embedding,
                )
                .unwrap();
        }

        let timelines = service
            .query("abcdefghijk", "what were the rust benchmark results")
            .unwrap();
        assert_eq!(timelines.len(), 2);
        assert_eq!(timelines[0].label, "1:00");
        assert!(timelines[0].score >= timelines[1].score);
    }

    #[test]
    fn test_query_unloaded_video_is_not_found() {
        let storage = Arc::new(Storage::open_in_memory().unwrap());
        let service = TranscriptService::new(storage, 3);
        assert!(matches!(
            service.query("notloaded01", "anything"),
            Err(PagelensError::NotFound(_))
        ));
    }
}
