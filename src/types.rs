//! Core data structures shared across services and the API layer

use serde::{Deserialize, Serialize};

/// One entry of a video transcript, as delivered by the caption track
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TranscriptEntry {
    pub text: String,
    /// Seconds from the start of the video
    pub start: f64,
    pub duration: f64,
}

/// A group of consecutive transcript entries with a display timestamp
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TimedChunk {
    pub text: String,
    pub start_time: f64,
    pub end_time: f64,
    pub timestamp_label: String,
}

/// A timeline marker attached to a transcript-chat answer.
///
/// The overlay renders these as seekable chips below the message bubble.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Timeline {
    pub label: String,
    pub text: String,
    pub start_time: f64,
    pub end_time: f64,
    pub score: f64,
}

/// Product details scraped from a retail page
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ProductInfo {
    pub url: String,
    pub title: String,
    /// Raw price text as it appears on the page ("₹1,23,456", "$12.99")
    pub price: Option<String>,
    pub image: String,
}

/// Direction of the most recent price movement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Up,
    Down,
    Stable,
}

/// One recorded price observation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricePoint {
    pub price: f64,
    pub date: String,
}

/// Aggregated price history for a product URL
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceReport {
    pub success: bool,
    pub title: String,
    pub image_url: String,
    pub currency: String,
    pub current: f64,
    pub lowest: f64,
    pub highest: f64,
    pub average: f64,
    pub trend: Trend,
    pub data_points: usize,
    pub history: Vec<PricePoint>,
}

/// The page most recently loaded through `/load-url`; provides the default
/// chat context when the overlay does not send one.
#[derive(Debug, Clone)]
pub struct LoadedPage {
    pub url: String,
    pub title: Option<String>,
    pub text: String,
}
