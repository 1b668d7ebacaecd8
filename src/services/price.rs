//! Price tracking
//!
//! Product URLs are normalized (tracking params dropped, path kept) so the
//! same product accumulates one history. Raw price strings from the page
//! ("₹1,23,456", "$12.99") are parsed to numbers, the currency symbol kept
//! separately. Repeat observations within an hour are deduplicated.

use crate::error::{PagelensError, Result};
use crate::storage::{PriceRow, Storage};
use crate::types::{PricePoint, PriceReport, Trend};
use chrono::{Duration, Utc};
use std::sync::Arc;
use tracing::debug;
use url::Url;

/// Observations within this window count as the same data point.
const DEDUPE_WINDOW_HOURS: i64 = 1;

/// Strip query and fragment, keeping only product-identifying URL parts.
pub fn normalize_url(raw: &str) -> Result<String> {
    let parsed = Url::parse(raw)?;
    let host = parsed
        .host_str()
        .ok_or_else(|| PagelensError::InvalidUrl(format!("no host in {raw}")))?;
    let clean = format!("{}://{}{}", parsed.scheme(), host, parsed.path());
    Ok(clean.trim_end_matches('/').to_string())
}

/// Extract a numeric price from page text like "₹1,23,456" or "$12.99".
pub fn parse_price(price_str: &str) -> Option<f64> {
    if price_str.is_empty() {
        return None;
    }
    let cleaned: String = price_str
        .replace(',', "")
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    cleaned
        .trim_start_matches('.')
        .parse::<f64>()
        .ok()
        .filter(|p| *p > 0.0)
}

/// Currency symbol carried by a raw price string.
pub fn detect_currency(price_str: &str) -> &'static str {
    if price_str.contains('₹') {
        "₹"
    } else if price_str.contains('$') {
        "$"
    } else if price_str.contains('€') {
        "€"
    } else if price_str.contains('£') {
        "£"
    } else {
        "₹"
    }
}

/// Price history service
pub struct PriceService {
    storage: Arc<Storage>,
}

impl PriceService {
    pub fn new(storage: Arc<Storage>) -> Self {
        Self { storage }
    }

    /// Record one observation and return the updated history.
    pub fn record(
        &self,
        url: &str,
        title: &str,
        price_str: &str,
        image_url: &str,
    ) -> Result<PriceReport> {
        let price = parse_price(price_str)
            .ok_or_else(|| PagelensError::Other("Could not parse price".to_string()))?;
        let currency = detect_currency(price_str);
        let clean_url = normalize_url(url)?;
        let domain = Url::parse(url)?
            .host_str()
            .unwrap_or_default()
            .to_string();

        let window_start = Utc::now() - Duration::hours(DEDUPE_WINDOW_HOURS);
        if self.storage.price_recorded_since(&clean_url, window_start)? {
            debug!(url = %clean_url, "observation within dedupe window, skipped");
        } else {
            self.storage
                .insert_price(&clean_url, &domain, title, price, currency, image_url)?;
        }

        self.report_for(&clean_url)
    }

    /// History and stats for a product URL.
    pub fn history(&self, url: &str) -> Result<PriceReport> {
        self.report_for(&normalize_url(url)?)
    }

    fn report_for(&self, clean_url: &str) -> Result<PriceReport> {
        let rows = self.storage.price_rows(clean_url)?;
        build_report(&rows).ok_or_else(|| {
            PagelensError::NotFound("No price history found for this product.".to_string())
        })
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn build_report(rows: &[PriceRow]) -> Option<PriceReport> {
    let last = rows.last()?;
    let prices: Vec<f64> = rows.iter().map(|r| r.price).collect();

    let current = *prices.last()?;
    let lowest = prices.iter().copied().fold(f64::INFINITY, f64::min);
    let highest = prices.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let average = round2(prices.iter().sum::<f64>() / prices.len() as f64);

    let trend = if prices.len() >= 2 {
        let diff = prices[prices.len() - 1] - prices[prices.len() - 2];
        if diff > 0.0 {
            Trend::Up
        } else if diff < 0.0 {
            Trend::Down
        } else {
            Trend::Stable
        }
    } else {
        Trend::Stable
    };

    Some(PriceReport {
        success: true,
        title: last.title.clone().unwrap_or_default(),
        image_url: last.image_url.clone().unwrap_or_default(),
        currency: last.currency.clone(),
        current,
        lowest,
        highest,
        average,
        trend,
        data_points: rows.len(),
        history: rows
            .iter()
            .map(|r| PricePoint {
                price: r.price,
                date: r.recorded_at.clone(),
            })
            .collect(),
    })
}
