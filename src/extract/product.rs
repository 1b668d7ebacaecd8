//! Product info extraction for retail pages
//!
//! Selector cascades tuned for the big storefronts first (Amazon, Flipkart),
//! then progressively generic fallbacks, ending with a currency-pattern scan
//! over the whole page text. Best effort by design: a miss returns an empty
//! field, never an error.

use crate::types::ProductInfo;
use crate::utils::truncate_chars;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};

use super::page::{extract_title, page_text};

const TITLE_SELECTORS: [&str; 9] = [
    "#productTitle",
    ".B_NuCI",
    "h1.product-title",
    "h1[class*='title']",
    "h1[class*='product']",
    "h1[class*='name']",
    ".pdp-title",
    "#title",
    "h1",
];

const PRICE_SELECTORS: [&str; 9] = [
    ".a-price-whole",
    "#priceblock_ourprice",
    "#priceblock_dealprice",
    ".a-offscreen",
    "._30jeq3",
    "._16Jk6d",
    "[class*='price']",
    "[id*='price']",
    ".price",
];

const IMAGE_SELECTORS: [&str; 6] = [
    "#landingImage",
    "._396cs4",
    "img[class*='product']",
    "img[id*='product']",
    ".product-image img",
    "img[class*='main']",
];

/// Classes that mark struck-through previous prices rather than the offer.
const STALE_PRICE_MARKERS: [&str; 2] = ["was", "old"];

static HAS_DIGITS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\d,]+").expect("static regex"));
static HAS_CURRENCY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)[₹$€£]|rs\.?").expect("static regex"));
static PRICE_IN_TEXT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[₹$€£]\s*[\d,]+(\.\d{1,2})?").expect("static regex"));

/// Scrape product title, price text and image URL from a page.
pub fn extract_product(doc: &Html, url: &str) -> ProductInfo {
    ProductInfo {
        url: url.to_string(),
        title: product_title(doc),
        price: product_price(doc),
        image: product_image(doc),
    }
}

fn product_title(doc: &Html) -> String {
    for selector in TITLE_SELECTORS {
        let Ok(sel) = Selector::parse(selector) else {
            continue;
        };
        if let Some(el) = doc.select(&sel).next() {
            let text = el.text().collect::<String>().trim().to_string();
            if !text.is_empty() {
                return truncate_chars(&text, 200);
            }
        }
    }
    extract_title(doc)
        .map(|t| truncate_chars(&t, 200))
        .unwrap_or_default()
}

fn product_price(doc: &Html) -> Option<String> {
    for selector in PRICE_SELECTORS {
        let Ok(sel) = Selector::parse(selector) else {
            continue;
        };
        for el in doc.select(&sel) {
            if let Some(classes) = el.value().attr("class") {
                let lowered = classes.to_lowercase();
                if STALE_PRICE_MARKERS.iter().any(|m| lowered.contains(m)) {
                    continue;
                }
            }
            let text = el.text().collect::<String>().trim().to_string();
            if HAS_DIGITS.is_match(&text) && HAS_CURRENCY.is_match(&text) {
                let compact: String = text.split_whitespace().collect();
                return Some(truncate_chars(&compact, 30));
            }
        }
    }
    // Last resort: first currency-looking amount anywhere in the page text.
    PRICE_IN_TEXT
        .find(&page_text(doc))
        .map(|m| m.as_str().split_whitespace().collect())
}

fn product_image(doc: &Html) -> String {
    for selector in IMAGE_SELECTORS {
        let Ok(sel) = Selector::parse(selector) else {
            continue;
        };
        if let Some(src) = doc
            .select(&sel)
            .next()
            .and_then(|el| el.value().attr("src"))
        {
            if !src.is_empty() {
                return src.to_string();
            }
        }
    }
    String::new()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_amazon_style_page() {
        let doc = Html::parse_document(
            "<html><body>\
             <h1 id=\"productTitle\">  Noise Cancelling Headphones  </h1>\
             <span class=\"a-price-whole\">₹24,999</span>\
             <img id=\"landingImage\" src=\"https://img.example/p.jpg\">\
             </body></html>",
        );
        let info = extract_product(&doc, "https://example.com/p/1");
        assert_eq!(info.title, "Noise Cancelling Headphones");
        assert_eq!(info.price.as_deref(), Some("₹24,999"));
        assert_eq!(info.image, "https://img.example/p.jpg");
    }

    #[test]
    fn test_generic_price_class_skips_struck_prices() {
        let doc = Html::parse_document(
            "<html><body>\
             <span class=\"price was-price\">$99.99</span>\
             <span class=\"price\">$79.99</span>\
             </body></html>",
        );
        let info = extract_product(&doc, "https://example.com/p/2");
        assert_eq!(info.price.as_deref(), Some("$79.99"));
    }

    #[test]
    fn test_body_text_fallback() {
        let doc = Html::parse_document(
            "<html><body><p>Limited offer: only € 1,299.00 this week!</p></body></html>",
        );
        let info = extract_product(&doc, "https://example.com/p/3");
        assert_eq!(info.price.as_deref(), Some("€1,299.00"));
    }

    #[test]
    fn test_no_price_found() {
        let doc = Html::parse_document(
            "<html><head><title>A Plain Article</title></head><body><p>No commerce here.</p></body></html>",
        );
        let info = extract_product(&doc, "https://example.com/a");
        assert_eq!(info.price, None);
        assert_eq!(info.title, "A Plain Article");
    }
}
