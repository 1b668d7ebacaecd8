//! Content extraction from parsed pages

pub mod page;
pub mod product;

pub use page::{extract_title, page_text};
pub use product::extract_product;
