//! Persistence layer

pub mod sqlite;

pub use sqlite::{PriceRow, Storage};
