//! Local HTTP API consumed by the overlay

pub mod server;
pub mod state;

pub use server::{router, serve};
pub use state::AppState;
