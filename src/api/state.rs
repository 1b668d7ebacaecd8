//! Shared state for the API server

use crate::config::Settings;
use crate::services::{LlmService, PriceService, RagService, TranscriptService};
use crate::storage::Storage;
use crate::types::LoadedPage;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Everything the handlers need, cheaply cloneable
#[derive(Clone)]
pub struct AppState {
    pub llm: Arc<LlmService>,
    pub rag: Arc<RagService>,
    pub price: Arc<PriceService>,
    pub transcript: Arc<TranscriptService>,
    /// Client for page fetches on `/load-url`
    pub http: reqwest::Client,
    /// Page most recently loaded through `/load-url`; the default chat
    /// context when the overlay sends none
    pub page: Arc<RwLock<Option<LoadedPage>>>,
}

impl AppState {
    pub fn new(settings: &Settings, storage: Arc<Storage>) -> Self {
        Self {
            llm: Arc::new(LlmService::new(settings.llm.clone())),
            rag: Arc::new(RagService::new(storage.clone(), settings.rag.clone())),
            price: Arc::new(PriceService::new(storage.clone())),
            transcript: Arc::new(TranscriptService::new(storage, settings.rag.top_k)),
            http: reqwest::Client::new(),
            page: Arc::new(RwLock::new(None)),
        }
    }
}
