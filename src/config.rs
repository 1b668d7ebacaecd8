//! Layered configuration for the pagelens service
//!
//! Settings are assembled from (lowest to highest precedence) built-in
//! defaults, an optional TOML file, and `PAGELENS_`-prefixed environment
//! variables (`PAGELENS_SERVER__PORT=9090` overrides `server.port`). The
//! LLM API key is read from `GROQ_API_KEY` rather than the settings file so
//! it never needs to live on disk.

use crate::error::Result;
use serde::Deserialize;
use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

/// Top-level service settings
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Settings {
    pub server: ServerSettings,
    pub llm: LlmSettings,
    pub storage: StorageSettings,
    pub rag: RagSettings,
}

/// Bind address for the local API
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        // The overlay scripts hardcode this origin.
        Self {
            host: "127.0.0.1".to_string(),
            port: 8090,
        }
    }
}

impl ServerSettings {
    pub fn addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| {
                crate::error::PagelensError::Config(config::ConfigError::Message(format!(
                    "invalid server address: {}",
                    e
                )))
            })
    }
}

/// Chat-completions backend settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    pub api_base: String,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    /// Populated from GROQ_API_KEY; may stay empty, in which case chat
    /// endpoints report a configuration error at call time.
    #[serde(skip)]
    pub api_key: String,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            api_base: "https://api.groq.com/openai/v1".to_string(),
            model: "llama-3.1-8b-instant".to_string(),
            max_tokens: 1024,
            temperature: 0.7,
            api_key: String::new(),
        }
    }
}

/// Database location
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    pub db_path: PathBuf,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
        }
    }
}

/// Retrieval tuning for page and transcript chat
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RagSettings {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub top_k: usize,
}

impl Default for RagSettings {
    fn default() -> Self {
        Self {
            chunk_size: 500,
            chunk_overlap: 50,
            top_k: 3,
        }
    }
}

/// Default database path using the platform local-data directory
pub fn default_db_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("pagelens")
        .join("pagelens.db")
}

impl Settings {
    /// Load settings from an optional TOML file plus environment overrides.
    pub fn load(config_file: Option<&str>) -> Result<Self> {
        let mut builder = config::Config::builder();

        if let Some(path) = config_file {
            builder = builder.add_source(config::File::with_name(path));
        } else {
            builder = builder.add_source(config::File::with_name("pagelens").required(false));
        }

        let raw = builder
            .add_source(config::Environment::with_prefix("PAGELENS").separator("__"))
            .build()?;

        let mut settings: Settings = raw.try_deserialize()?;
        settings.llm.api_key = env::var("GROQ_API_KEY").unwrap_or_default();
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.server.port, 8090);
        assert_eq!(settings.rag.chunk_size, 500);
        assert_eq!(settings.rag.chunk_overlap, 50);
        assert_eq!(settings.llm.model, "llama-3.1-8b-instant");
    }

    #[test]
    fn test_addr_parses() {
        let settings = ServerSettings::default();
        let addr = settings.addr().unwrap();
        assert!(addr.ip().is_loopback());
        assert_eq!(addr.port(), 8090);
    }
}
