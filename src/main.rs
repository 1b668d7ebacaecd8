//! Pagelens - local AI page companion
//!
//! Runs the HTTP service behind the browser overlay (page chat, price
//! tracking, transcript chat) and exposes the anchoring engine and the
//! extractors as one-shot CLI commands for debugging against saved pages.

use anyhow::Context;
use clap::{Parser, Subcommand};
use pagelens_core::anchor::Highlighter;
use pagelens_core::api;
use pagelens_core::config::Settings;
use pagelens_core::extract::{extract_product, page_text};
use pagelens_core::storage::Storage;
use scraper::Html;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "pagelens", version, about = "Local AI page companion service")]
struct Cli {
    /// Database path (defaults to the platform local-data directory)
    #[arg(long, env = "PAGELENS_DB_PATH", global = true)]
    db: Option<PathBuf>,

    /// Log filter when RUST_LOG is unset
    #[arg(long, default_value = "pagelens=info,tower_http=warn", global = true)]
    log: String,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the local API service (the default)
    Serve {
        /// Settings file (TOML)
        #[arg(long)]
        config: Option<String>,
        /// Override the bind host
        #[arg(long)]
        host: Option<String>,
        /// Override the bind port
        #[arg(long)]
        port: Option<u16>,
    },
    /// Anchor a source snippet inside a saved HTML file
    Anchor {
        /// HTML file to search
        file: PathBuf,
        /// Source text to locate and mark
        #[arg(long)]
        text: String,
        /// Write the marked document here instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Extract visible text or product info from a saved HTML file
    Extract {
        /// HTML file to read
        file: PathBuf,
        /// Report product title/price/image instead of page text
        #[arg(long)]
        product: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log)),
        )
        .init();

    match cli.command.unwrap_or(Command::Serve {
        config: None,
        host: None,
        port: None,
    }) {
        Command::Serve { config, host, port } => {
            let mut settings = Settings::load(config.as_deref())?;
            if let Some(host) = host {
                settings.server.host = host;
            }
            if let Some(port) = port {
                settings.server.port = port;
            }
            if let Some(db) = cli.db {
                settings.storage.db_path = db;
            }

            let storage = Arc::new(
                Storage::open(&settings.storage.db_path)
                    .with_context(|| format!("opening {}", settings.storage.db_path.display()))?,
            );
            api::serve(settings, storage).await?;
        }

        Command::Anchor { file, text, out } => {
            let html = std::fs::read_to_string(&file)
                .with_context(|| format!("reading {}", file.display()))?;
            let mut engine = Highlighter::from_html(&html);

            if !engine.highlight(&text) {
                eprintln!("no match found");
                std::process::exit(1);
            }
            info!(markers = engine.marker_count(), "snippet anchored");

            match out {
                Some(path) => std::fs::write(&path, engine.html())
                    .with_context(|| format!("writing {}", path.display()))?,
                None => println!("{}", engine.html()),
            }
        }

        Command::Extract { file, product } => {
            let html = std::fs::read_to_string(&file)
                .with_context(|| format!("reading {}", file.display()))?;
            let doc = Html::parse_document(&html);
            if product {
                let info = extract_product(&doc, &format!("file://{}", file.display()));
                println!("{}", serde_json::to_string_pretty(&info)?);
            } else {
                println!("{}", page_text(&doc));
            }
        }
    }

    Ok(())
}
