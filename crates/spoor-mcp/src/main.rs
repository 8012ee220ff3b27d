//! Spoor MCP Server - identifier detection and ingestion over stdio.
//!
//! # Configuration
//!
//! - `SPOOR_CONFIG` - Optional config file; otherwise `SPOOR_*` variables apply
//! - `SPOOR_DATA_DIR` - Optional, defaults to `~/.spoor`
//!
//! # Usage
//!
//! ```json
//! {
//!   "mcpServers": {
//!     "spoor": {
//!       "command": "/path/to/spoor-mcp"
//!     }
//!   }
//! }
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use rmcp::{transport::stdio, ServiceExt};
use spoor_ingest::{IngestionRouter, SpoorConfig};
use tokio::sync::Mutex;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use spoor_mcp::{JsonlSink, SpoorServer};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // stdout carries the MCP transport
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(false),
        )
        .with(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    tracing::info!("Starting Spoor MCP server");

    let router = initialize_router()?;
    let server = SpoorServer::new(Arc::new(Mutex::new(router)));

    let service = server.serve(stdio()).await.inspect_err(|e| {
        tracing::error!("Server error: {:?}", e);
    })?;

    tracing::info!("MCP server running on stdio");

    service.waiting().await?;
    Ok(())
}

/// Build the router from `SPOOR_CONFIG` or the environment and attach the
/// JSON Lines sink.
fn initialize_router() -> Result<IngestionRouter> {
    let config = match std::env::var("SPOOR_CONFIG") {
        Ok(path) => {
            tracing::info!("Loading configuration from {}", path);
            SpoorConfig::from_file(&path)?
        }
        Err(_) => SpoorConfig::from_env()?,
    };

    let data_dir = std::env::var("SPOOR_DATA_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".spoor")
        });
    std::fs::create_dir_all(&data_dir)?;

    let sink = JsonlSink::in_dir(&data_dir);
    tracing::info!(
        mode = %config.ingestion.mode,
        custom_patterns = config.custom_patterns.len(),
        "Records will be written to {}",
        sink.path().display()
    );

    let mut router = IngestionRouter::from_config(&config)?;
    router.on_ingest(sink);
    Ok(router)
}
