//! # Kiosk MCP Server
//!
//! Model Context Protocol server that lets a kiosk shell or an automation
//! agent drive one terminal's usage session.
//!
//! ## Overview
//!
//! This server provides MCP tools for:
//! - Identity (sign in, sign out)
//! - Session lifecycle (start, end, status)
//! - Activity (record input events, log actions, reset the timer)
//! - Reporting (dashboard counts)
//!
//! ## Architecture
//!
//! This is Layer 2 - the service binary that ties together:
//! - kiosk-core: Core types and configuration
//! - kiosk-session: Session lifecycle, timer and stores
//!
//! ## Usage
//!
//! ```text
//! kiosk-mcp [--config <path>]
//! ```
//!
//! `KIOSK_ID` overrides the configured kiosk id; `RUST_LOG` overrides the
//! configured log level.

use std::sync::Arc;

use anyhow::Context;
use rmcp::{transport::stdio, ServiceExt};

use kiosk_core::{BackendKind, KioskConfig};
use kiosk_mcp::{shutdown_manager, KioskMcpServer};
use kiosk_session::{
    KioskManagerConfig, KioskSessionManager, MemoryStore, RestStore, SharedStore, StaticIdentity,
};

fn config_path(args: &[String]) -> anyhow::Result<Option<&str>> {
    match args.iter().position(|arg| arg == "--config") {
        Some(i) => args
            .get(i + 1)
            .map(|p| Some(p.as_str()))
            .context("--config requires a path"),
        None => Ok(None),
    }
}

fn load_config(args: &[String]) -> anyhow::Result<KioskConfig> {
    let mut config = match config_path(args)? {
        Some(path) => KioskConfig::from_file(path)
            .with_context(|| format!("Failed to load config from {path}"))?,
        None => KioskConfig::default(),
    };

    if let Ok(kiosk_id) = std::env::var("KIOSK_ID") {
        config.kiosk.kiosk_id = Some(kiosk_id);
    }
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

fn build_store(config: &KioskConfig) -> anyhow::Result<SharedStore> {
    Ok(match config.backend.kind {
        BackendKind::Memory => Arc::new(MemoryStore::new()),
        BackendKind::Rest => Arc::new(RestStore::from_settings(&config.backend)?),
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse command line arguments
    let args: Vec<String> = std::env::args().collect();
    let config = load_config(&args)?;

    // Initialize logging
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.kiosk.log_level)),
        )
        .init();

    let kiosk_id = config.kiosk.kiosk_id()?;
    tracing::info!(
        "Kiosk MCP Server v{} starting: kiosk_id={}, backend={:?}",
        env!("CARGO_PKG_VERSION"),
        kiosk_id.as_ref().map_or("default", |id| id.as_str()),
        config.backend.kind
    );

    let store = build_store(&config)?;
    let identity = StaticIdentity::anonymous();
    let manager = Arc::new(KioskSessionManager::with_config(
        store,
        Arc::new(identity.clone()),
        KioskManagerConfig { kiosk_id },
    ));

    let server = KioskMcpServer::new(Arc::clone(&manager), identity);

    tracing::info!("Server initialized, starting stdio transport...");

    // Serve the MCP server over stdio
    let service = server.serve(stdio()).await.map_err(|e| {
        tracing::error!("Error starting server: {}", e);
        e
    })?;

    tracing::info!("Kiosk MCP Server running on stdio");

    // Wait for the service to complete
    service.waiting().await?;

    tracing::info!("Kiosk MCP Server shutting down");

    shutdown_manager(manager).await;

    Ok(())
}
