//! kvbridge MCP Server
//!
//! Serves Redis commands as MCP tools over stdio.

#![warn(clippy::all)]
#![forbid(unsafe_code)]

use anyhow::Result;
use clap::Parser;
use kvbridge_mcp::config::{Cli, ServerConfig};
use kvbridge_mcp::lifecycle;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    let config = ServerConfig::load(&cli)?;

    // stdout carries the MCP transport, so logs go to stderr
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "Starting kvbridge-mcp");
    let shutdown = lifecycle::run(&config).await?;
    tracing::info!(?shutdown, "kvbridge-mcp stopped");

    Ok(ExitCode::from(shutdown.exit_code()))
}
