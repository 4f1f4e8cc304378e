//! ElasticGaze RPC Server - JSON-RPC backend for the desktop shell.
//!
//! This binary provides a JSON-RPC 2.0 server that wraps esgaze-core for
//! communication with the desktop shell's main process.

mod handler;
mod server;

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "esgaze-rpc")]
#[command(about = "JSON-RPC server for ElasticGaze")]
struct Args {
    /// Port to listen on (0 = auto-assign)
    #[arg(short, long, default_value = "0")]
    port: u16,

    /// Host to bind to
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Application data directory (defaults to ./esgaze-data)
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Bundled editor asset directory (defaults to <data-dir>/editor-assets)
    #[arg(long)]
    assets_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Set up logging
    let log_level = if args.debug { Level::DEBUG } else { Level::INFO };
    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_thread_ids(false)
        .compact()
        .init();

    info!("Starting ElasticGaze RPC Server");

    let data_dir = match args.data_dir {
        Some(path) => path,
        None => std::env::current_dir()?.join("esgaze-data"),
    };
    let assets_dir = args
        .assets_dir
        .unwrap_or_else(|| data_dir.join("editor-assets"));

    info!("Data directory: {}", data_dir.display());

    // Create the editor service
    let service = esgaze_core::EditorService::open(&data_dir, &assets_dir)?;

    // Start warming the editor so it is usually ready by the time the UI
    // opens its first editor view.
    service.preloader().warm();

    // Start the server
    let addr = server::start_server(service, &args.host, args.port).await?;

    // Print port for the shell to read (intentional stdout for IPC)
    println!("RPC_PORT={}", addr.port());

    info!("RPC server running on {}", addr);

    // Wait for shutdown signal
    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received, exiting");

    Ok(())
}
