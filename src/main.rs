//! Cloud Storage Server - Entry Point
//!
//! Serves a sandboxed file tree over HTTP for the desktop file explorer.

use env_logger::Env;
use log::{error, info};

use cloud_storage_server::{Server, ServerConfig};

#[tokio::main]
async fn main() {
    // RUST_LOG overrides the default filter
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    info!("Launching storage server...");

    let config = match ServerConfig::load() {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    let server = match Server::new(config).await {
        Ok(server) => server,
        Err(e) => {
            error!("Server startup failed: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = server.start().await {
        error!("Server error: {}", e);
        std::process::exit(1);
    }
}
