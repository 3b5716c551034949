use axum::Router;
use log::{error, info};
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;

use crate::config::ServerConfig;
use crate::error::ServerError;
use crate::protocol::router;
use crate::storage::Storage;

pub struct Server {
    listener: TcpListener,
    router: Router,
    config: ServerConfig,
}

impl Server {
    /// Prepares the storage root and binds the listener.
    pub async fn new(config: ServerConfig) -> Result<Self, ServerError> {
        let storage = Arc::new(Storage::from_config(&config));
        storage.ensure_root().await?;

        let addr = config
            .socket_addr()
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;

        let listener = match TcpListener::bind(addr).await {
            Ok(listener) => {
                info!("Server bound to {}", addr);
                listener
            }
            Err(e) => {
                error!("Failed to bind to {}: {}", addr, e);
                return Err(ServerError::Io(e));
            }
        };

        Ok(Self {
            listener,
            router: router(storage),
            config,
        })
    }

    /// The address actually bound, useful when the configured port is 0.
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Serves requests until Ctrl-C is received.
    pub async fn start(self) -> Result<(), ServerError> {
        info!(
            "Starting storage server on {} (root: {}, max upload {} MB)",
            self.local_addr()?,
            self.config.storage_root,
            self.config.max_upload_size_mb
        );

        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        info!("Server stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => {
            error!("Failed to listen for shutdown signal: {}", e);
            std::future::pending::<()>().await;
        }
    }
}
