//! HTTP server with graceful shutdown.

use tokio::net::TcpListener;
use tokio::signal;

use drivedesk_common::Result;
use drivedesk_storage::FileManager;

use crate::config::ServerConfig;
use crate::router::build_router;
use crate::state::AppState;

/// DriveDesk web server.
pub struct WebServer {
    config: ServerConfig,
    state: AppState,
}

impl WebServer {
    pub fn new(config: ServerConfig, files: FileManager) -> Self {
        Self {
            config,
            state: AppState::new(files),
        }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Build the router (useful for testing).
    pub fn router(&self) -> axum::Router {
        build_router(self.state.clone(), &self.config)
    }

    /// Serve until Ctrl+C or SIGTERM.
    pub async fn serve(self) -> Result<()> {
        let app = self.router();
        let listener = TcpListener::bind(self.config.bind_addr).await?;
        tracing::info!(
            backend = self.state.backend(),
            "DriveDesk listening on http://{}",
            listener.local_addr()?
        );

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;
        tracing::info!("Server stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutting down...");
}
