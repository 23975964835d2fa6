//! HTTP server lifecycle

use std::{future::Future, io, net::SocketAddr};

use axum::Router;
use igsr_config::GatewayConfig;
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::{error::StartupError, routes::router, state::AppState};

/// Gateway bound to its configured address
pub struct GatewayServer {
    addr: SocketAddr,
    state: AppState,
}

impl GatewayServer {
    pub fn new(config: GatewayConfig) -> Result<Self, StartupError> {
        let addr = config.socket_addr();
        let state = AppState::new(config)?;
        Ok(Self { addr, state })
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Serve until Ctrl-C or SIGTERM
    pub async fn run(self) -> io::Result<()> {
        let listener = TcpListener::bind(self.addr).await?;
        info!(
            address = %listener.local_addr()?,
            resources = self.state.gateway.registry().len(),
            "starting IGSR API"
        );
        serve(listener, router(self.state), shutdown_signal()).await
    }
}

/// Serve `app` on `listener` until `shutdown` resolves, then drain.
pub async fn serve<F>(listener: TcpListener, app: Router, shutdown: F) -> io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;
    info!("IGSR API shutdown complete");
    Ok(())
}

/// Resolves on Ctrl-C, or SIGTERM on unix
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for shutdown signal: {}", err);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                warn!("Failed to listen for SIGTERM: {}", err);
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
    info!("Shutdown signal received, shutting down HTTP server");
}
