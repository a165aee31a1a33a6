//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router with the relay handler on every path
//! - Wire up middleware (tracing)
//! - Serve plaintext or TLS listeners
//! - Graceful shutdown on Ctrl+C

use std::net::SocketAddr;

use axum::routing::any;
use axum::Router;
use axum_server::tls_rustls::RustlsConfig;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::config::RelayConfig;
use crate::relay::{relay_handler, RelayState};

/// HTTP server for the relay.
pub struct RelayServer {
    router: Router,
    config: RelayConfig,
    state: RelayState,
}

impl RelayServer {
    /// Create a new relay server with the given configuration.
    pub fn new(config: RelayConfig) -> Result<Self, reqwest::Error> {
        let state = RelayState::new(config.relay.clone())?;
        let router = Self::build_router(state.clone());
        Ok(Self {
            router,
            config,
            state,
        })
    }

    /// Build the Axum router with all middleware layers.
    ///
    /// No request timeout layer here: a relayed transfer may legitimately
    /// run for a long time, and the stall watchdog already bounds the idle
    /// ones.
    fn build_router(state: RelayState) -> Router {
        Router::new()
            .route("/", any(relay_handler))
            .route("/{*path}", any(relay_handler))
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(TraceLayer::new_for_http())
                    .into_inner(),
            )
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &RelayConfig {
        &self.config
    }

    /// Get a reference to the shared relay state.
    pub fn state(&self) -> &RelayState {
        &self.state
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(self, listener: TcpListener) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Run the server over TLS on the given address.
    pub async fn run_tls(
        self,
        addr: SocketAddr,
        tls_config: RustlsConfig,
    ) -> Result<(), std::io::Error> {
        tracing::info!(address = %addr, "TLS HTTP server starting");

        axum_server::bind_rustls(addr, tls_config)
            .serve(self.router.into_make_service())
            .await?;

        tracing::info!("TLS HTTP server stopped");
        Ok(())
    }
}

/// Wait for shutdown signal (Ctrl+C).
async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install Ctrl+C handler");
    tracing::info!("Shutdown signal received");
}
