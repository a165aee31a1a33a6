//! Streaming HTTP relay server.
//!
//! Accepts requests naming an arbitrary target URL, fetches the target, and
//! streams the response back annotated for inline display. Serves plaintext
//! by default; pass both `--cert` and `--key` to serve TLS instead.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use clap::Parser;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use inline_relay::config::{load_config, RelayConfig, TlsConfig};
use inline_relay::net::tls::load_tls_config;
use inline_relay::observability::metrics;
use inline_relay::RelayServer;

#[derive(Parser, Debug)]
#[command(name = "inline-relay")]
#[command(about = "HTTP relay that streams remote resources for inline display", version)]
struct Args {
    /// Path to a TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Server listen ip
    #[arg(long)]
    addr: Option<String>,

    /// Server listen port
    #[arg(long)]
    port: Option<u16>,

    /// Server listen port for TLS
    #[arg(long)]
    tls_port: Option<u16>,

    /// TLS certificate
    #[arg(long)]
    cert: Option<String>,

    /// TLS certificate private key
    #[arg(long)]
    key: Option<String>,
}

impl Args {
    /// Load the config file (or defaults) and apply flag overrides.
    fn into_config(self) -> Result<RelayConfig, Box<dyn std::error::Error>> {
        let mut config = match &self.config {
            Some(path) => load_config(path)?,
            None => RelayConfig::default(),
        };
        if let Some(addr) = self.addr {
            config.listener.addr = addr;
        }
        if let Some(port) = self.port {
            config.listener.port = port;
        }
        if let Some(tls_port) = self.tls_port {
            config.listener.tls_port = tls_port;
        }
        if let (Some(cert_path), Some(key_path)) = (self.cert, self.key) {
            config.listener.tls = Some(TlsConfig {
                cert_path,
                key_path,
            });
        }
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing subscriber
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "inline_relay=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("inline-relay v0.1.0 starting");

    let config = Args::parse().into_config()?;

    tracing::info!(
        bind_address = %config.listener.bind_address(),
        stall_interval_secs = config.relay.stall_interval_secs,
        max_redirects = config.relay.max_redirects,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        if let Ok(addr) = config.observability.metrics_address.parse() {
            metrics::init_metrics(addr);
        } else {
            tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            );
        }
    }

    // Fatal if either listener cannot bind; otherwise runs until terminated.
    if let Some(tls) = config.listener.tls.clone() {
        let addr: SocketAddr = config.listener.tls_bind_address().parse()?;
        let tls_config =
            load_tls_config(Path::new(&tls.cert_path), Path::new(&tls.key_path)).await?;
        tracing::info!("Starting TLS HTTP server");
        let server = RelayServer::new(config)?;
        server.run_tls(addr, tls_config).await?;
    } else {
        let listener = TcpListener::bind(config.listener.bind_address()).await?;
        tracing::info!("Starting HTTP server");
        let server = RelayServer::new(config)?;
        server.run(listener).await?;
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
