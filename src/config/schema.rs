//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the relay.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the relay server.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RelayConfig {
    /// Listener configuration (bind address, ports, TLS).
    pub listener: ListenerConfig,

    /// Relay pipeline settings.
    pub relay: RelaySettings,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Listen IP (e.g., "0.0.0.0").
    pub addr: String,

    /// Plaintext listen port.
    pub port: u16,

    /// TLS listen port, used when a certificate and key are configured.
    pub tls_port: u16,

    /// Optional TLS configuration. When present the server is served over
    /// TLS on `tls_port`; otherwise plaintext on `port`.
    pub tls: Option<TlsConfig>,
}

impl ListenerConfig {
    /// The plaintext `ip:port` pair to bind.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.addr, self.port)
    }

    /// The TLS `ip:port` pair to bind.
    pub fn tls_bind_address(&self) -> String {
        format!("{}:{}", self.addr, self.tls_port)
    }
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            addr: "0.0.0.0".to_string(),
            port: 8123,
            tls_port: 8124,
            tls: None,
        }
    }
}

/// TLS configuration for the listener.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TlsConfig {
    /// Path to certificate file (PEM).
    pub cert_path: String,

    /// Path to private key file (PEM).
    pub key_path: String,
}

/// Settings for the streaming relay pipeline.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RelaySettings {
    /// Watchdog interval in seconds. A transfer that moves zero bytes across
    /// one full interval is cancelled.
    pub stall_interval_secs: u64,

    /// Maximum redirect hops followed per dispatch.
    pub max_redirects: usize,

    /// Size of each pooled transfer buffer in bytes.
    pub buffer_size: usize,

    /// Live redirect-tracker entries above which a leak warning is logged.
    pub tracker_leak_threshold: usize,

    /// Outbound connection establishment timeout in seconds.
    pub connect_timeout_secs: u64,
}

impl Default for RelaySettings {
    fn default() -> Self {
        Self {
            stall_interval_secs: 30,
            max_redirects: 10,
            buffer_size: 8 * 1024,
            tracker_leak_threshold: 20,
            connect_timeout_secs: 10,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
