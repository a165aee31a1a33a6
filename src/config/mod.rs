//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → CLI flags override individual fields (main.rs)
//!     → RelayConfig (immutable once the server is constructed)
//! ```
//!
//! # Design Decisions
//! - All fields have defaults so a bare `inline-relay` invocation works
//! - CLI flags win over file values

pub mod loader;
pub mod schema;

pub use loader::{load_config, ConfigError};
pub use schema::{ListenerConfig, ObservabilityConfig, RelayConfig, RelaySettings, TlsConfig};
