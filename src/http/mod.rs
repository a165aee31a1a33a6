//! HTTP server setup.
//!
//! # Data Flow
//! ```text
//! TCP/TLS connection
//!     → server.rs (Axum setup, middleware, graceful shutdown)
//!     → relay::handler (any method, any path)
//! ```

pub mod server;

pub use server::RelayServer;
