//! Streaming HTTP relay library.
//!
//! Fronts arbitrary third-party resources through a single trusted origin:
//! an inbound request names a target URL via the `url` or `base64Url` query
//! parameter, the relay fetches it (driving redirect following itself) and
//! streams the body back annotated with an inline `Content-Disposition`, so
//! browsers render the resource in place instead of offering a download.

pub mod config;
pub mod error;
pub mod http;
pub mod net;
pub mod observability;
pub mod relay;

pub use config::RelayConfig;
pub use error::RelayError;
pub use http::RelayServer;
pub use relay::RelayState;
