//! Network-level concerns: TLS certificate loading for the listener.

pub mod tls;
