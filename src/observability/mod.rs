//! Observability subsystem.
//!
//! Structured logging goes through `tracing` at the call sites; this module
//! owns metric definitions and the optional Prometheus exporter.

pub mod metrics;
