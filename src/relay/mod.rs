//! Streaming relay subsystem.
//!
//! # Data Flow
//! ```text
//! inbound request
//!     → target.rs   (resolve target URL, derive inline filename)
//!     → dispatch.rs (issue outbound request, follow redirects up to the
//!                    cap, record hops in tracker.rs)
//!     → handler.rs  (mirror status and headers, force inline disposition)
//!     → stream.rs   (copy the body through a buffer from buffer.rs)
//!     → watchdog.rs (cancel the copy when an interval passes with no
//!                    progress)
//! ```

pub mod buffer;
pub mod dispatch;
pub mod handler;
pub mod stream;
pub mod target;
pub mod tracker;
pub mod watchdog;

use std::sync::Arc;
use std::time::Duration;

pub use buffer::BufferPool;
pub use handler::relay_handler;
pub use tracker::{RedirectTracker, RelayId};

use crate::config::RelaySettings;

/// Shared services for relay request handling.
///
/// Constructed once at startup and injected into every handler invocation
/// through axum state; nothing here is a free-standing global.
#[derive(Clone)]
pub struct RelayState {
    /// Outbound HTTP client. Redirect following is disabled; dispatch.rs
    /// drives the chain itself so the final URL is always known.
    pub client: reqwest::Client,
    pub tracker: Arc<RedirectTracker>,
    pub buffers: Arc<BufferPool>,
    pub settings: RelaySettings,
}

impl RelayState {
    pub fn new(settings: RelaySettings) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .connect_timeout(Duration::from_secs(settings.connect_timeout_secs))
            .build()?;
        Ok(Self {
            client,
            tracker: Arc::new(RedirectTracker::new(settings.tracker_leak_threshold)),
            buffers: Arc::new(BufferPool::new(settings.buffer_size)),
            settings,
        })
    }
}
