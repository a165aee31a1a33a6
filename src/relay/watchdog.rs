//! Stall detection for in-flight transfers.
//!
//! # Responsibilities
//! - Sample the relay's progress counter on a fixed interval
//! - Cancel the transfer when a full interval passes with zero bytes moved
//! - Stand down as soon as the relay reports completion
//!
//! # Design Decisions
//! - Cancellation is cooperative: the copy loop polls the flag between
//!   reads and writes. A read that never returns is not interrupted.
//! - The flag is also awaitable so the client-facing body stream can end
//!   promptly once the watchdog fires.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{oneshot, Notify};
use tokio::time;

use crate::observability::metrics;

/// Bytes moved since the watchdog last sampled.
///
/// Incremented by the relay copy loop, read-and-zeroed by the watchdog.
#[derive(Default)]
pub struct ProgressCounter(AtomicU64);

impl ProgressCounter {
    pub fn add(&self, bytes: u64) {
        self.0.fetch_add(bytes, Ordering::Relaxed);
    }

    /// Atomically read and reset the counter.
    pub fn take(&self) -> u64 {
        self.0.swap(0, Ordering::Relaxed)
    }
}

/// One-way cancellation signal shared between the watchdog and the relay
/// copy loop. Set once, never reset.
#[derive(Default)]
pub struct CancelFlag {
    cancelled: AtomicBool,
    notify: Notify,
}

impl CancelFlag {
    pub fn cancel(&self) {
        if !self.cancelled.swap(true, Ordering::SeqCst) {
            self.notify.notify_waiters();
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Resolve once the flag has been set.
    pub async fn cancelled(&self) {
        while !self.is_cancelled() {
            let notified = self.notify.notified();
            if self.is_cancelled() {
                break;
            }
            notified.await;
        }
    }
}

/// How a watchdog run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchdogOutcome {
    /// The relay signalled completion.
    Completed,
    /// An interval elapsed with zero progress; the transfer was cancelled.
    Stalled,
}

/// Supervises one relay transfer.
///
/// Two states: watching and done. Watching ends either when the relay's
/// completion signal arrives or when a full interval passes without any
/// bytes moving, in which case the cancellation flag is set.
pub struct StallWatchdog {
    interval: Duration,
    progress: Arc<ProgressCounter>,
    cancel: Arc<CancelFlag>,
}

impl StallWatchdog {
    pub fn new(
        interval: Duration,
        progress: Arc<ProgressCounter>,
        cancel: Arc<CancelFlag>,
    ) -> Self {
        Self {
            interval,
            progress,
            cancel,
        }
    }

    /// Watch until the relay completes or stalls. `done` is signalled by the
    /// relay copy loop; a dropped sender counts as completion.
    pub async fn watch(self, mut done: oneshot::Receiver<()>) -> WatchdogOutcome {
        loop {
            tokio::select! {
                _ = &mut done => return WatchdogOutcome::Completed,
                _ = time::sleep(self.interval) => {
                    if self.progress.take() == 0 {
                        tracing::error!(
                            interval_secs = self.interval.as_secs(),
                            "relayed 0 bytes in a full interval, cancelling transfer"
                        );
                        metrics::record_stall();
                        self.cancel.cancel();
                        return WatchdogOutcome::Stalled;
                    }
                }
            }
        }
    }
}
