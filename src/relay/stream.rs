//! The relay copy loop.
//!
//! # Responsibilities
//! - Move bytes from the outbound response body to the inbound response
//!   through one pooled buffer
//! - Account every written byte to the progress counter
//! - Stop on end-of-stream, on either side failing, or on cancellation
//!
//! # Design Decisions
//! - The cancellation flag is checked before every read and again before
//!   every write; after a stall the channel may be in an inconsistent
//!   state and must not be touched further
//! - The buffer guard returns itself to the pool on drop, covering error
//!   and cancellation exits

use std::sync::Arc;

use bytes::Bytes;
use futures_util::{pin_mut, Stream, StreamExt};
use tokio::sync::{mpsc, oneshot};
use url::Url;

use crate::observability::metrics;
use crate::relay::buffer::PooledBuffer;
use crate::relay::watchdog::{CancelFlag, ProgressCounter};

/// Copy an outbound response body to the inbound response sink.
///
/// Chunks are staged through `buffer`, so no write exceeds the pooled
/// buffer size. Completion (normal or not) is reported through `done`,
/// which the stall watchdog consumes.
pub async fn relay_body<S, E>(
    source: S,
    sink: mpsc::Sender<Bytes>,
    mut buffer: PooledBuffer,
    progress: Arc<ProgressCounter>,
    cancel: Arc<CancelFlag>,
    done: oneshot::Sender<()>,
    url: Url,
) where
    S: Stream<Item = Result<Bytes, E>>,
    E: std::fmt::Display,
{
    pin_mut!(source);

    'copy: while !cancel.is_cancelled() {
        let Some(next) = source.next().await else {
            // Clean end-of-stream.
            break;
        };
        if cancel.is_cancelled() {
            break;
        }
        let chunk = match next {
            Ok(chunk) => chunk,
            Err(e) => {
                tracing::warn!(url = %url, error = %e, "read error while relaying");
                break;
            }
        };
        for part in chunk.chunks(buffer.len()) {
            if cancel.is_cancelled() {
                break 'copy;
            }
            buffer[..part.len()].copy_from_slice(part);
            if sink
                .send(Bytes::copy_from_slice(&buffer[..part.len()]))
                .await
                .is_err()
            {
                tracing::warn!(url = %url, "write error while relaying: receiver went away");
                break 'copy;
            }
            progress.add(part.len() as u64);
            metrics::record_relayed_bytes(part.len() as u64);
        }
    }

    // Buffer returns to the pool when the guard drops here.
    let _ = done.send(());
}
