//! Per-request relay orchestration.
//!
//! # Responsibilities
//! - Resolve the target and build the outbound request
//! - Dispatch it and resolve the effective final URL
//! - Mirror the outbound status and headers, forcing inline disposition
//! - Run the copy loop under stall-watchdog supervision
//!
//! # Design Decisions
//! - The tracker cleanup guard is created before dispatch, so the entry is
//!   forgotten on every exit path, success or failure
//! - Failures before the response starts are answered with a status and the
//!   error text; once streaming has begun they only truncate the body

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::{header, HeaderMap, HeaderName, HeaderValue};
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use futures_util::Stream;
use tokio::sync::{mpsc, oneshot};

use crate::observability::metrics;
use crate::relay::dispatch::dispatch;
use crate::relay::stream::relay_body;
use crate::relay::target::{self, TargetParams};
use crate::relay::tracker::RelayId;
use crate::relay::watchdog::{CancelFlag, ProgressCounter, StallWatchdog};
use crate::relay::RelayState;

/// Handle one relay request end to end.
pub async fn relay_handler(State(state): State<RelayState>, request: Request) -> Response {
    let (parts, inbound_body) = request.into_parts();
    let method = parts.method.clone();
    let id = RelayId::new();

    let params = TargetParams::from_query(parts.uri.query());
    let target = match target::resolve_target(&params) {
        Ok(url) => url,
        Err(e) => {
            tracing::debug!(relay_id = %id, error = %e, "rejecting relay request");
            metrics::record_relay(method.as_str(), e.status().as_u16());
            return e.into_response();
        }
    };

    // Forgotten on every exit path from here on.
    let _cleanup = state.tracker.cleanup_guard(id);

    let outbound_headers = target::outbound_headers(&parts.headers);
    let outbound_body = target::declares_body(&parts.headers)
        .then(|| reqwest::Body::wrap_stream(inbound_body.into_data_stream()));

    tracing::debug!(relay_id = %id, method = %method, url = %target, "dispatching relay");
    let upstream = match dispatch(
        &state,
        id,
        method.clone(),
        &target,
        outbound_headers,
        outbound_body,
    )
    .await
    {
        Ok(response) => response,
        Err(e) => {
            tracing::warn!(relay_id = %id, url = %target, error = %e, "relay dispatch failed");
            metrics::record_relay(method.as_str(), e.status().as_u16());
            return e.into_response();
        }
    };

    let final_url = state.tracker.resolve(id).unwrap_or_else(|| target.clone());
    if final_url != target {
        tracing::info!(relay_id = %id, from = %target, to = %final_url, "redirect resolved");
    }

    let status = upstream.status();
    let headers = response_headers(target::inline_filename(final_url.path()), upstream.headers());
    metrics::record_relay(method.as_str(), status.as_u16());

    let progress = Arc::new(ProgressCounter::default());
    let cancel = Arc::new(CancelFlag::default());
    let (chunk_tx, chunk_rx) = mpsc::channel(1);
    let (done_tx, done_rx) = oneshot::channel();

    tokio::spawn(relay_body(
        upstream.bytes_stream(),
        chunk_tx,
        state.buffers.checkout(),
        progress.clone(),
        cancel.clone(),
        done_tx,
        final_url,
    ));
    let watchdog = StallWatchdog::new(
        Duration::from_secs(state.settings.stall_interval_secs),
        progress,
        cancel.clone(),
    );
    tokio::spawn(watchdog.watch(done_rx));

    let mut response = Response::new(Body::from_stream(watched_stream(chunk_rx, cancel)));
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    response
}

/// Response headers: the synthetic inline disposition first, then every
/// outbound response header verbatim. An origin-supplied disposition lands
/// after the synthetic one and overwrites it.
fn response_headers(filename: &str, upstream: &HeaderMap) -> HeaderMap {
    let mut headers = HeaderMap::with_capacity(upstream.len() + 1);
    let disposition = HeaderValue::from_str(&format!("inline; filename=\"{filename}\""))
        .unwrap_or_else(|_| HeaderValue::from_static("inline"));
    headers.insert(header::CONTENT_DISPOSITION, disposition);

    let mut previous: Option<HeaderName> = None;
    for (name, value) in upstream {
        if name == header::TRANSFER_ENCODING {
            // The server reframes the body itself.
            continue;
        }
        if previous.as_ref() == Some(name) {
            headers.append(name.clone(), value.clone());
        } else {
            headers.insert(name.clone(), value.clone());
            previous = Some(name.clone());
        }
    }
    headers
}

/// The client-facing body: relay chunks until the copy loop finishes or the
/// watchdog cancels, whichever comes first. Ending the stream on
/// cancellation truncates the response even while the upstream read is
/// still blocked.
fn watched_stream(
    chunks: mpsc::Receiver<Bytes>,
    cancel: Arc<CancelFlag>,
) -> impl Stream<Item = Result<Bytes, Infallible>> {
    futures_util::stream::unfold((chunks, cancel), |(mut chunks, cancel)| async move {
        let watcher = cancel.clone();
        tokio::select! {
            chunk = chunks.recv() => chunk.map(|chunk| (Ok(chunk), (chunks, cancel))),
            _ = async move { watcher.cancelled().await } => None,
        }
    })
}
