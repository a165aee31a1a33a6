//! Outbound dispatch with manual redirect following.
//!
//! The outbound client has redirect following disabled, so the request the
//! relay issues is never rewritten behind its back. Each `3xx` hop is
//! followed here instead, up to the configured cap, and recorded in the
//! redirect tracker under the dispatch's [`RelayId`] so the handler can
//! name the final URL afterwards.

use axum::http::{header, HeaderMap, Method, StatusCode};
use url::Url;

use crate::error::RelayError;
use crate::observability::metrics;
use crate::relay::tracker::RelayId;
use crate::relay::RelayState;

/// Issue the outbound request and follow its redirect chain.
///
/// Returns the final, non-redirect response. Exceeding the hop cap fails
/// with [`RelayError::TooManyRedirects`] without requesting the next hop.
pub async fn dispatch(
    state: &RelayState,
    id: RelayId,
    method: Method,
    target: &Url,
    headers: HeaderMap,
    body: Option<reqwest::Body>,
) -> Result<reqwest::Response, RelayError> {
    let max = state.settings.max_redirects;
    let mut url = target.clone();
    let mut method = method;
    let mut headers = headers;
    let mut body = body;
    let mut body_streamed = false;
    let mut hops = 0usize;

    loop {
        let mut request = state
            .client
            .request(method.clone(), url.clone())
            .headers(headers.clone());
        if let Some(body) = body.take() {
            request = request.body(body);
            body_streamed = true;
        }

        let response = request.send().await?;
        let status = response.status();
        if !matches!(status.as_u16(), 301 | 302 | 303 | 307 | 308) {
            return Ok(response);
        }
        let location = response.headers().get(header::LOCATION).cloned();
        let Some(location) = location else {
            // A redirect status without a location is served as-is.
            return Ok(response);
        };

        hops += 1;
        if hops > max {
            return Err(RelayError::TooManyRedirects { max });
        }

        let location = location
            .to_str()
            .map_err(|_| RelayError::BadRedirect("location header is not valid UTF-8".into()))?;
        let next = url.join(location).map_err(|e| {
            RelayError::BadRedirect(format!("invalid redirect location {location:?}: {e}"))
        })?;

        if status == StatusCode::TEMPORARY_REDIRECT || status == StatusCode::PERMANENT_REDIRECT {
            // The method and body must be preserved, but an inbound body is a
            // stream that was already consumed by the previous hop.
            if body_streamed {
                return Err(RelayError::BadRedirect(format!(
                    "cannot replay a streamed request body across a {status} redirect"
                )));
            }
        } else {
            if method != Method::HEAD {
                method = Method::GET;
            }
            for name in [
                header::CONTENT_LENGTH,
                header::CONTENT_TYPE,
                header::CONTENT_ENCODING,
            ] {
                headers.remove(&name);
            }
        }

        state.tracker.record(id, next.clone());
        metrics::record_redirect();
        tracing::debug!(
            relay_id = %id,
            from = %url,
            to = %next,
            status = %status,
            "following redirect"
        );
        url = next;
    }
}
