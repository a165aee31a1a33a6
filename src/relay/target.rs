//! Inbound request translation.
//!
//! # Responsibilities
//! - Resolve the target URL from the `url` or `base64Url` query parameter
//! - Derive the inline-display filename from a URL path
//! - Prepare the header set forwarded to the target

use axum::http::{header, HeaderMap};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use url::Url;

use crate::error::RelayError;

/// The two recognized ways of naming a relay target.
#[derive(Debug, Default)]
pub struct TargetParams {
    pub url: Option<String>,
    pub base64_url: Option<String>,
}

impl TargetParams {
    /// Extract target parameters from a raw query string. The first
    /// non-empty occurrence of each parameter wins.
    pub fn from_query(query: Option<&str>) -> Self {
        let mut params = Self::default();
        let Some(query) = query else {
            return params;
        };
        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            if value.is_empty() {
                continue;
            }
            match key.as_ref() {
                "url" if params.url.is_none() => params.url = Some(value.into_owned()),
                "base64Url" if params.base64_url.is_none() => {
                    params.base64_url = Some(value.into_owned())
                }
                _ => {}
            }
        }
        params
    }
}

/// Resolve the target URL named by the query parameters.
///
/// `url` takes precedence over `base64Url`. Fails with [`RelayError::InvalidTarget`]
/// when neither is present, when base64 decoding fails, or when the result is
/// not a syntactically valid URL. No outbound call is attempted in any of
/// those cases.
pub fn resolve_target(params: &TargetParams) -> Result<Url, RelayError> {
    let raw = match (&params.url, &params.base64_url) {
        (Some(url), _) => url.clone(),
        (None, Some(encoded)) => {
            let decoded = BASE64.decode(encoded).map_err(|e| {
                RelayError::InvalidTarget(format!(
                    "Failed to decode \"base64Url\" query parameter: {e}"
                ))
            })?;
            String::from_utf8(decoded).map_err(|e| {
                RelayError::InvalidTarget(format!(
                    "Failed to decode \"base64Url\" query parameter: {e}"
                ))
            })?
        }
        (None, None) => {
            return Err(RelayError::InvalidTarget(
                r#"Need the "url" or "base64Url" query parameter"#.to_string(),
            ))
        }
    };
    Url::parse(&raw).map_err(|e| RelayError::InvalidTarget(e.to_string()))
}

/// Filename used for inline display: the last `/`-delimited segment of the
/// path, or `index.html` when the path ends without one.
pub fn inline_filename(path: &str) -> &str {
    match path.rsplit('/').next() {
        Some(name) if !name.is_empty() => name,
        _ => "index.html",
    }
}

/// Headers forwarded to the target: every inbound header except `Host`,
/// which names the relay's own address rather than the target's.
/// `Transfer-Encoding` is dropped as well; the outbound transport reframes
/// the body itself.
pub fn outbound_headers(inbound: &HeaderMap) -> HeaderMap {
    let mut headers = HeaderMap::with_capacity(inbound.len());
    for (name, value) in inbound {
        if name == header::HOST || name == header::TRANSFER_ENCODING {
            continue;
        }
        headers.append(name.clone(), value.clone());
    }
    headers
}

/// Whether the inbound request declares a body worth forwarding.
///
/// A positive `Content-Length` or a `Transfer-Encoding` counts; a zero or
/// absent length means the outbound request gets no body.
pub fn declares_body(inbound: &HeaderMap) -> bool {
    let positive_length = inbound
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.parse::<u64>().ok())
        .is_some_and(|n| n > 0);
    positive_length || inbound.contains_key(header::TRANSFER_ENCODING)
}
