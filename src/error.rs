//! Relay error type and its HTTP mapping.
//!
//! A [`RelayError`] is raised for failures that occur before the response
//! body starts streaming. `InvalidTarget` answers `400 Bad Request` with the
//! message as the body; every other variant answers `500 Internal Server
//! Error` with the message as the body. Mid-stream failures are logged only
//! (spec.md §7) and never surface here.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// A failure raised while resolving or dispatching a relay request.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    /// The inbound request did not name a usable target URL.
    #[error("{0}")]
    InvalidTarget(String),

    /// The redirect chain exceeded the configured hop cap.
    #[error("stopped after {max} redirects")]
    TooManyRedirects { max: usize },

    /// A redirect hop could not be followed.
    #[error("bad redirect: {0}")]
    BadRedirect(String),

    /// The outbound request itself failed.
    #[error("dispatch failed: {0}")]
    Dispatch(#[from] reqwest::Error),
}

impl RelayError {
    /// The HTTP status this error maps to.
    pub fn status(&self) -> StatusCode {
        match self {
            RelayError::InvalidTarget(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        (self.status(), self.to_string()).into_response()
    }
}
