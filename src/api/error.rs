//! Error types for the Nscale API client.

use std::fmt;

use serde::Deserialize;
use thiserror::Error;

const NOT_FOUND: u16 = 404;

/// A non-success response returned by the control plane.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ApiError {
    /// HTTP status code of the response.
    pub status_code: u16,
    /// Machine readable error code (`error` field), possibly empty.
    pub code: String,
    /// Human readable description (`error_description` field), possibly empty.
    pub message: String,
    /// Trace identifier supplied by the server, if any.
    pub trace_id: Option<String>,
    /// Endpoint that produced the response, if known.
    pub endpoint: String,
    /// Raw response body, kept for debug logging.
    pub body: Vec<u8>,
}

impl ApiError {
    /// Builds a bare error carrying only a status code and message.
    #[must_use]
    pub fn with_status(status_code: u16, message: impl Into<String>) -> Self {
        Self {
            status_code,
            code: String::new(),
            message: message.into(),
            trace_id: None,
            endpoint: String::new(),
            body: Vec::new(),
        }
    }

    /// Decodes an error response body of the form
    /// `{"error": ..., "error_description": ..., "trace_id": ...}`.
    ///
    /// Bodies that do not match are kept verbatim with empty code and message.
    #[must_use]
    pub fn from_response(status_code: u16, endpoint: impl Into<String>, body: Vec<u8>) -> Self {
        let decoded = serde_json::from_slice::<ErrorBody>(&body).unwrap_or_default();
        Self {
            status_code,
            code: decoded.error,
            message: decoded.error_description,
            trace_id: decoded.trace_id,
            endpoint: endpoint.into(),
            body,
        }
    }

    /// Returns `true` when the server answered `404 Not Found`.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        self.status_code == NOT_FOUND
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "server returned status code {}", self.status_code)?;
        if !self.code.is_empty() {
            write!(f, ", code: {}", self.code)?;
        }
        if !self.message.is_empty() {
            write!(f, ", message: {}", self.message)?;
        }
        if let Some(trace_id) = self.trace_id.as_deref().filter(|id| !id.is_empty()) {
            write!(f, ", trace_id: {trace_id}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ApiError {}

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: String,
    #[serde(default)]
    error_description: String,
    #[serde(default)]
    trace_id: Option<String>,
}

/// Errors raised while fetching a resource snapshot.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum FetchError {
    /// The server answered with a non-success status.
    #[error(transparent)]
    Api(#[from] ApiError),
    /// The request never produced a response.
    #[error("request to {endpoint} failed: {message}")]
    Transport {
        /// Endpoint being called.
        endpoint: String,
        /// Transport level error message.
        message: String,
    },
    /// The response body could not be decoded.
    #[error("{endpoint} response could not be parsed: {message}")]
    Decode {
        /// Endpoint being called.
        endpoint: String,
        /// Decoder error message.
        message: String,
    },
}

impl FetchError {
    /// Builds a `404 Not Found` API error with the given message.
    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::Api(ApiError::with_status(NOT_FOUND, message))
    }

    /// Returns `true` only for API errors carrying a `404` status.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        match self {
            Self::Api(api) => api.is_not_found(),
            Self::Transport { .. } | Self::Decode { .. } => false,
        }
    }

    /// Returns the raw response body when the server sent one.
    #[must_use]
    pub fn response_body(&self) -> Option<&[u8]> {
        match self {
            Self::Api(api) if !api.body.is_empty() => Some(api.body.as_slice()),
            Self::Api(_) | Self::Transport { .. } | Self::Decode { .. } => None,
        }
    }

    /// Endpoint associated with the failure, when known.
    #[must_use]
    pub fn endpoint(&self) -> Option<&str> {
        match self {
            Self::Api(api) if !api.endpoint.is_empty() => Some(api.endpoint.as_str()),
            Self::Api(_) => None,
            Self::Transport { endpoint, .. } | Self::Decode { endpoint, .. } => {
                Some(endpoint.as_str())
            }
        }
    }
}
