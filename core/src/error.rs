//! Error types for the Glo API client.
//!
//! # Design
//! Two failure families never mix. `ConstructionError` is returned
//! synchronously while a request is being described and means no I/O was
//! attempted. `ApiError` is the single normalized shape for anything that
//! goes wrong once a request is dispatched: connectivity failures, error
//! statuses and undecodable bodies all land here, so callers need one
//! handling path.

use crate::http::TransportFailure;

/// A request could not be described; nothing was sent.
#[derive(thiserror::Error, Debug)]
pub enum ConstructionError {
    #[error("request scheme is not set")]
    MissingScheme,

    #[error("request host is not set")]
    MissingHost,

    #[error("request port is not set")]
    MissingPort,

    #[error("port must be positive")]
    InvalidPort,

    #[error("unsupported scheme: {0}")]
    UnsupportedScheme(String),

    #[error("invalid host {host:?}")]
    InvalidHost {
        host: String,
        #[source]
        source: Option<url::ParseError>,
    },

    #[error("{0:?} is not a valid resource id")]
    InvalidId(String),

    #[error("invalid header name: {0}")]
    InvalidHeaderName(#[from] http::header::InvalidHeaderName),

    #[error("invalid header value: {0}")]
    InvalidHeaderValue(#[from] http::header::InvalidHeaderValue),

    #[error("{what} must serialize to a JSON object")]
    NotAnObject { what: &'static str },

    #[error("parameter serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("credential {0} is not set")]
    MissingCredential(&'static str),
}

/// What produced an [`ApiError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// No HTTP exchange completed.
    Transport,
    /// The remote answered with a non-success status.
    Status,
    /// The remote answered successfully but the body could not be decoded.
    MalformedBody,
}

/// The normalized error every dispatched request fails with.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct ApiError {
    message: String,
    status_code: Option<u16>,
    kind: FailureKind,
}

impl ApiError {
    pub const NAME: &'static str = "ApiError";

    pub fn transport(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status_code: None,
            kind: FailureKind::Transport,
        }
    }

    pub fn status(status: u16, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status_code: Some(status),
            kind: FailureKind::Status,
        }
    }

    pub fn malformed_body(status: u16, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status_code: Some(status),
            kind: FailureKind::MalformedBody,
        }
    }

    /// Always `"ApiError"`, whatever the cause.
    pub fn name(&self) -> &'static str {
        Self::NAME
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// The HTTP status behind the failure, `None` for transport failures.
    pub fn status_code(&self) -> Option<u16> {
        self.status_code
    }

    pub fn kind(&self) -> FailureKind {
        self.kind
    }
}

/// Fold whatever a transport reported into an [`ApiError`].
///
/// With a status, the message comes from the body's `message` field when the
/// body is a JSON object carrying one.
pub fn normalize(failure: TransportFailure) -> ApiError {
    match failure.status {
        Some(status) => {
            let message = failure
                .body
                .as_deref()
                .and_then(body_message)
                .unwrap_or_else(|| format!("request failed with status {status}"));
            ApiError::status(status, message)
        }
        None => ApiError::transport(failure.description),
    }
}

impl From<TransportFailure> for ApiError {
    fn from(failure: TransportFailure) -> Self {
        normalize(failure)
    }
}

fn body_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value.get("message")?.as_str().map(str::to_string)
}

/// Any failure surfaced by the client, for callers who want a single `?`.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Construction(#[from] ConstructionError),

    #[error(transparent)]
    Api(#[from] ApiError),
}
