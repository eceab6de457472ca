//! Transport-facing data types for the host-does-IO pattern.
//!
//! # Design
//! The core crate turns a [`Request`](crate::Request) into a
//! [`PreparedRequest`] and hands it to a transport capability; the transport
//! answers with a [`RawResponse`] or a [`TransportFailure`]. None of these
//! types perform I/O, so any HTTP stack (or a test closure) can sit behind
//! them.

use std::fmt;
use std::str::FromStr;

use http::{HeaderMap, Method};

use crate::error::ConstructionError;

/// URL scheme of a request target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scheme {
    Http,
    Https,
}

impl Scheme {
    pub fn as_str(self) -> &'static str {
        match self {
            Scheme::Http => "http",
            Scheme::Https => "https",
        }
    }

    /// The port implied when a URL carries none.
    pub fn default_port(self) -> u16 {
        match self {
            Scheme::Http => 80,
            Scheme::Https => 443,
        }
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Scheme {
    type Err = ConstructionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "http" => Ok(Scheme::Http),
            "https" => Ok(Scheme::Https),
            _ => Err(ConstructionError::UnsupportedScheme(s.to_string())),
        }
    }
}

/// A fully assembled outbound call, ready for a transport.
///
/// Produced by the execution engine from a built `Request`. The body is
/// already serialized according to the request's `Content-Type`.
#[derive(Debug, Clone)]
pub struct PreparedRequest {
    pub method: Method,
    pub url: String,
    pub headers: HeaderMap,
    pub body: Option<String>,
}

/// An HTTP response described as plain data, whatever its status.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub headers: HeaderMap,
    pub body: String,
}

impl RawResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: body.into(),
        }
    }

    /// Build a response carrying a JSON body and a matching content type.
    pub fn json(status: u16, body: &serde_json::Value) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(
            http::header::CONTENT_TYPE,
            http::HeaderValue::from_static("application/json"),
        );
        Self {
            status,
            headers,
            body: body.to_string(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// What a transport reports when it cannot produce a successful response.
///
/// `status` is `None` for connectivity failures (DNS, refused connection,
/// timeout) and `Some` when the remote answered with an error status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportFailure {
    pub status: Option<u16>,
    pub body: Option<String>,
    pub description: String,
}

impl TransportFailure {
    /// A failure with no HTTP exchange behind it.
    pub fn network(description: impl Into<String>) -> Self {
        Self {
            status: None,
            body: None,
            description: description.into(),
        }
    }

    /// A failure where the remote answered with `status` and `body`.
    pub fn status(status: u16, body: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            body: Some(body.into()),
            description: format!("HTTP {status}"),
        }
    }
}

impl From<RawResponse> for TransportFailure {
    fn from(response: RawResponse) -> Self {
        TransportFailure::status(response.status, response.body)
    }
}

impl fmt::Display for TransportFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.description)
    }
}
