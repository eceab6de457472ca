//! Execution engine: turns a built [`Request`] into one transport call.
//!
//! # Design
//! Preparation is synchronous and borrows the request only long enough to
//! produce a [`PreparedRequest`], so the in-flight call owns everything it
//! needs and the caller keeps the descriptor. The transport answer is then
//! either parsed into a [`Response`] or normalized into an [`ApiError`].

use std::sync::Arc;

use http::header::{HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use http::{HeaderMap, Method};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use crate::dispatch::Execution;
use crate::error::{normalize, ApiError};
use crate::http::{PreparedRequest, RawResponse, TransportFailure};
use crate::request::{bearer, Params, Request};
use crate::transport::Transport;

const JSON: &str = "application/json";
const FORM: &str = "application/x-www-form-urlencoded";

/// A parsed response body.
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    Json(Value),
    Text(String),
    Empty,
}

/// A successful response.
#[derive(Debug, Clone)]
pub struct Response {
    pub status: u16,
    pub headers: HeaderMap,
    pub body: Body,
}

impl Response {
    /// Deserialize the body into `T`.
    ///
    /// Text bodies are tried as JSON as well, for servers that omit the
    /// content type; an empty body deserializes from `null`.
    pub fn json<T: DeserializeOwned>(self) -> Result<T, ApiError> {
        let status = self.status;
        let decoded = match self.body {
            Body::Json(value) => serde_json::from_value(value),
            Body::Text(text) => serde_json::from_str(&text),
            Body::Empty => serde_json::from_value(Value::Null),
        };
        decoded.map_err(|e| ApiError::malformed_body(status, format!("unexpected response body: {e}")))
    }
}

impl Request {
    /// Dispatch this request with `method` through `transport`.
    ///
    /// The returned [`Execution`] can be awaited or handed a callback.
    pub fn execute(&self, transport: &Arc<dyn Transport>, method: Method) -> Execution<Response> {
        Execution::new(prepare(self, method), transport.clone())
    }
}

/// Assemble the URL, settle headers and serialize the body.
pub fn prepare(request: &Request, method: Method) -> PreparedRequest {
    let mut headers = request.headers().clone();
    if let Some(token) = request.auth_token() {
        // Validated when the request was built.
        if let Ok(value) = bearer(token) {
            headers.insert(AUTHORIZATION, value);
        }
    }

    let body = request.body_parameters().map(|params| {
        let content_type = headers
            .entry(CONTENT_TYPE)
            .or_insert(HeaderValue::from_static(JSON));
        serialize_body(content_type, params)
    });

    PreparedRequest {
        method,
        url: request.url(),
        headers,
        body,
    }
}

fn serialize_body(content_type: &mut HeaderValue, params: &Params) -> String {
    let is_form = content_type
        .to_str()
        .map(|ct| ct.starts_with(FORM))
        .unwrap_or(false);
    if is_form {
        match serde_urlencoded::to_string(params) {
            Ok(encoded) => return encoded,
            Err(e) => {
                // Nested values have no form representation; the body goes
                // out as JSON and must be labelled as such.
                debug!(error = %e, "form encoding failed, sending JSON");
                *content_type = HeaderValue::from_static(JSON);
            }
        }
    }
    Value::Object(params.clone()).to_string()
}

/// Perform one call and normalize its outcome.
pub(crate) async fn run(
    transport: &dyn Transport,
    request: PreparedRequest,
) -> Result<Response, ApiError> {
    let method = request.method.clone();
    let url = request.url.clone();
    debug!(%method, %url, "dispatching request");

    let outcome = match transport.send(request).await {
        Ok(raw) if raw.is_success() => parse(raw),
        Ok(raw) => Err(normalize(TransportFailure::from(raw))),
        Err(failure) => Err(normalize(failure)),
    };

    match &outcome {
        Ok(response) => debug!(%method, %url, status = response.status, "request succeeded"),
        Err(err) => warn!(
            %method,
            %url,
            status = ?err.status_code(),
            error = %err,
            "request failed"
        ),
    }
    outcome
}

fn parse(raw: RawResponse) -> Result<Response, ApiError> {
    let RawResponse {
        status,
        headers,
        body,
    } = raw;

    let is_json = headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|ct| ct.to_ascii_lowercase().contains("json"))
        .unwrap_or(false);

    let body = if body.trim().is_empty() {
        Body::Empty
    } else if is_json {
        let value = serde_json::from_str(&body)
            .map_err(|e| ApiError::malformed_body(status, format!("malformed JSON body: {e}")))?;
        Body::Json(value)
    } else {
        Body::Text(body)
    };

    Ok(Response {
        status,
        headers,
        body,
    })
}
