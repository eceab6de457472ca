//! `ureq` 3.x transport.
//!
//! `ureq` blocks, so each call runs on tokio's blocking pool. Error statuses
//! come back as data (`http_status_as_error(false)`) and are normalized by
//! the engine like any other non-2xx response.

use std::time::Duration;

use async_trait::async_trait;
use http::HeaderMap;
use ureq::typestate::WithBody;
use ureq::{Agent, Body, RequestBuilder};

use super::Transport;
use crate::http::{PreparedRequest, RawResponse, TransportFailure};

/// Production transport backed by a shared `ureq::Agent`.
#[derive(Clone)]
pub struct UreqTransport {
    agent: Agent,
}

impl UreqTransport {
    pub fn new() -> Self {
        Self::from_timeout(None)
    }

    /// Abort any call that has not completed within `timeout`.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::from_timeout(Some(timeout))
    }

    fn from_timeout(timeout: Option<Duration>) -> Self {
        let agent = Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(timeout)
            .build()
            .new_agent();
        Self { agent }
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for UreqTransport {
    async fn send(&self, request: PreparedRequest) -> Result<RawResponse, TransportFailure> {
        let agent = self.agent.clone();
        tokio::task::spawn_blocking(move || call(&agent, request))
            .await
            .map_err(|e| TransportFailure::network(format!("transport task failed: {e}")))?
    }
}

fn call(agent: &Agent, request: PreparedRequest) -> Result<RawResponse, TransportFailure> {
    let PreparedRequest {
        method,
        url,
        headers,
        body,
    } = request;
    let url = url.as_str();

    let result = match method.as_str() {
        "GET" => with_headers(agent.get(url), &headers)?.call(),
        "DELETE" => with_headers(agent.delete(url), &headers)?.call(),
        "HEAD" => with_headers(agent.head(url), &headers)?.call(),
        "POST" => send(with_headers(agent.post(url), &headers)?, body),
        "PUT" => send(with_headers(agent.put(url), &headers)?, body),
        "PATCH" => send(with_headers(agent.patch(url), &headers)?, body),
        other => {
            return Err(TransportFailure::network(format!(
                "unsupported method {other}"
            )))
        }
    };

    let mut response = result.map_err(|e| TransportFailure::network(e.to_string()))?;
    let status = response.status().as_u16();
    let headers = response.headers().clone();
    let body = response
        .body_mut()
        .read_to_string()
        .map_err(|e| TransportFailure::network(format!("reading response body: {e}")))?;

    Ok(RawResponse {
        status,
        headers,
        body,
    })
}

fn send(
    builder: RequestBuilder<WithBody>,
    body: Option<String>,
) -> Result<http::Response<Body>, ureq::Error> {
    match body {
        Some(body) => builder.send(body.as_bytes()),
        None => builder.send_empty(),
    }
}

fn with_headers<B>(
    mut builder: RequestBuilder<B>,
    headers: &HeaderMap,
) -> Result<RequestBuilder<B>, TransportFailure> {
    for (name, value) in headers {
        let value = value
            .to_str()
            .map_err(|e| TransportFailure::network(format!("header {name}: {e}")))?;
        builder = builder.header(name.as_str(), value);
    }
    Ok(builder)
}
