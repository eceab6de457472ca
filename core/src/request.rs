//! Request descriptors and the builder that produces them.
//!
//! # Design
//! `RequestBuilder` is a persistent value: every `with_*` consumes the
//! builder and returns the updated one, and `build` borrows it. A builder can
//! therefore be cloned and reused freely, and nothing done to it after
//! `build` can reach a `Request` that was already produced.
//!
//! Header, query and body maps merge on repeated calls. Later keys overwrite
//! earlier ones; header names compare case-insensitively.

use http::header::{HeaderName, HeaderValue, AUTHORIZATION};
use http::HeaderMap;
use serde::Serialize;
use url::Url;

use crate::assemble;
use crate::config::Endpoint;
use crate::error::ConstructionError;
use crate::http::Scheme;

/// Ordered parameter map. Insertion order is kept so assembled URLs are
/// reproducible.
pub type Params = serde_json::Map<String, serde_json::Value>;

/// Convert any serializable value into a parameter map.
pub fn params_from<T: Serialize + ?Sized>(value: &T) -> Result<Params, ConstructionError> {
    match serde_json::to_value(value)? {
        serde_json::Value::Object(map) => Ok(map),
        _ => Err(ConstructionError::NotAnObject { what: "parameters" }),
    }
}

/// An immutable description of one HTTP call.
///
/// Carries no HTTP verb: the verb is chosen when the request is executed.
#[derive(Debug, Clone)]
pub struct Request {
    scheme: Scheme,
    host: String,
    port: u16,
    path: String,
    headers: HeaderMap,
    query: Params,
    body: Option<Params>,
    auth_token: Option<String>,
    origin: Url,
}

impl Request {
    pub fn scheme(&self) -> Scheme {
        self.scheme
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn query_parameters(&self) -> &Params {
        &self.query
    }

    pub fn body_parameters(&self) -> Option<&Params> {
        self.body.as_ref()
    }

    pub fn auth_token(&self) -> Option<&str> {
        self.auth_token.as_deref()
    }

    /// `scheme://host[:port]` of the request, validated at build time.
    pub(crate) fn origin(&self) -> &Url {
        &self.origin
    }

    /// The fully assembled URL. Performs no I/O.
    pub fn url(&self) -> String {
        assemble::assemble(self)
    }
}

/// Accumulates the fields of a [`Request`].
#[derive(Debug, Clone, Default)]
#[must_use]
pub struct RequestBuilder {
    scheme: Option<Scheme>,
    host: Option<String>,
    port: Option<u16>,
    path: String,
    headers: Vec<(String, String)>,
    query: Params,
    body: Option<Params>,
    auth_token: Option<String>,
}

impl RequestBuilder {
    /// A builder with no field set.
    pub fn new() -> Self {
        Self::default()
    }

    /// A builder targeting `endpoint`.
    pub fn for_endpoint(endpoint: &Endpoint) -> Self {
        Self::new()
            .with_scheme(endpoint.scheme)
            .with_host(endpoint.host.to_string())
            .with_port(endpoint.port)
    }

    /// A builder for the board API, authenticated with `access_token` when
    /// one is given.
    pub fn board_api(access_token: Option<&str>) -> Self {
        let builder = Self::for_endpoint(&Endpoint::BOARD_API);
        match access_token {
            Some(token) => builder.with_auth(token),
            None => builder,
        }
    }

    /// A builder for the OAuth token API.
    pub fn authentication_api() -> Self {
        Self::for_endpoint(&Endpoint::AUTH_API)
    }

    pub fn with_scheme(mut self, scheme: Scheme) -> Self {
        self.scheme = Some(scheme);
        self
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    /// Bearer token sent as `Authorization: Bearer <token>`.
    pub fn with_auth(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    pub fn with_headers<I, K, V>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (name, value) in headers {
            let name = name.into();
            let value = value.into();
            match self
                .headers
                .iter_mut()
                .find(|(existing, _)| existing.eq_ignore_ascii_case(&name))
            {
                Some(slot) => *slot = (name, value),
                None => self.headers.push((name, value)),
            }
        }
        self
    }

    /// Merge query parameters. `None` leaves the builder untouched.
    pub fn with_query_parameters(mut self, params: impl Into<Option<Params>>) -> Self {
        if let Some(params) = params.into() {
            self.query.extend(params);
        }
        self
    }

    /// Merge body parameters. `None` leaves the builder untouched.
    pub fn with_body_parameters(mut self, params: impl Into<Option<Params>>) -> Self {
        if let Some(params) = params.into() {
            self.body.get_or_insert_with(Params::new).extend(params);
        }
        self
    }

    /// Produce an independent [`Request`] from the current fields.
    pub fn build(&self) -> Result<Request, ConstructionError> {
        let scheme = self.scheme.ok_or(ConstructionError::MissingScheme)?;
        let host = self
            .host
            .clone()
            .filter(|h| !h.is_empty())
            .ok_or(ConstructionError::MissingHost)?;
        let port = self.port.ok_or(ConstructionError::MissingPort)?;
        if port == 0 {
            return Err(ConstructionError::InvalidPort);
        }

        let origin = Url::parse(&format!("{scheme}://{host}:{port}")).map_err(|source| {
            ConstructionError::InvalidHost {
                host: host.clone(),
                source: Some(source),
            }
        })?;
        if !is_bare_origin(&origin, &host, port) {
            return Err(ConstructionError::InvalidHost { host, source: None });
        }

        let mut headers = HeaderMap::with_capacity(self.headers.len() + 1);
        for (name, value) in &self.headers {
            headers.insert(HeaderName::try_from(name.as_str())?, HeaderValue::try_from(value.as_str())?);
        }
        if let Some(token) = &self.auth_token {
            headers.insert(AUTHORIZATION, bearer(token)?);
        }

        Ok(Request {
            scheme,
            host,
            port,
            path: self.path.clone(),
            headers,
            query: self.query.clone(),
            body: self.body.clone(),
            auth_token: self.auth_token.clone(),
            origin,
        })
    }

    /// Build and assemble the URL without keeping the request.
    pub fn url(&self) -> Result<String, ConstructionError> {
        Ok(self.build()?.url())
    }
}

// The host must survive parsing unchanged: no userinfo, path, query or
// fragment smuggled in, and no port of its own.
fn is_bare_origin(origin: &Url, host: &str, port: u16) -> bool {
    origin
        .host_str()
        .is_some_and(|parsed| parsed.eq_ignore_ascii_case(host))
        && origin.port_or_known_default() == Some(port)
        && origin.username().is_empty()
        && origin.password().is_none()
        && origin.path() == "/"
        && origin.query().is_none()
        && origin.fragment().is_none()
}

pub(crate) fn bearer(token: &str) -> Result<HeaderValue, ConstructionError> {
    let mut value = HeaderValue::try_from(format!("Bearer {token}"))?;
    value.set_sensitive(true);
    Ok(value)
}
