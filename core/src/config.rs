//! Endpoints and credentials.
//!
//! # Design
//! Nothing here is global. `Endpoints` is owned by the façade so tests can
//! point it at a local server, and `Credentials` is owned by the caller and
//! passed to every façade call.

use std::borrow::Cow;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::http::Scheme;

/// Where a family of requests is sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub scheme: Scheme,
    pub host: Cow<'static, str>,
    pub port: u16,
}

impl Endpoint {
    /// Board, column, card, label, comment and user resources.
    pub const BOARD_API: Endpoint = Endpoint::https("gloapi.gitkraken.com");

    /// OAuth token exchange.
    pub const AUTH_API: Endpoint = Endpoint::https("api.gitkraken.com");

    /// The page a user is sent to for granting access.
    pub const AUTHORIZE_PAGE: Endpoint = Endpoint::https("app.gitkraken.com");

    const fn https(host: &'static str) -> Self {
        Endpoint {
            scheme: Scheme::Https,
            host: Cow::Borrowed(host),
            port: 443,
        }
    }

    pub fn new(scheme: Scheme, host: impl Into<String>, port: u16) -> Self {
        Self {
            scheme,
            host: Cow::Owned(host.into()),
            port,
        }
    }
}

/// The three endpoints the façade talks to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub boards: Endpoint,
    pub auth: Endpoint,
    pub authorize: Endpoint,
}

impl Endpoints {
    /// Route every family of requests to the same endpoint.
    pub fn all(endpoint: Endpoint) -> Self {
        Self {
            boards: endpoint.clone(),
            auth: endpoint.clone(),
            authorize: endpoint,
        }
    }
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            boards: Endpoint::BOARD_API,
            auth: Endpoint::AUTH_API,
            authorize: Endpoint::AUTHORIZE_PAGE,
        }
    }
}

pub const CLIENT_ID_VAR: &str = "GLO_CLIENT_ID";
pub const CLIENT_SECRET_VAR: &str = "GLO_CLIENT_SECRET";
pub const ACCESS_TOKEN_VAR: &str = "GLO_ACCESS_TOKEN";

/// OAuth client credentials and the current access token.
///
/// Accessors are plain field access; no value is validated until a request
/// needs it.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    client_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    client_secret: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    access_token: Option<String>,
}

impl Credentials {
    pub fn new() -> Self {
        Self::default()
    }

    /// Credentials carrying only an access token.
    pub fn with_access_token(token: impl Into<String>) -> Self {
        Self {
            access_token: Some(token.into()),
            ..Self::default()
        }
    }

    /// Read `GLO_CLIENT_ID`, `GLO_CLIENT_SECRET` and `GLO_ACCESS_TOKEN`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            client_id: lookup(CLIENT_ID_VAR),
            client_secret: lookup(CLIENT_SECRET_VAR),
            access_token: lookup(ACCESS_TOKEN_VAR),
        }
    }

    /// Overwrite the fields that are set in `other`, keep the rest.
    pub fn merge(&mut self, other: Credentials) {
        if other.client_id.is_some() {
            self.client_id = other.client_id;
        }
        if other.client_secret.is_some() {
            self.client_secret = other.client_secret;
        }
        if other.access_token.is_some() {
            self.access_token = other.access_token;
        }
    }

    pub fn client_id(&self) -> Option<&str> {
        self.client_id.as_deref()
    }

    pub fn client_secret(&self) -> Option<&str> {
        self.client_secret.as_deref()
    }

    pub fn access_token(&self) -> Option<&str> {
        self.access_token.as_deref()
    }

    pub fn set_client_id(&mut self, client_id: impl Into<String>) {
        self.client_id = Some(client_id.into());
    }

    pub fn set_client_secret(&mut self, client_secret: impl Into<String>) {
        self.client_secret = Some(client_secret.into());
    }

    pub fn set_access_token(&mut self, access_token: impl Into<String>) {
        self.access_token = Some(access_token.into());
    }

    pub fn reset_client_id(&mut self) {
        self.client_id = None;
    }

    pub fn reset_client_secret(&mut self) {
        self.client_secret = None;
    }

    pub fn reset_access_token(&mut self) {
        self.access_token = None;
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redact = |v: &Option<String>| v.as_ref().map(|_| "<redacted>");
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &redact(&self.client_secret))
            .field("access_token", &redact(&self.access_token))
            .finish()
    }
}
