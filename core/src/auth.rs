//! OAuth authorization-code flow.

use http::Method;
use serde_json::json;

use crate::client::GloBoardApi;
use crate::config::Credentials;
use crate::dispatch::Execution;
use crate::error::ConstructionError;
use crate::request::{params_from, RequestBuilder};
use crate::types::AccessToken;

impl GloBoardApi {
    /// Exchange an authorization `code` for an access token.
    ///
    /// Client id and secret must be set on `credentials`.
    pub fn authorization_code_grant(
        &self,
        credentials: &Credentials,
        code: &str,
    ) -> Result<Execution<AccessToken>, ConstructionError> {
        let client_id = credentials
            .client_id()
            .ok_or(ConstructionError::MissingCredential("client_id"))?;
        let client_secret = credentials
            .client_secret()
            .ok_or(ConstructionError::MissingCredential("client_secret"))?;

        let body = params_from(&json!({
            "grant_type": "authorization_code",
            "code": code,
            "client_id": client_id,
            "client_secret": client_secret,
        }))?;
        let request = RequestBuilder::for_endpoint(&self.endpoints().auth)
            .with_path("/oauth/access_token")
            .with_headers([("Content-Type", "application/json")])
            .with_body_parameters(body)
            .build()?;
        Ok(request.execute(self.transport(), Method::POST).json())
    }

    /// The page where a user grants this application `scopes`.
    ///
    /// `state` is echoed back on the redirect. Performs no I/O.
    pub fn create_authorize_url(
        &self,
        credentials: &Credentials,
        scopes: &[&str],
        state: &str,
    ) -> Result<String, ConstructionError> {
        let client_id = credentials
            .client_id()
            .ok_or(ConstructionError::MissingCredential("client_id"))?;
        let query = params_from(&json!({
            "client_id": client_id,
            "response_type": "code",
            "scope": scopes.join(" "),
            "state": state,
        }))?;
        RequestBuilder::for_endpoint(&self.endpoints().authorize)
            .with_path("/oauth/authorize")
            .with_query_parameters(query)
            .url()
    }
}
