//! Reqwest-backed OAuth2 password-grant login adapter.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest::{Client, StatusCode, Url};
use zeroize::Zeroizing;

use crate::domain::ports::{LoginError, LoginService};
use crate::domain::{AuthTokens, LoginCredentials};

/// OAuth2 client registration presented with every grant.
#[derive(Clone, Default)]
pub struct OAuthClientCredentials {
    pub client_id: Option<String>,
    pub client_secret: Option<Zeroizing<String>>,
}

impl std::fmt::Debug for OAuthClientCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuthClientCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &self.client_secret.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Login service exchanging a username and password at a token endpoint.
pub struct OAuthLoginService {
    client: Client,
    token_url: Url,
    credentials: OAuthClientCredentials,
}

impl OAuthLoginService {
    /// Build a login service with an explicit request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(
        token_url: Url,
        timeout: Duration,
        credentials: OAuthClientCredentials,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            token_url,
            credentials,
        })
    }

    fn grant_form<'a>(&'a self, login: &'a LoginCredentials) -> Vec<(&'static str, &'a str)> {
        let mut form = vec![
            ("grant_type", "password"),
            ("username", login.username()),
            ("password", login.password()),
        ];
        if let Some(id) = self.credentials.client_id.as_deref() {
            form.push(("client_id", id));
        }
        if let Some(secret) = self.credentials.client_secret.as_deref() {
            form.push(("client_secret", secret.as_str()));
        }
        form
    }
}

#[async_trait]
impl LoginService for OAuthLoginService {
    async fn authenticate(&self, credentials: &LoginCredentials) -> Result<AuthTokens, LoginError> {
        let response = self
            .client
            .post(self.token_url.clone())
            .header(ACCEPT, "application/json")
            .form(&self.grant_form(credentials))
            .send()
            .await
            .map_err(|err| LoginError::transport(err.to_string()))?;
        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|err| LoginError::transport(err.to_string()))?;
        if !status.is_success() {
            return Err(map_status_error(status));
        }
        serde_json::from_slice(&body)
            .map_err(|err| LoginError::decode(format!("invalid token response: {err}")))
    }
}

fn map_status_error(status: StatusCode) -> LoginError {
    match status {
        StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED => LoginError::invalid_credentials(),
        _ => LoginError::transport(format!("token endpoint returned status {}", status.as_u16())),
    }
}
