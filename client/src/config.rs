//! Client configuration loaded via OrthoConfig.
//!
//! Every field is optional; accessors apply the defaults. Environment
//! variables use the `ACCOUNT_` prefix, e.g. `ACCOUNT_API_BASE_URL`.

use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;
use thiserror::Error;
use url::Url;

use crate::domain::DEFAULT_TRANSITION_BUFFER;

const DEFAULT_API_BASE_URL: &str = "https://kitsu.io/api/edge/";
const DEFAULT_OAUTH_TOKEN_URL: &str = "https://kitsu.io/api/oauth/token";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Errors raised while interpreting loaded settings.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SettingsError {
    /// A URL setting did not parse.
    #[error("{field} is not a valid URL: {source}")]
    InvalidUrl {
        field: &'static str,
        #[source]
        source: url::ParseError,
    },
    /// A URL setting used a scheme other than http or https.
    #[error("{field} must be an http(s) URL")]
    UnsupportedScheme { field: &'static str },
}

/// Connection and session settings for the account client.
#[derive(Debug, Clone, Default, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "ACCOUNT")]
pub struct ClientSettings {
    /// Base URL of the JSON:API resource server.
    pub api_base_url: Option<String>,
    /// OAuth2 token endpoint used for password grants.
    pub oauth_token_url: Option<String>,
    /// OAuth2 client identifier, when the server requires one.
    pub oauth_client_id: Option<String>,
    /// OAuth2 client secret, when the server requires one.
    pub oauth_client_secret: Option<String>,
    /// Per-request timeout in seconds.
    pub request_timeout_secs: Option<u64>,
    /// Push endpoint id to record before fetching the profile.
    pub notification_endpoint_id: Option<String>,
    /// Capacity of the transition broadcast channel.
    pub transition_buffer: Option<usize>,
}

impl ClientSettings {
    /// Resource server base URL, always ending in `/` so collection names
    /// join beneath it.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError`] when the configured value is not an http(s) URL.
    pub fn api_base_url(&self) -> Result<Url, SettingsError> {
        let raw = self.api_base_url.as_deref().unwrap_or(DEFAULT_API_BASE_URL);
        let mut url = parse_http_url("api_base_url", raw)?;
        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }
        Ok(url)
    }

    /// OAuth2 token endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError`] when the configured value is not an http(s) URL.
    pub fn oauth_token_url(&self) -> Result<Url, SettingsError> {
        let raw = self
            .oauth_token_url
            .as_deref()
            .unwrap_or(DEFAULT_OAUTH_TOKEN_URL);
        parse_http_url("oauth_token_url", raw)
    }

    /// Request timeout, falling back to 30 seconds.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(
            self.request_timeout_secs
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
        )
    }

    /// Transition channel capacity.
    pub fn transition_buffer(&self) -> usize {
        self.transition_buffer
            .unwrap_or(DEFAULT_TRANSITION_BUFFER)
    }
}

fn parse_http_url(field: &'static str, raw: &str) -> Result<Url, SettingsError> {
    let url = Url::parse(raw).map_err(|source| SettingsError::InvalidUrl { field, source })?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        _ => Err(SettingsError::UnsupportedScheme { field }),
    }
}
