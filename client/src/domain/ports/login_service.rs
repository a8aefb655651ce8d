//! Driven port for exchanging account credentials for bearer tokens.
//!
//! The orchestrator's login flow calls this port and installs the returned
//! access token in the auth slice. Adapters decide how the exchange happens;
//! the production one performs an OAuth2 password grant.

use async_trait::async_trait;

use super::define_port_error;
use crate::domain::auth::{AuthTokens, LoginCredentials};

define_port_error! {
    /// Failures surfaced by login service adapters.
    pub enum LoginError {
        /// The authority refused the username/password pair.
        InvalidCredentials => "invalid credentials",
        /// The token endpoint could not be reached or answered with a server error.
        Transport { message: String } => "login transport failed: {message}",
        /// The token response did not have the expected shape.
        Decode { message: String } => "login response could not be decoded: {message}",
    }
}

/// Port for credential exchange.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LoginService: Send + Sync {
    /// Exchange `credentials` for a token set.
    async fn authenticate(&self, credentials: &LoginCredentials) -> Result<AuthTokens, LoginError>;
}

/// In-memory authenticator for local runs.
///
/// `admin@example.com` / `password` succeeds with a fixed token; anything else
/// is refused.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureLoginService;

impl FixtureLoginService {
    /// Access token issued for the fixture account.
    pub const ACCESS_TOKEN: &'static str = "fixture-access-token";
}

#[async_trait]
impl LoginService for FixtureLoginService {
    async fn authenticate(&self, credentials: &LoginCredentials) -> Result<AuthTokens, LoginError> {
        if credentials.username() == "admin@example.com" && credentials.password() == "password" {
            Ok(AuthTokens::bearer(Self::ACCESS_TOKEN))
        } else {
            Err(LoginError::invalid_credentials())
        }
    }
}
