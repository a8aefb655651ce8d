//! Per-operation session context.
//!
//! Each orchestrator operation builds a fresh context from the auth slice of
//! the account state and hands it to every gateway call it makes. Nothing is
//! cached between operations, so a token refreshed in state is picked up by
//! the next operation without any global reconfiguration.

use crate::domain::auth::AccessToken;
use crate::domain::error::PreconditionError;

/// Credential holder passed to gateway calls.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionContext {
    credential: Option<AccessToken>,
}

impl SessionContext {
    /// Context without a credential, for calls that do not need one.
    #[must_use]
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Context carrying `token`.
    #[must_use]
    pub fn authorised(token: AccessToken) -> Self {
        Self {
            credential: Some(token),
        }
    }

    /// Install `token` for all subsequent calls made with this context.
    pub fn set_credential(&mut self, token: AccessToken) {
        self.credential = Some(token);
    }

    /// The installed credential, if any.
    pub fn credential(&self) -> Option<&AccessToken> {
        self.credential.as_ref()
    }

    /// The installed credential, or [`PreconditionError::MissingCredential`].
    ///
    /// # Errors
    ///
    /// Fails when no credential has been installed.
    pub fn require_credential(&self) -> Result<&AccessToken, PreconditionError> {
        self.credential
            .as_ref()
            .ok_or(PreconditionError::MissingCredential)
    }
}
