//! Error taxonomy shared by the orchestrator.
//!
//! Port errors stay typed all the way to the transition payload: operations
//! that surface the raw cause carry an [`OperationFailure`], never a rendered
//! string.

use thiserror::Error;

use crate::domain::auth::LoginValidationError;
use crate::domain::ports::{BridgeError, LoginError, RemoteCallError};

/// An operation was invoked before the state it depends on was available.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PreconditionError {
    /// No access token is present in the auth slice.
    #[error("no access token is available for an authorised call")]
    MissingCredential,
    /// The active profile has not been fetched yet.
    #[error("the active profile has not been loaded")]
    ProfileNotLoaded,
}

/// Raw cause of a failed operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OperationFailure {
    /// The remote resource API call failed.
    #[error(transparent)]
    Remote(#[from] RemoteCallError),
    /// The identity authority failed.
    #[error(transparent)]
    Bridge(#[from] BridgeError),
    /// The credential exchange failed.
    #[error(transparent)]
    Login(#[from] LoginError),
    /// Required session state was missing.
    #[error(transparent)]
    Precondition(#[from] PreconditionError),
    /// Caller-supplied values were rejected before any call was made.
    #[error(transparent)]
    Validation(#[from] LoginValidationError),
}

impl OperationFailure {
    /// Short machine-readable name of the underlying cause, for log fields.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Remote(err) => err.kind(),
            Self::Bridge(err) => err.kind(),
            Self::Login(err) => err.kind(),
            Self::Precondition(PreconditionError::MissingCredential) => "missing_credential",
            Self::Precondition(PreconditionError::ProfileNotLoaded) => "profile_not_loaded",
            Self::Validation(_) => "validation",
        }
    }
}
