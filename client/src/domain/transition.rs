//! Transition vocabulary emitted by orchestrator operations.
//!
//! Every invocation produces a `Started` transition followed by exactly one
//! terminal transition. Transitions are the only channel from operations to
//! account state; the reducer in [`crate::domain::state`] consumes them.

use std::fmt;

use uuid::Uuid;

use crate::domain::auth::AuthTokens;
use crate::domain::error::OperationFailure;
use crate::domain::identity::{ThirdPartyId, ThirdPartyProfile};
use crate::domain::ports::Record;
use crate::domain::settings::{LibrarySettings, SettingsPatch};
use crate::domain::user::UserProfile;

/// Fixed, display-safe failure reasons.
pub mod reasons {
    /// Profile fetch failed.
    pub const LOAD_USER: &str = "failed to load user";
    /// Identity connection failed at the authority or the API.
    pub const CONNECT_IDENTITY: &str = "failed to connect identity";
    /// Identity disconnection failed.
    pub const DISCONNECT_IDENTITY: &str = "failed to disconnect identity";
    /// Notification endpoint registration failed.
    pub const REGISTER_NOTIFICATIONS: &str = "failed to register notifications";
    /// The authority refused the credentials.
    pub const INVALID_CREDENTIALS: &str = "invalid credentials";
    /// Login failed for any other reason.
    pub const LOG_IN: &str = "failed to log in";
    /// The identity authority did not return a profile.
    pub const LOAD_IDENTITY_PROFILE: &str = "failed to load identity profile";
    /// The operation was dropped before it settled.
    pub const ABANDONED: &str = "operation abandoned";
}

/// Correlates the transitions of a single invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InvocationId(Uuid);

impl InvocationId {
    /// Fresh random identifier.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Access the inner UUID.
    #[must_use]
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for InvocationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Named orchestrator operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    FetchCurrentUser,
    CreateUser,
    Login,
    CaptureThirdPartyProfile,
    ConnectThirdPartyIdentity,
    DisconnectThirdPartyIdentity,
    UpdateGeneralSettings,
    UpdateLibrarySettings,
    FollowUser,
    RegisterNotificationEndpoint,
    RecordNotificationEndpoint,
}

impl Operation {
    /// Upper snake-case tag used as the prefix of transition type tags.
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            Self::FetchCurrentUser => "FETCH_CURRENT_USER",
            Self::CreateUser => "CREATE_USER",
            Self::Login => "LOGIN",
            Self::CaptureThirdPartyProfile => "CAPTURE_THIRD_PARTY_PROFILE",
            Self::ConnectThirdPartyIdentity => "CONNECT_THIRD_PARTY_IDENTITY",
            Self::DisconnectThirdPartyIdentity => "DISCONNECT_THIRD_PARTY_IDENTITY",
            Self::UpdateGeneralSettings => "UPDATE_GENERAL_SETTINGS",
            Self::UpdateLibrarySettings => "UPDATE_LIBRARY_SETTINGS",
            Self::FollowUser => "FOLLOW_USER",
            Self::RegisterNotificationEndpoint => "REGISTER_NOTIFICATION_ENDPOINT",
            Self::RecordNotificationEndpoint => "RECORD_NOTIFICATION_ENDPOINT",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Success payloads.
#[derive(Debug, Clone, PartialEq)]
pub enum Success {
    /// Nothing beyond the fact of success.
    Acknowledged,
    /// The freshly fetched active profile.
    Profile(UserProfile),
    /// Tokens issued by a login.
    Tokens(AuthTokens),
    /// Profile returned by the identity authority.
    ThirdPartyProfile(ThirdPartyProfile),
    /// Identifier linked to the active profile.
    ThirdPartyConnected(ThirdPartyId),
    /// The applied general settings, password removed.
    GeneralSettings(SettingsPatch),
    /// The applied library preferences.
    LibrarySettings(LibrarySettings),
    /// A record created by the gateway, returned as-is.
    Created(Record),
    /// Push endpoint id supplied by the push provider.
    NotificationEndpoint(String),
}

/// Failure payloads.
///
/// Most operations report a fixed [`Failure::Reason`]. Create-user and
/// follow-user report the raw [`Failure::Cause`], which is not safe to show
/// directly. Settings updates report nothing.
#[derive(Debug, Clone, PartialEq)]
pub enum Failure {
    Reason(&'static str),
    Cause(OperationFailure),
    Unspecified,
}

impl Failure {
    /// Wrap any cause convertible into [`OperationFailure`].
    pub fn cause(cause: impl Into<OperationFailure>) -> Self {
        Self::Cause(cause.into())
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Reason(reason) => f.write_str(reason),
            Self::Cause(cause) => cause.fmt(f),
            Self::Unspecified => f.write_str("unspecified failure"),
        }
    }
}

/// Lifecycle phase of an invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum Phase {
    Started,
    Succeeded(Success),
    Failed(Failure),
}

impl Phase {
    /// Whether this phase ends the invocation.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        !matches!(self, Self::Started)
    }

    const fn suffix(&self) -> &'static str {
        match self {
            Self::Started => "STARTED",
            Self::Succeeded(_) => "SUCCESS",
            Self::Failed(_) => "FAIL",
        }
    }
}

/// A single event emitted by an operation.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub invocation: InvocationId,
    pub operation: Operation,
    pub phase: Phase,
}

impl Transition {
    /// Build a transition.
    #[must_use]
    pub fn new(invocation: InvocationId, operation: Operation, phase: Phase) -> Self {
        Self {
            invocation,
            operation,
            phase,
        }
    }

    /// Type tag such as `FETCH_CURRENT_USER_SUCCESS`.
    ///
    /// # Examples
    /// ```
    /// use client::domain::{InvocationId, Operation, Phase, Transition};
    ///
    /// let transition = Transition::new(InvocationId::generate(), Operation::FollowUser, Phase::Started);
    /// assert_eq!(transition.type_tag(), "FOLLOW_USER_STARTED");
    /// ```
    #[must_use]
    pub fn type_tag(&self) -> String {
        format!("{}_{}", self.operation.tag(), self.phase.suffix())
    }

    /// Success payload, if this transition is a success.
    pub fn success(&self) -> Option<&Success> {
        match &self.phase {
            Phase::Succeeded(success) => Some(success),
            _ => None,
        }
    }

    /// Failure payload, if this transition is a failure.
    pub fn failure(&self) -> Option<&Failure> {
        match &self.phase {
            Phase::Failed(failure) => Some(failure),
            _ => None,
        }
    }
}
