//! Account state and the pure reducer that folds transitions into it.
//!
//! The reducer never performs I/O and never fails: a transition whose payload
//! does not fit its operation leaves the state unchanged.

use serde::Serialize;

use crate::domain::auth::{AccessToken, AuthTokens};
use crate::domain::identity::PendingThirdPartyRegistration;
use crate::domain::session::SessionContext;
use crate::domain::transition::{Failure, Operation, Phase, Success, Transition};
use crate::domain::user::UserProfile;

/// Authentication slice.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthState {
    #[serde(skip)]
    pub tokens: Option<AuthTokens>,
    pub signing_in: bool,
    pub login_error: Option<String>,
}

impl AuthState {
    /// The current access token, if signed in.
    pub fn access_token(&self) -> Option<&AccessToken> {
        self.tokens.as_ref().map(|tokens| &tokens.access_token)
    }

    /// Build a fresh session context from the current token.
    #[must_use]
    pub fn session_context(&self) -> SessionContext {
        let mut context = SessionContext::anonymous();
        if let Some(token) = self.access_token() {
            context.set_credential(token.clone());
        }
        context
    }
}

/// Current user slice.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserState {
    pub current_user: Option<UserProfile>,
    pub loading: bool,
    pub error: Option<String>,
    pub signing_up: bool,
    pub sign_up_error: Option<String>,
    pub connecting_identity: bool,
    pub identity_error: Option<String>,
    pub settings_error: Option<String>,
    pub follow_error: Option<String>,
    #[serde(skip)]
    pub pending_registration: PendingThirdPartyRegistration,
    pub notification_endpoint_id: Option<String>,
    pub notification_registered: bool,
}

/// Everything the orchestrator reads and the UI renders.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AccountState {
    pub auth: AuthState,
    pub user: UserState,
}

impl AccountState {
    /// The active profile, if loaded.
    pub fn current_user(&self) -> Option<&UserProfile> {
        self.user.current_user.as_ref()
    }
}

/// Fold `transition` into `state`.
///
/// # Examples
/// ```
/// use client::domain::{
///     reduce, AccountState, InvocationId, Operation, Phase, Success, Transition,
/// };
///
/// let endpoint = Transition::new(
///     InvocationId::generate(),
///     Operation::RecordNotificationEndpoint,
///     Phase::Succeeded(Success::NotificationEndpoint("player-1".into())),
/// );
/// let state = reduce(AccountState::default(), &endpoint);
/// assert_eq!(state.user.notification_endpoint_id.as_deref(), Some("player-1"));
/// ```
#[must_use]
pub fn reduce(mut state: AccountState, transition: &Transition) -> AccountState {
    match (transition.operation, &transition.phase) {
        (Operation::FetchCurrentUser, phase) => reduce_fetch(&mut state.user, phase),
        (Operation::CreateUser, phase) => reduce_create(&mut state.user, phase),
        (Operation::Login, phase) => reduce_login(&mut state.auth, phase),
        (Operation::CaptureThirdPartyProfile, phase) => reduce_capture(&mut state.user, phase),
        (Operation::ConnectThirdPartyIdentity | Operation::DisconnectThirdPartyIdentity, phase) => {
            reduce_identity_link(&mut state.user, phase);
        }
        (Operation::UpdateGeneralSettings | Operation::UpdateLibrarySettings, phase) => {
            reduce_settings(&mut state.user, phase);
        }
        (Operation::FollowUser, Phase::Started | Phase::Succeeded(_)) => {
            state.user.follow_error = None;
        }
        (Operation::FollowUser, Phase::Failed(failure)) => {
            state.user.follow_error = Some(describe(failure));
        }
        (Operation::RegisterNotificationEndpoint, Phase::Succeeded(_)) => {
            state.user.notification_registered = true;
        }
        (Operation::RegisterNotificationEndpoint, _) => {}
        (
            Operation::RecordNotificationEndpoint,
            Phase::Succeeded(Success::NotificationEndpoint(id)),
        ) => {
            state.user.notification_endpoint_id = Some(id.clone());
        }
        (Operation::RecordNotificationEndpoint, _) => {}
    }
    state
}

fn describe(failure: &Failure) -> String {
    failure.to_string()
}

fn reduce_fetch(user: &mut UserState, phase: &Phase) {
    match phase {
        Phase::Started => {
            user.loading = true;
            user.error = None;
        }
        Phase::Succeeded(Success::Profile(profile)) => {
            user.loading = false;
            user.current_user = Some(profile.clone());
        }
        Phase::Succeeded(_) => user.loading = false,
        Phase::Failed(failure) => {
            user.loading = false;
            user.error = Some(describe(failure));
        }
    }
}

fn reduce_create(user: &mut UserState, phase: &Phase) {
    match phase {
        Phase::Started => {
            user.signing_up = true;
            user.sign_up_error = None;
        }
        Phase::Succeeded(_) => {
            user.signing_up = false;
            user.pending_registration = PendingThirdPartyRegistration::default();
        }
        Phase::Failed(failure) => {
            user.signing_up = false;
            user.sign_up_error = Some(describe(failure));
        }
    }
}

fn reduce_login(auth: &mut AuthState, phase: &Phase) {
    match phase {
        Phase::Started => {
            auth.signing_in = true;
            auth.login_error = None;
        }
        Phase::Succeeded(Success::Tokens(tokens)) => {
            auth.signing_in = false;
            auth.tokens = Some(tokens.clone());
        }
        Phase::Succeeded(_) => auth.signing_in = false,
        Phase::Failed(failure) => {
            auth.signing_in = false;
            auth.login_error = Some(describe(failure));
        }
    }
}

fn reduce_capture(user: &mut UserState, phase: &Phase) {
    match phase {
        Phase::Started => user.identity_error = None,
        Phase::Succeeded(Success::ThirdPartyProfile(profile)) => {
            user.pending_registration = profile.clone().into();
        }
        Phase::Succeeded(_) => {}
        Phase::Failed(failure) => user.identity_error = Some(describe(failure)),
    }
}

fn reduce_identity_link(user: &mut UserState, phase: &Phase) {
    match phase {
        Phase::Started => {
            user.connecting_identity = true;
            user.identity_error = None;
        }
        Phase::Succeeded(success) => {
            user.connecting_identity = false;
            let linked = match success {
                Success::ThirdPartyConnected(id) => Some(id.clone()),
                _ => None,
            };
            if linked.is_some() {
                // The captured identity now belongs to this account.
                user.pending_registration = PendingThirdPartyRegistration::default();
            }
            if let Some(profile) = user.current_user.as_mut() {
                profile.third_party_id = linked;
            }
        }
        Phase::Failed(failure) => {
            user.connecting_identity = false;
            user.identity_error = Some(describe(failure));
        }
    }
}

fn reduce_settings(user: &mut UserState, phase: &Phase) {
    match phase {
        Phase::Started => user.settings_error = None,
        Phase::Succeeded(success) => {
            let Some(profile) = user.current_user.as_mut() else {
                return;
            };
            match success {
                Success::GeneralSettings(patch) => {
                    // Attributes the profile cannot hold stay server-side only.
                    profile.apply_patch(patch);
                }
                Success::LibrarySettings(settings) => profile.apply_library_settings(settings),
                _ => {}
            }
        }
        Phase::Failed(failure) => user.settings_error = Some(describe(failure)),
    }
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
