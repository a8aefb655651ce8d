//! Account orchestrator.
//!
//! Each public operation opens an [`OperationRun`](crate::domain::OperationRun)
//! on the store, performs its gateway or bridge calls strictly in sequence,
//! and settles the run with exactly one terminal transition. Operations never
//! return errors: every failure is converted into the operation's `Failed`
//! transition, which is also returned to the caller.
//!
//! A [`SessionContext`] is rebuilt from the auth slice at the start of every
//! operation that needs one; nothing is cached across operations.

use std::sync::Arc;

use resource_query::{QueryError, ResourceQuery};
use tracing::{debug, warn};

use crate::domain::auth::{LoginCredentials, LoginValidationError, SignUpRequest};
use crate::domain::error::{OperationFailure, PreconditionError};
use crate::domain::identity::ThirdPartyId;
use crate::domain::identity_bridge::IdentityBridge;
use crate::domain::notification_gate::{GateClaim, GateDecision, NotificationGate};
use crate::domain::ports::{
    Collection, IdentityAuthority, LoginError, LoginService, Record, RemoteCallError,
    ResourceGateway,
};
use crate::domain::records;
use crate::domain::session::SessionContext;
use crate::domain::settings::{LibrarySettings, SettingsPatch};
use crate::domain::store::{OperationRun, Store};
use crate::domain::transition::{Failure, Operation, Success, Transition, reasons};
use crate::domain::user::{PROFILE_FIELDS, UserId, UserProfile};

/// Orchestrates account operations over the driven ports.
pub struct AccountService<G, A, L> {
    store: Arc<Store>,
    gateway: Arc<G>,
    bridge: IdentityBridge<A>,
    login: Arc<L>,
    gate: Arc<NotificationGate>,
}

impl<G, A, L> Clone for AccountService<G, A, L> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            gateway: Arc::clone(&self.gateway),
            bridge: self.bridge.clone(),
            login: Arc::clone(&self.login),
            gate: Arc::clone(&self.gate),
        }
    }
}

impl<G, A, L> AccountService<G, A, L>
where
    G: ResourceGateway,
    A: IdentityAuthority,
    L: LoginService,
{
    /// Create a service for one session.
    pub fn new(store: Arc<Store>, gateway: Arc<G>, authority: Arc<A>, login: Arc<L>) -> Self {
        Self {
            store,
            gateway,
            bridge: IdentityBridge::new(authority),
            login,
            gate: Arc::new(NotificationGate::default()),
        }
    }

    /// The store this service dispatches into.
    pub fn store(&self) -> &Arc<Store> {
        &self.store
    }

    fn session_context(&self) -> SessionContext {
        self.store.read(|state| state.auth.session_context())
    }

    fn active_profile_id(&self) -> Result<UserId, PreconditionError> {
        self.store
            .read(|state| state.current_user().map(|profile| profile.id.clone()))
            .ok_or(PreconditionError::ProfileNotLoaded)
    }

    fn profile_query() -> Result<ResourceQuery, QueryError> {
        ResourceQuery::builder()
            .fields(Collection::USERS.name(), PROFILE_FIELDS.iter().copied())
            .filter("self", true)
            .build()
    }

    /// Load the signed-in user's profile, then run the notification gate.
    ///
    /// The returned transition is the fetch's own terminal transition; any
    /// registration transitions follow it on the store.
    pub async fn fetch_current_user(&self) -> Transition {
        let run = self.store.begin(Operation::FetchCurrentUser);
        let context = self.session_context();
        let terminal = match self.load_profile(&context).await {
            Ok(profile) => run.succeed(Success::Profile(profile)),
            Err(err) => {
                warn!(error = %err, kind = err.kind(), "profile fetch failed");
                return run.fail(Failure::Reason(reasons::LOAD_USER));
            }
        };
        if let Err(err) = self.register_notifications_with(&context).await {
            warn!(error = %err, "notification gate invoked without a profile");
        }
        terminal
    }

    async fn load_profile(&self, context: &SessionContext) -> Result<UserProfile, OperationFailure> {
        context.require_credential()?;
        let query = Self::profile_query()
            .map_err(|err| RemoteCallError::invalid_request(err.to_string()))?;
        let records = self
            .gateway
            .find_all(context, Collection::USERS, &query)
            .await?;
        let [record] = <[Record; 1]>::try_from(records).map_err(|records| {
            RemoteCallError::decode(format!("expected exactly one user, got {}", records.len()))
        })?;
        Ok(record.decode()?)
    }

    /// Run the notification gate on its own.
    ///
    /// Returns the registration's terminal transition when the gate let it
    /// through, or `None` when the gate skipped silently.
    ///
    /// # Errors
    ///
    /// Returns [`PreconditionError::ProfileNotLoaded`] when no profile has
    /// been loaded and registration is still outstanding.
    pub async fn register_notifications(&self) -> Result<Option<Transition>, PreconditionError> {
        let context = self.session_context();
        self.register_notifications_with(&context).await
    }

    async fn register_notifications_with(
        &self,
        context: &SessionContext,
    ) -> Result<Option<Transition>, PreconditionError> {
        let decision = self.store.read(|state| self.gate.evaluate(state))?;
        match decision {
            GateDecision::Register(claim) => {
                Ok(Some(self.register_notification_endpoint(context, claim).await))
            }
            GateDecision::NoEndpoint => {
                debug!("notification registration skipped: no endpoint id yet");
                Ok(None)
            }
            skipped => {
                debug!(decision = ?skipped, "notification registration skipped");
                Ok(None)
            }
        }
    }

    async fn register_notification_endpoint(
        &self,
        context: &SessionContext,
        claim: GateClaim<'_>,
    ) -> Transition {
        let run = self.store.begin(Operation::RegisterNotificationEndpoint);
        let record = records::notification_endpoint(claim.endpoint_id(), claim.user());
        let terminal = match self
            .gateway
            .create(context, Collection::NOTIFICATION_ENDPOINTS, record)
            .await
        {
            Ok(_) => run.succeed(Success::Acknowledged),
            Err(err) => {
                warn!(
                    error = %err,
                    kind = err.kind(),
                    collection = %Collection::NOTIFICATION_ENDPOINTS,
                    "notification registration failed"
                );
                run.fail(Failure::Reason(reasons::REGISTER_NOTIFICATIONS))
            }
        };
        drop(claim);
        terminal
    }

    /// Store the push endpoint id supplied by the push provider.
    pub fn record_notification_endpoint(&self, endpoint_id: impl Into<String>) -> Transition {
        self.store
            .begin(Operation::RecordNotificationEndpoint)
            .succeed(Success::NotificationEndpoint(endpoint_id.into()))
    }

    /// Create an account, then log in with the submitted email and password.
    ///
    /// A captured third-party id and gender are attached to the new record.
    /// The login's `Started` transition precedes the create-user success and
    /// its terminal transition follows it. Failures carry the raw cause.
    pub async fn create_user(&self, request: SignUpRequest) -> Transition {
        let run = self.store.begin(Operation::CreateUser);
        let pending = self
            .store
            .read(|state| state.user.pending_registration.clone());
        let outcome = async {
            let record = records::new_user(&request, &pending)?;
            self.gateway
                .create(&SessionContext::anonymous(), Collection::USERS, record)
                .await
        }
        .await;
        if let Err(err) = outcome {
            return run.fail(Failure::cause(err));
        }

        let login = self.store.begin(Operation::Login);
        let terminal = run.succeed(Success::Acknowledged);
        self.complete_login(login, request.login_credentials()).await;
        terminal
    }

    /// Exchange credentials for tokens and store them in the auth slice.
    pub async fn login(&self, credentials: LoginCredentials) -> Transition {
        let run = self.store.begin(Operation::Login);
        self.complete_login(run, Ok(credentials)).await
    }

    async fn complete_login(
        &self,
        run: OperationRun<'_>,
        credentials: Result<LoginCredentials, LoginValidationError>,
    ) -> Transition {
        let credentials = match credentials {
            Ok(credentials) => credentials,
            Err(err) => {
                warn!(error = %err, "login credentials rejected");
                return run.fail(Failure::Reason(reasons::LOG_IN));
            }
        };
        match self.login.authenticate(&credentials).await {
            Ok(tokens) => run.succeed(Success::Tokens(tokens)),
            Err(LoginError::InvalidCredentials) => {
                run.fail(Failure::Reason(reasons::INVALID_CREDENTIALS))
            }
            Err(err) => {
                warn!(error = %err, kind = err.kind(), "login failed");
                run.fail(Failure::Reason(reasons::LOG_IN))
            }
        }
    }

    /// Ask the identity authority for a profile and keep it as the pending
    /// third-party registration.
    pub async fn capture_third_party_profile(&self) -> Transition {
        let run = self.store.begin(Operation::CaptureThirdPartyProfile);
        match self.bridge.fetch_profile().await {
            Ok(profile) => run.succeed(Success::ThirdPartyProfile(profile)),
            Err(err) => {
                warn!(error = %err, kind = err.kind(), "identity profile request failed");
                run.fail(Failure::Reason(reasons::LOAD_IDENTITY_PROFILE))
            }
        }
    }

    /// Link the authority's identity to the active profile.
    ///
    /// The update is never attempted when the authority fails.
    pub async fn connect_third_party_identity(&self) -> Transition {
        let run = self.store.begin(Operation::ConnectThirdPartyIdentity);
        match self.link_third_party().await {
            Ok(id) => run.succeed(Success::ThirdPartyConnected(id)),
            Err(err) => {
                warn!(error = %err, kind = err.kind(), "identity connection failed");
                run.fail(Failure::Reason(reasons::CONNECT_IDENTITY))
            }
        }
    }

    async fn link_third_party(&self) -> Result<ThirdPartyId, OperationFailure> {
        let profile = self.bridge.fetch_profile().await?;
        let context = self.session_context();
        context.require_credential()?;
        let user = self.active_profile_id()?;
        self.gateway
            .update(
                &context,
                Collection::USERS,
                records::third_party_link(&user, Some(&profile.id)),
            )
            .await?;
        Ok(profile.id)
    }

    /// Unlink the third-party identity, then invalidate the authority session.
    pub async fn disconnect_third_party_identity(&self) -> Transition {
        let run = self.store.begin(Operation::DisconnectThirdPartyIdentity);
        match self.unlink_third_party().await {
            Ok(()) => {
                let terminal = run.succeed(Success::Acknowledged);
                self.bridge.invalidate_session();
                terminal
            }
            Err(err) => {
                warn!(error = %err, kind = err.kind(), "identity disconnection failed");
                run.fail(Failure::Reason(reasons::DISCONNECT_IDENTITY))
            }
        }
    }

    async fn unlink_third_party(&self) -> Result<(), OperationFailure> {
        let context = self.session_context();
        context.require_credential()?;
        let user = self.active_profile_id()?;
        self.gateway
            .update(&context, Collection::USERS, records::third_party_link(&user, None))
            .await?;
        Ok(())
    }

    /// Merge `data` into the active profile.
    ///
    /// The password, if any, is sent to the gateway but removed from the
    /// success payload.
    pub async fn update_general_settings(&self, data: SettingsPatch) -> Transition {
        let run = self.store.begin(Operation::UpdateGeneralSettings);
        let outcome = self
            .patch_profile(|user| Ok(records::general_settings(user, &data)))
            .await;
        match outcome {
            Ok(()) => run.succeed(Success::GeneralSettings(data.without_password())),
            Err(err) => {
                warn!(error = %err, kind = err.kind(), "general settings update failed");
                run.fail(Failure::Unspecified)
            }
        }
    }

    /// Update the rating system and title language preferences from `data`,
    /// ignoring every other key.
    pub async fn update_library_settings(&self, data: SettingsPatch) -> Transition {
        let run = self.store.begin(Operation::UpdateLibrarySettings);
        let settings = match LibrarySettings::from_patch(&data) {
            Ok(settings) => settings,
            Err(err) => {
                warn!(error = %err, "library settings rejected");
                return run.fail(Failure::Unspecified);
            }
        };
        let outcome = self
            .patch_profile(|user| records::library_settings(user, &settings))
            .await;
        match outcome {
            Ok(()) => run.succeed(Success::LibrarySettings(settings)),
            Err(err) => {
                warn!(error = %err, kind = err.kind(), "library settings update failed");
                run.fail(Failure::Unspecified)
            }
        }
    }

    async fn patch_profile(
        &self,
        build: impl FnOnce(&UserId) -> Result<Record, RemoteCallError>,
    ) -> Result<(), OperationFailure> {
        let context = self.session_context();
        context.require_credential()?;
        let user = self.active_profile_id()?;
        let record = build(&user)?;
        self.gateway
            .update(&context, Collection::USERS, record)
            .await?;
        Ok(())
    }

    /// Follow `target` as the active profile. Failures carry the raw cause.
    pub async fn follow_user(&self, target: UserId) -> Transition {
        let run = self.store.begin(Operation::FollowUser);
        match self.create_follow(&target).await {
            Ok(record) => run.succeed(Success::Created(record)),
            Err(err) => run.fail(Failure::Cause(err)),
        }
    }

    async fn create_follow(&self, target: &UserId) -> Result<Record, OperationFailure> {
        let context = self.session_context();
        context.require_credential()?;
        let follower = self.active_profile_id()?;
        Ok(self
            .gateway
            .create(&context, Collection::FOLLOWS, records::follow(&follower, target))
            .await?)
    }
}

#[cfg(test)]
#[path = "account_service_tests.rs"]
mod tests;
