//! Tests for the account reducer.

use rstest::{fixture, rstest};
use serde_json::json;

use super::*;
use crate::domain::identity::{ThirdPartyId, ThirdPartyProfile};
use crate::domain::ports::RemoteCallError;
use crate::domain::settings::{LibrarySettings, SettingsPatch};
use crate::domain::transition::{InvocationId, reasons};
use crate::domain::user::{RatingSystem, UserId};

fn transition(operation: Operation, phase: Phase) -> Transition {
    Transition::new(InvocationId::generate(), operation, phase)
}

#[fixture]
fn loaded() -> AccountState {
    let mut state = AccountState::default();
    let mut profile = UserProfile::new(UserId::new("1").expect("valid id"), "Ada");
    profile.third_party_id = Some(ThirdPartyId::new("fb-old"));
    state.user.current_user = Some(profile);
    state
}

#[rstest]
fn fetch_failure_keeps_the_previous_profile(loaded: AccountState) {
    let before = loaded.user.current_user.clone();
    let state = reduce(loaded, &transition(Operation::FetchCurrentUser, Phase::Started));
    assert!(state.user.loading);

    let state = reduce(
        state,
        &transition(
            Operation::FetchCurrentUser,
            Phase::Failed(Failure::Reason(reasons::LOAD_USER)),
        ),
    );

    assert!(!state.user.loading);
    assert_eq!(state.user.error.as_deref(), Some("failed to load user"));
    assert_eq!(state.user.current_user, before);
}

#[rstest]
fn create_success_clears_pending_registration() {
    let mut state = AccountState::default();
    state.user.pending_registration = ThirdPartyProfile::with_id("fb-1").into();

    let state = reduce(
        state,
        &transition(Operation::CreateUser, Phase::Succeeded(Success::Acknowledged)),
    );

    assert!(state.user.pending_registration.is_empty());
    assert!(!state.user.signing_up);
}

#[rstest]
fn create_failure_records_the_raw_cause() {
    let state = reduce(
        AccountState::default(),
        &transition(
            Operation::CreateUser,
            Phase::Failed(Failure::cause(RemoteCallError::rejected(422_u16, "taken"))),
        ),
    );
    assert_eq!(
        state.user.sign_up_error.as_deref(),
        Some("gateway call rejected with status 422: taken")
    );
}

#[rstest]
fn login_success_installs_tokens_for_later_contexts() {
    let state = reduce(
        AccountState::default(),
        &transition(
            Operation::Login,
            Phase::Succeeded(Success::Tokens(crate::domain::auth::AuthTokens::bearer("abc"))),
        ),
    );
    let context = state.auth.session_context();
    assert_eq!(
        context.credential().map(crate::domain::auth::AccessToken::expose),
        Some("abc")
    );
}

#[rstest]
#[case(Success::ThirdPartyConnected(ThirdPartyId::new("fb-2")), Operation::ConnectThirdPartyIdentity, Some("fb-2"))]
#[case(Success::Acknowledged, Operation::DisconnectThirdPartyIdentity, None)]
fn identity_links_update_the_profile(
    loaded: AccountState,
    #[case] success: Success,
    #[case] operation: Operation,
    #[case] expected: Option<&str>,
) {
    let state = reduce(loaded, &transition(operation, Phase::Succeeded(success)));
    let linked = state
        .current_user()
        .and_then(|profile| profile.third_party_id.as_ref())
        .map(AsRef::as_ref);
    assert_eq!(linked, expected);
}

#[rstest]
#[case(Operation::ConnectThirdPartyIdentity, Success::ThirdPartyConnected(ThirdPartyId::new("fb-2")), true)]
#[case(Operation::DisconnectThirdPartyIdentity, Success::Acknowledged, false)]
fn connecting_consumes_the_pending_registration(
    mut loaded: AccountState,
    #[case] operation: Operation,
    #[case] success: Success,
    #[case] cleared: bool,
) {
    loaded.user.pending_registration = ThirdPartyProfile::with_id("fb-2").into();

    let state = reduce(loaded, &transition(operation, Phase::Succeeded(success)));

    assert_eq!(state.user.pending_registration.is_empty(), cleared);
}

#[rstest]
fn general_settings_keep_good_attributes_beside_bad_ones(loaded: AccountState) {
    let patch = SettingsPatch::try_from(json!({ "about": "new bio", "sfwFilter": "yes" }))
        .expect("object");
    let state = reduce(
        loaded,
        &transition(
            Operation::UpdateGeneralSettings,
            Phase::Succeeded(Success::GeneralSettings(patch)),
        ),
    );
    let profile = state.current_user().expect("profile");
    assert_eq!(profile.about.as_deref(), Some("new bio"));
    assert_eq!(profile.sfw_filter, None);
    assert_eq!(profile.name, "Ada");
}

#[rstest]
fn general_settings_merge_into_the_profile(loaded: AccountState) {
    let patch = SettingsPatch::try_from(json!({ "about": "hello", "sfwFilter": true }))
        .expect("object");
    let state = reduce(
        loaded,
        &transition(
            Operation::UpdateGeneralSettings,
            Phase::Succeeded(Success::GeneralSettings(patch)),
        ),
    );
    let profile = state.current_user().expect("profile");
    assert_eq!(profile.about.as_deref(), Some("hello"));
    assert_eq!(profile.sfw_filter, Some(true));
}

#[rstest]
fn library_settings_only_touch_preferences(loaded: AccountState) {
    let settings = LibrarySettings {
        rating_system: Some(RatingSystem::Advanced),
        title_language_preference: None,
    };
    let state = reduce(
        loaded,
        &transition(
            Operation::UpdateLibrarySettings,
            Phase::Succeeded(Success::LibrarySettings(settings)),
        ),
    );
    let profile = state.current_user().expect("profile");
    assert_eq!(profile.rating_system, Some(RatingSystem::Advanced));
    assert_eq!(profile.name, "Ada");
}

#[rstest]
fn registration_failure_leaves_the_flag_clear() {
    let state = reduce(
        AccountState::default(),
        &transition(
            Operation::RegisterNotificationEndpoint,
            Phase::Failed(Failure::Reason(reasons::REGISTER_NOTIFICATIONS)),
        ),
    );
    assert!(!state.user.notification_registered);

    let state = reduce(
        state,
        &transition(
            Operation::RegisterNotificationEndpoint,
            Phase::Succeeded(Success::Acknowledged),
        ),
    );
    assert!(state.user.notification_registered);
}

#[rstest]
fn serialised_state_never_carries_tokens() {
    let mut state = AccountState::default();
    state.auth.tokens = Some(crate::domain::auth::AuthTokens::bearer("secret-token"));
    let rendered = serde_json::to_string(&state).expect("state serialises");
    assert!(!rendered.contains("secret-token"));
}
