//! Test utilities for the client crate.
//!
//! Shared by unit tests and integration tests. Only compiled with the
//! `test-support` feature.

use tokio::sync::broadcast;

use crate::domain::{AccountState, AuthTokens, Transition, UserId, UserProfile};

/// Drain every transition currently buffered in `receiver`.
pub fn drain(receiver: &mut broadcast::Receiver<Transition>) -> Vec<Transition> {
    std::iter::from_fn(|| receiver.try_recv().ok()).collect()
}

/// Drain `receiver` and render each transition as its type tag.
pub fn drain_tags(receiver: &mut broadcast::Receiver<Transition>) -> Vec<String> {
    drain(receiver)
        .iter()
        .map(Transition::type_tag)
        .collect()
}

/// State for a signed-in session with an already loaded profile.
///
/// # Panics
///
/// Panics when `profile_id` is not a valid user id.
#[must_use]
pub fn signed_in_state(profile_id: &str, token: &str) -> AccountState {
    let mut state = AccountState::default();
    state.auth.tokens = Some(AuthTokens::bearer(token));
    let id = UserId::new(profile_id).unwrap_or_else(|err| panic!("invalid fixture id: {err}"));
    state.user.current_user = Some(UserProfile::new(id, "Fixture User"));
    state
}
