//! One-time gate in front of notification endpoint registration.
//!
//! The persisted `notification_registered` flag in account state is the
//! source of truth. An in-flight claim additionally stops two overlapping
//! profile fetches from both issuing the registration call before the flag
//! flips.

use std::sync::atomic::{AtomicBool, Ordering};

use crate::domain::error::PreconditionError;
use crate::domain::state::AccountState;
use crate::domain::user::UserId;

/// Outcome of asking the gate whether registration should run.
#[derive(Debug)]
pub enum GateDecision<'a> {
    /// Registration should run now, holding this claim until it settles.
    Register(GateClaim<'a>),
    /// The endpoint is already registered for this session.
    AlreadyRegistered,
    /// Another registration is in flight.
    InFlight,
    /// The push provider has not supplied an endpoint id yet.
    NoEndpoint,
}

/// Gate state shared by every fetch in a session.
#[derive(Debug, Default)]
pub struct NotificationGate {
    in_flight: AtomicBool,
}

impl NotificationGate {
    /// Decide whether registration should run for `state`.
    ///
    /// # Errors
    ///
    /// Returns [`PreconditionError::ProfileNotLoaded`] when the flag is clear
    /// but no active profile exists.
    pub fn evaluate(&self, state: &AccountState) -> Result<GateDecision<'_>, PreconditionError> {
        if state.user.notification_registered {
            return Ok(GateDecision::AlreadyRegistered);
        }
        let user = state
            .current_user()
            .map(|profile| profile.id.clone())
            .ok_or(PreconditionError::ProfileNotLoaded)?;
        let Some(endpoint_id) = state.user.notification_endpoint_id.clone() else {
            return Ok(GateDecision::NoEndpoint);
        };
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Ok(GateDecision::InFlight);
        }
        Ok(GateDecision::Register(GateClaim {
            gate: self,
            endpoint_id,
            user,
        }))
    }

    /// Whether a registration currently holds the claim.
    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }
}

/// Exclusive right to issue the registration call. Released on drop.
#[derive(Debug)]
pub struct GateClaim<'a> {
    gate: &'a NotificationGate,
    endpoint_id: String,
    user: UserId,
}

impl GateClaim<'_> {
    /// Push endpoint id to register.
    pub fn endpoint_id(&self) -> &str {
        &self.endpoint_id
    }

    /// Profile the endpoint belongs to.
    pub fn user(&self) -> &UserId {
        &self.user
    }
}

impl Drop for GateClaim<'_> {
    fn drop(&mut self) {
        self.gate.in_flight.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use crate::domain::user::UserProfile;
    use rstest::{fixture, rstest};

    #[fixture]
    fn ready() -> AccountState {
        let mut state = AccountState::default();
        state.user.current_user = Some(UserProfile::new(
            UserId::new("1").expect("valid id"),
            "Ada",
        ));
        state.user.notification_endpoint_id = Some("player-1".to_owned());
        state
    }

    #[rstest]
    fn registered_sessions_are_skipped_silently() {
        let mut state = AccountState::default();
        state.user.notification_registered = true;
        let gate = NotificationGate::default();
        assert!(matches!(
            gate.evaluate(&state),
            Ok(GateDecision::AlreadyRegistered)
        ));
    }

    #[rstest]
    fn missing_profiles_violate_the_precondition() {
        let gate = NotificationGate::default();
        assert!(matches!(
            gate.evaluate(&AccountState::default()),
            Err(PreconditionError::ProfileNotLoaded)
        ));
    }

    #[rstest]
    fn missing_endpoints_skip_registration(mut ready: AccountState) {
        ready.user.notification_endpoint_id = None;
        let gate = NotificationGate::default();
        assert!(matches!(gate.evaluate(&ready), Ok(GateDecision::NoEndpoint)));
    }

    #[rstest]
    fn claims_are_exclusive_until_dropped(ready: AccountState) {
        let gate = NotificationGate::default();
        let claim = match gate.evaluate(&ready).expect("gate decision") {
            GateDecision::Register(claim) => claim,
            other => panic!("expected a claim, got {other:?}"),
        };
        assert_eq!(claim.endpoint_id(), "player-1");
        assert_eq!(claim.user().as_str(), "1");
        assert!(matches!(gate.evaluate(&ready), Ok(GateDecision::InFlight)));

        drop(claim);

        assert!(!gate.is_in_flight());
        assert!(matches!(gate.evaluate(&ready), Ok(GateDecision::Register(_))));
    }
}
