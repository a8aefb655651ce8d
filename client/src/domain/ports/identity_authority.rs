//! Driven port for the external identity authority.
//!
//! The authority is callback-driven: a profile request hands it a completion
//! callback and returns immediately. Authorities are known to invoke the
//! callback more than once, so the callback is `FnMut`; the identity bridge
//! is responsible for settling exactly once.

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::define_port_error;
use crate::domain::identity::ThirdPartyProfile;

define_port_error! {
    /// Failures reported by the identity authority or the bridge around it.
    pub enum BridgeError {
        /// The person declined the authority's prompt.
        Cancelled => "identity request was cancelled",
        /// The authority reported an error.
        Authority { message: String } => "identity authority failed: {message}",
        /// The authority dropped the callback without ever invoking it.
        Abandoned => "identity authority abandoned the request",
    }
}

/// Completion callback handed to [`IdentityAuthority::request_profile`].
pub type ProfileCallback = Box<dyn FnMut(Result<ThirdPartyProfile, BridgeError>) + Send>;

/// Callback-style identity authority SDK.
#[cfg_attr(test, mockall::automock)]
pub trait IdentityAuthority: Send + Sync {
    /// Ask the authority for the signed-in person's profile.
    fn request_profile(&self, callback: ProfileCallback);

    /// Invalidate the authority's local session.
    fn log_out(&self);
}

/// Scripted authority that answers synchronously.
///
/// Every scripted outcome is delivered, in order, to the callback of the
/// next request, which lets tests reproduce duplicate callbacks.
#[derive(Debug, Default)]
pub struct FixtureIdentityAuthority {
    outcomes: Mutex<Vec<Result<ThirdPartyProfile, BridgeError>>>,
    log_outs: AtomicUsize,
}

impl FixtureIdentityAuthority {
    /// Authority that answers the next request with `profile`.
    pub fn answering(profile: ThirdPartyProfile) -> Self {
        Self::scripted([Ok(profile)])
    }

    /// Authority that delivers every outcome to the next request's callback.
    pub fn scripted(
        outcomes: impl IntoIterator<Item = Result<ThirdPartyProfile, BridgeError>>,
    ) -> Self {
        Self {
            outcomes: Mutex::new(outcomes.into_iter().collect()),
            log_outs: AtomicUsize::new(0),
        }
    }

    /// Number of times [`IdentityAuthority::log_out`] was called.
    pub fn log_out_count(&self) -> usize {
        self.log_outs.load(Ordering::SeqCst)
    }
}

impl IdentityAuthority for FixtureIdentityAuthority {
    fn request_profile(&self, mut callback: ProfileCallback) {
        let outcomes = std::mem::take(
            &mut *self
                .outcomes
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner),
        );
        for outcome in outcomes {
            callback(outcome);
        }
    }

    fn log_out(&self) {
        self.log_outs.fetch_add(1, Ordering::SeqCst);
    }
}
