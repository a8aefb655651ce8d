//! Single-shot future over the callback-driven identity authority.

use std::sync::Arc;

use tokio::sync::oneshot;
use tracing::debug;

use crate::domain::identity::ThirdPartyProfile;
use crate::domain::ports::{BridgeError, IdentityAuthority};

/// Adapts an [`IdentityAuthority`] into awaitable calls.
///
/// Each profile request settles exactly once: the first callback wins, later
/// callbacks are dropped, and a callback that is never invoked resolves as
/// [`BridgeError::Abandoned`].
pub struct IdentityBridge<A> {
    authority: Arc<A>,
}

impl<A> Clone for IdentityBridge<A> {
    fn clone(&self) -> Self {
        Self {
            authority: Arc::clone(&self.authority),
        }
    }
}

impl<A> IdentityBridge<A>
where
    A: IdentityAuthority,
{
    /// Wrap `authority`.
    pub fn new(authority: Arc<A>) -> Self {
        Self { authority }
    }

    /// Request the signed-in person's profile from the authority.
    pub async fn fetch_profile(&self) -> Result<ThirdPartyProfile, BridgeError> {
        let (sender, receiver) = oneshot::channel();
        let mut pending = Some(sender);
        self.authority.request_profile(Box::new(move |outcome| {
            let Some(sender) = pending.take() else {
                debug!("ignoring repeated identity authority callback");
                return;
            };
            if sender.send(outcome).is_err() {
                debug!("identity profile request was no longer awaited");
            }
        }));
        receiver
            .await
            .unwrap_or_else(|_| Err(BridgeError::abandoned()))
    }

    /// Invalidate the authority's local session.
    pub fn invalidate_session(&self) {
        self.authority.log_out();
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use crate::domain::ports::MockIdentityAuthority;
    use rstest::rstest;

    fn bridge(authority: MockIdentityAuthority) -> IdentityBridge<MockIdentityAuthority> {
        IdentityBridge::new(Arc::new(authority))
    }

    #[rstest]
    #[tokio::test]
    async fn first_callback_wins() {
        let mut authority = MockIdentityAuthority::new();
        authority
            .expect_request_profile()
            .times(1)
            .returning(|mut callback| {
                callback(Ok(ThirdPartyProfile::with_id("fb-1")));
                callback(Err(BridgeError::cancelled()));
                callback(Ok(ThirdPartyProfile::with_id("fb-2")));
            });

        let profile = bridge(authority).fetch_profile().await.expect("profile");
        assert_eq!(profile.id.as_ref(), "fb-1");
    }

    #[rstest]
    #[tokio::test]
    async fn callbacks_from_other_threads_resolve_the_request() {
        let mut authority = MockIdentityAuthority::new();
        authority
            .expect_request_profile()
            .times(1)
            .returning(|mut callback| {
                std::thread::spawn(move || {
                    callback(Err(BridgeError::authority("graph request failed")));
                });
            });

        let err = bridge(authority).fetch_profile().await.expect_err("error");
        assert_eq!(err, BridgeError::authority("graph request failed"));
    }

    #[rstest]
    #[tokio::test]
    async fn dropped_callbacks_resolve_as_abandoned() {
        let mut authority = MockIdentityAuthority::new();
        authority
            .expect_request_profile()
            .times(1)
            .returning(|_callback| {});

        let err = bridge(authority).fetch_profile().await.expect_err("abandoned");
        assert_eq!(err, BridgeError::Abandoned);
    }

    #[rstest]
    fn invalidation_logs_out_of_the_authority() {
        let mut authority = MockIdentityAuthority::new();
        authority.expect_log_out().times(1).return_const(());
        bridge(authority).invalidate_session();
    }
}
