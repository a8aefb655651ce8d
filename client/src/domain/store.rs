//! Shared account store.
//!
//! The store owns [`AccountState`], applies [`reduce`] to each dispatched
//! transition and fans transitions out to subscribers. Operations never touch
//! the state directly; they open an [`OperationRun`] and settle it.

use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::domain::state::{AccountState, reduce};
use crate::domain::transition::{
    Failure, InvocationId, Operation, Phase, Success, Transition, reasons,
};

/// Default capacity of the transition broadcast channel.
pub const DEFAULT_TRANSITION_BUFFER: usize = 64;

/// Account state plus the transition fan-out.
#[derive(Debug)]
pub struct Store {
    state: Mutex<AccountState>,
    transitions: broadcast::Sender<Transition>,
}

impl Default for Store {
    fn default() -> Self {
        Self::new(AccountState::default(), DEFAULT_TRANSITION_BUFFER)
    }
}

impl Store {
    /// Store seeded with `state`; `buffer` bounds how far a slow subscriber
    /// may lag before it starts missing transitions.
    #[must_use]
    pub fn new(state: AccountState, buffer: usize) -> Self {
        let (transitions, _) = broadcast::channel(buffer.max(1));
        Self {
            state: Mutex::new(state),
            transitions,
        }
    }

    fn lock(&self) -> MutexGuard<'_, AccountState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Copy of the current state.
    #[must_use]
    pub fn snapshot(&self) -> AccountState {
        self.lock().clone()
    }

    /// Read a projection of the current state without cloning all of it.
    pub fn read<T>(&self, f: impl FnOnce(&AccountState) -> T) -> T {
        f(&self.lock())
    }

    /// Receive every transition dispatched from now on.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<Transition> {
        self.transitions.subscribe()
    }

    /// Apply `transition` to the state and publish it.
    pub fn dispatch(&self, transition: Transition) {
        {
            let mut state = self.lock();
            let current = std::mem::take(&mut *state);
            *state = reduce(current, &transition);
        }
        // The state is already updated when nobody is listening.
        if let Err(broadcast::error::SendError(unheard)) = self.transitions.send(transition) {
            debug!(tag = %unheard.type_tag(), "no transition subscribers");
        }
    }

    /// Emit `Started` for `operation` and return the guard that settles it.
    pub fn begin(&self, operation: Operation) -> OperationRun<'_> {
        let invocation = InvocationId::generate();
        debug!(%operation, %invocation, "operation started");
        self.dispatch(Transition::new(invocation, operation, Phase::Started));
        OperationRun {
            store: self,
            invocation,
            operation,
            settled: false,
        }
    }
}

/// An in-flight invocation that must end in exactly one terminal transition.
///
/// Dropping an unsettled run (a cancelled future, a panic) emits
/// `Failed(Reason("operation abandoned"))`.
#[derive(Debug)]
#[must_use = "an operation run must be settled with succeed or fail"]
pub struct OperationRun<'a> {
    store: &'a Store,
    invocation: InvocationId,
    operation: Operation,
    settled: bool,
}

impl OperationRun<'_> {
    /// Identifier shared by every transition of this run.
    pub fn invocation(&self) -> InvocationId {
        self.invocation
    }

    /// Emit the success transition and return it.
    pub fn succeed(mut self, success: Success) -> Transition {
        info!(operation = %self.operation, invocation = %self.invocation, "operation succeeded");
        self.settle(Phase::Succeeded(success))
    }

    /// Emit the failure transition and return it.
    pub fn fail(mut self, failure: Failure) -> Transition {
        warn!(
            operation = %self.operation,
            invocation = %self.invocation,
            %failure,
            "operation failed"
        );
        self.settle(Phase::Failed(failure))
    }

    fn settle(&mut self, phase: Phase) -> Transition {
        self.settled = true;
        let transition = Transition::new(self.invocation, self.operation, phase);
        self.store.dispatch(transition.clone());
        transition
    }
}

impl Drop for OperationRun<'_> {
    fn drop(&mut self) {
        if !self.settled {
            warn!(operation = %self.operation, invocation = %self.invocation, "operation abandoned");
            self.settle(Phase::Failed(Failure::Reason(reasons::ABANDONED)));
        }
    }
}
