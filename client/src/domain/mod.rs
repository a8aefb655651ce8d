//! Domain primitives, orchestration services, and ports.
//!
//! Purpose: model the signed-in account, the transitions that describe every
//! change to it, and the operations that drive those transitions through the
//! remote resource API and the identity authority.
//!
//! Public surface:
//! - AccountService: the orchestrator exposing every account operation.
//! - Store / AccountState / reduce: shared state and its pure reducer.
//! - Transition / Phase / Success / Failure: the transition vocabulary.
//! - ports: driven port traits with fixture implementations.

pub mod account_service;
pub mod auth;
pub mod error;
pub mod identity;
pub mod identity_bridge;
pub mod notification_gate;
pub mod ports;
pub mod records;
pub mod session;
pub mod settings;
pub mod state;
pub mod store;
pub mod transition;
pub mod user;

pub use self::account_service::AccountService;
pub use self::auth::{AccessToken, AuthTokens, LoginCredentials, LoginValidationError, SignUpRequest};
pub use self::error::{OperationFailure, PreconditionError};
pub use self::identity::{PendingThirdPartyRegistration, ThirdPartyId, ThirdPartyProfile};
pub use self::identity_bridge::IdentityBridge;
pub use self::notification_gate::{GateClaim, GateDecision, NotificationGate};
pub use self::session::SessionContext;
pub use self::settings::{LibrarySettings, SettingsPatch, SettingsPatchError};
pub use self::state::{AccountState, AuthState, UserState, reduce};
pub use self::store::{DEFAULT_TRANSITION_BUFFER, OperationRun, Store};
pub use self::transition::{
    Failure, InvocationId, Operation, Phase, Success, Transition, reasons,
};
pub use self::user::{
    AccountStatus, ImageRefs, PROFILE_FIELDS, RatingSystem, TitleLanguagePreference, UserId,
    UserProfile, UserValidationError,
};
