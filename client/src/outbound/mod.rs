//! Outbound adapters implementing domain ports over HTTP.
//!
//! - **jsonapi**: the resource gateway speaking JSON:API.
//! - **oauth**: the login service performing OAuth2 password grants.
//!
//! Adapters are thin translators between domain records and wire formats.
//! They contain no orchestration logic.

pub mod jsonapi;
pub mod oauth;

pub use jsonapi::JsonApiGateway;
pub use oauth::{OAuthClientCredentials, OAuthLoginService};
