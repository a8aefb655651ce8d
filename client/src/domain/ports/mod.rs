//! Domain ports and supporting types for the hexagonal boundary.

mod macros;
pub(crate) use macros::define_port_error;

mod identity_authority;
mod login_service;
mod resource_gateway;

#[cfg(test)]
pub use identity_authority::MockIdentityAuthority;
pub use identity_authority::{
    BridgeError, FixtureIdentityAuthority, IdentityAuthority, ProfileCallback,
};
#[cfg(test)]
pub use login_service::MockLoginService;
pub use login_service::{FixtureLoginService, LoginError, LoginService};
#[cfg(test)]
pub use resource_gateway::MockResourceGateway;
pub use resource_gateway::{
    Collection, FixtureResourceGateway, Record, RemoteCallError, ResourceGateway,
};
