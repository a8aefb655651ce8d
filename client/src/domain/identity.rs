//! Third-party identity values shared by the bridge and the sign-up flow.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier issued by the external identity authority.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ThirdPartyId(String);

impl ThirdPartyId {
    /// Wrap an authority-issued identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl AsRef<str> for ThirdPartyId {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for ThirdPartyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Profile data returned by the identity authority.
///
/// Only the identifier is guaranteed; the authority may withhold the rest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThirdPartyProfile {
    pub id: ThirdPartyId,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub gender: Option<String>,
}

impl ThirdPartyProfile {
    /// Profile carrying only an identifier.
    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: ThirdPartyId::new(id),
            email: None,
            name: None,
            gender: None,
        }
    }
}

/// Third-party details captured before sign-up and consumed exactly once by
/// the create-user flow.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PendingThirdPartyRegistration {
    pub id: Option<ThirdPartyId>,
    pub gender: Option<String>,
    pub email: Option<String>,
    pub name: Option<String>,
}

impl PendingThirdPartyRegistration {
    /// Returns `true` when nothing has been captured.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

impl From<ThirdPartyProfile> for PendingThirdPartyRegistration {
    fn from(profile: ThirdPartyProfile) -> Self {
        Self {
            id: Some(profile.id),
            gender: profile.gender,
            email: profile.email,
            name: profile.name,
        }
    }
}
