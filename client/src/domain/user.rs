//! User profile data model.
//!
//! The profile is owned by the account state and is replaced wholesale by a
//! profile fetch, then patched in place by settings updates. Wire names follow
//! the remote API (`camelCase`, with the linked identity stored under
//! `facebookId`).

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::domain::identity::ThirdPartyId;
use crate::domain::settings::{LibrarySettings, SettingsPatch};

/// Attributes requested whenever the active profile is loaded.
pub const PROFILE_FIELDS: &[&str] = &[
    "id",
    "name",
    "createdAt",
    "email",
    "avatar",
    "coverImage",
    "about",
    "ratingSystem",
    "shareToGlobal",
    "sfwFilter",
    "facebookId",
    "titleLanguagePreference",
    "status",
];

/// Validation errors returned by [`UserId::new`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserValidationError {
    EmptyId,
    InvalidId,
}

impl fmt::Display for UserValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyId => write!(f, "user id must not be empty"),
            Self::InvalidId => write!(f, "user id must not contain whitespace"),
        }
    }
}

impl std::error::Error for UserValidationError {}

/// Opaque user identifier assigned by the remote API.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserId(String);

impl UserId {
    /// Validate and construct a [`UserId`].
    ///
    /// # Examples
    /// ```
    /// use client::domain::UserId;
    ///
    /// let id = UserId::new("42").expect("valid id");
    /// assert_eq!(id.as_ref(), "42");
    /// assert!(UserId::new(" 42").is_err());
    /// ```
    pub fn new(id: impl Into<String>) -> Result<Self, UserValidationError> {
        let id = id.into();
        if id.is_empty() {
            return Err(UserValidationError::EmptyId);
        }
        if id.chars().any(char::is_whitespace) {
            return Err(UserValidationError::InvalidId);
        }
        Ok(Self(id))
    }

    /// Borrow the identifier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for UserId {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<UserId> for String {
    fn from(value: UserId) -> Self {
        value.0
    }
}

impl TryFrom<String> for UserId {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// How the user prefers to rate library entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RatingSystem {
    Simple,
    Regular,
    Advanced,
    #[serde(other)]
    Unknown,
}

/// Which title variant the user wants displayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TitleLanguagePreference {
    Canonical,
    Romanized,
    English,
    #[serde(other)]
    Unknown,
}

/// Account lifecycle status reported by the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountStatus {
    Registered,
    Aggregated,
    Unregistered,
    #[serde(other)]
    Unknown,
}

/// Image renditions for avatars and cover images.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRefs {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tiny: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub small: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub medium: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub large: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original: Option<String>,
}

/// The signed-in user's profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: UserId,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub name: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub avatar: Option<ImageRefs>,
    #[serde(default)]
    pub cover_image: Option<ImageRefs>,
    #[serde(default)]
    pub about: Option<String>,
    #[serde(default)]
    pub rating_system: Option<RatingSystem>,
    #[serde(default)]
    pub share_to_global: Option<bool>,
    #[serde(default)]
    pub sfw_filter: Option<bool>,
    /// Linked third-party identity, `None` when disconnected.
    #[serde(default, rename = "facebookId")]
    pub third_party_id: Option<ThirdPartyId>,
    #[serde(default)]
    pub title_language_preference: Option<TitleLanguagePreference>,
    #[serde(default)]
    pub status: Option<AccountStatus>,
}

impl UserProfile {
    /// Minimal profile with only an identifier and display name.
    pub fn new(id: UserId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            created_at: None,
            email: None,
            avatar: None,
            cover_image: None,
            about: None,
            rating_system: None,
            share_to_global: None,
            sfw_filter: None,
            third_party_id: None,
            title_language_preference: None,
            status: None,
        }
    }

    /// Merge a settings patch into the profile, one attribute at a time.
    ///
    /// The identifier is never replaced and keys that are not profile
    /// attributes are ignored. An attribute whose value does not fit the
    /// profile is skipped without affecting the others; the skipped keys are
    /// returned.
    pub fn apply_patch(&mut self, patch: &SettingsPatch) -> Vec<String> {
        let mut rejected = Vec::new();
        for (key, value) in patch.iter().filter(|(key, _)| key.as_str() != "id") {
            match self.with_attribute(key, value) {
                Some(updated) => *self = updated,
                None => rejected.push(key.clone()),
            }
        }
        rejected
    }

    fn with_attribute(&self, key: &str, value: &Value) -> Option<Self> {
        let mut document = serde_json::to_value(self).ok()?;
        document
            .as_object_mut()?
            .insert(key.to_owned(), value.clone());
        serde_json::from_value(document).ok()
    }

    /// Apply the two library preferences, keeping current values for absent
    /// ones.
    pub fn apply_library_settings(&mut self, settings: &LibrarySettings) {
        if let Some(rating_system) = settings.rating_system {
            self.rating_system = Some(rating_system);
        }
        if let Some(preference) = settings.title_language_preference {
            self.title_language_preference = Some(preference);
        }
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}
