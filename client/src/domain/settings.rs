//! Settings payloads submitted by the account screens.
//!
//! General settings are free-form: whatever the caller supplies is merged into
//! the user record. Library settings are restricted to two preferences.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::user::{RatingSystem, TitleLanguagePreference};

/// Key whose value must never leave the settings operation in a payload.
pub const PASSWORD_FIELD: &str = "password";

/// Error returned when a settings payload is not a JSON object.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("settings payload must be a JSON object")]
pub struct SettingsPatchError;

/// Partial user record keyed by API attribute name.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SettingsPatch(Map<String, Value>);

impl SettingsPatch {
    /// Empty patch.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insertion.
    ///
    /// # Examples
    /// ```
    /// use client::domain::SettingsPatch;
    ///
    /// let patch = SettingsPatch::new()
    ///     .with("about", "hello")
    ///     .with("password", "hunter2");
    /// assert!(patch.contains_password());
    /// assert!(!patch.without_password().contains_password());
    /// ```
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    /// Look up a single attribute.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Iterate over attribute names and values.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// Number of attributes in the patch.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` when the patch carries no attributes.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns `true` when a password attribute is present.
    pub fn contains_password(&self) -> bool {
        self.0.contains_key(PASSWORD_FIELD)
    }

    /// Drop the password attribute.
    #[must_use]
    pub fn without_password(mut self) -> Self {
        self.0.remove(PASSWORD_FIELD);
        self
    }

    /// Unwrap into the underlying JSON map.
    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }
}

impl fmt::Debug for SettingsPatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for (key, value) in &self.0 {
            if key == PASSWORD_FIELD {
                map.entry(key, &"<redacted>");
            } else {
                map.entry(key, value);
            }
        }
        map.finish()
    }
}

impl From<Map<String, Value>> for SettingsPatch {
    fn from(value: Map<String, Value>) -> Self {
        Self(value)
    }
}

impl TryFrom<Value> for SettingsPatch {
    type Error = SettingsPatchError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            _ => Err(SettingsPatchError),
        }
    }
}

/// The library preferences the library settings screen may change.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LibrarySettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating_system: Option<RatingSystem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title_language_preference: Option<TitleLanguagePreference>,
}

impl LibrarySettings {
    /// Extract the two library preferences, ignoring every other key.
    ///
    /// # Errors
    ///
    /// Returns the decoding error when either preference has an unknown value.
    pub fn from_patch(patch: &SettingsPatch) -> Result<Self, serde_json::Error> {
        let mut relevant = Map::new();
        for key in ["ratingSystem", "titleLanguagePreference"] {
            if let Some(value) = patch.get(key) {
                relevant.insert(key.to_owned(), value.clone());
            }
        }
        let settings: Self = serde_json::from_value(Value::Object(relevant))?;
        if settings.rating_system == Some(RatingSystem::Unknown)
            || settings.title_language_preference == Some(TitleLanguagePreference::Unknown)
        {
            return Err(serde::de::Error::custom("unknown library preference value"));
        }
        Ok(settings)
    }
}
