//! Request bodies built by orchestrator operations.
//!
//! Relationships are encoded as nested `{"id": ...}` objects; the gateway
//! adapter decides how those travel on the wire.

use chrono::NaiveDate;
use serde::Serialize;
use serde_json::Value;

use crate::domain::auth::SignUpRequest;
use crate::domain::identity::{PendingThirdPartyRegistration, ThirdPartyId};
use crate::domain::ports::{Record, RemoteCallError};
use crate::domain::settings::{LibrarySettings, SettingsPatch};
use crate::domain::user::UserId;

/// Attribute holding the linked third-party identity.
pub const THIRD_PARTY_ID_FIELD: &str = "facebookId";

/// Platform reported for every notification endpoint.
pub const NOTIFICATION_PLATFORM: &str = "mobile";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct NewUserRecord<'a> {
    name: &'a str,
    email: &'a str,
    password: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    birthday: Option<NaiveDate>,
    #[serde(rename = "facebookId", skip_serializing_if = "Option::is_none")]
    third_party_id: Option<&'a ThirdPartyId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    gender: Option<&'a str>,
}

/// New-user record; the third-party id and gender are added only when a
/// third-party id has been captured.
///
/// # Errors
///
/// Returns [`RemoteCallError::InvalidRequest`] if the record cannot be encoded.
pub fn new_user(
    request: &SignUpRequest,
    pending: &PendingThirdPartyRegistration,
) -> Result<Record, RemoteCallError> {
    let linked = pending.id.as_ref();
    Record::from_serializable(&NewUserRecord {
        name: request.username(),
        email: request.email(),
        password: request.password(),
        birthday: request.birthday(),
        third_party_id: linked,
        gender: linked.and(pending.gender.as_deref()),
    })
}

/// Partial user update linking (or, with `None`, unlinking) a third-party id.
#[must_use]
pub fn third_party_link(user: &UserId, third_party: Option<&ThirdPartyId>) -> Record {
    let value = third_party.map_or(Value::Null, |id| Value::String(id.to_string()));
    Record::new()
        .with("id", user.as_str())
        .with(THIRD_PARTY_ID_FIELD, value)
}

/// Partial user update carrying every key of `patch`, targeted at `user`.
///
/// The profile id always wins over any `id` key in the patch.
#[must_use]
pub fn general_settings(user: &UserId, patch: &SettingsPatch) -> Record {
    let mut record: Record = patch.clone().into_map().into();
    record.insert("id", user.as_str());
    record
}

/// Partial user update carrying only the library preferences.
///
/// # Errors
///
/// Returns [`RemoteCallError::InvalidRequest`] if the record cannot be encoded.
pub fn library_settings(
    user: &UserId,
    settings: &LibrarySettings,
) -> Result<Record, RemoteCallError> {
    let mut record = Record::from_serializable(settings)?;
    record.insert("id", user.as_str());
    Ok(record)
}

/// Follow relationship from `follower` to `followed`.
#[must_use]
pub fn follow(follower: &UserId, followed: &UserId) -> Record {
    Record::new()
        .with("follower", Record::reference(follower.as_str()))
        .with("followed", Record::reference(followed.as_str()))
}

/// Push endpoint registration for `user`.
#[must_use]
pub fn notification_endpoint(endpoint_id: &str, user: &UserId) -> Record {
    Record::new()
        .with("playerId", endpoint_id)
        .with("platform", NOTIFICATION_PLATFORM)
        .with("user", Record::reference(user.as_str()))
}
