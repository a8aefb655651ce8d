//! Driven port for the remote resource API.
//!
//! The gateway exposes three capabilities against named collections: list
//! with projections and filters, create, and partial update. Records travel
//! as flat JSON objects; relationships are nested objects carrying an `id`.
//! The gateway performs a single attempt per call and never retries.

use std::fmt;
use std::sync::Mutex;

use async_trait::async_trait;
use resource_query::ResourceQuery;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::define_port_error;
use crate::domain::session::SessionContext;

define_port_error! {
    /// Failures surfaced by resource gateway adapters.
    pub enum RemoteCallError {
        /// The request could not be built from the supplied record.
        InvalidRequest { message: String } => "invalid gateway request: {message}",
        /// The API refused the credential.
        Unauthorized { message: String } => "gateway call unauthorised: {message}",
        /// The API rejected the request (validation, conflicts, missing records).
        Rejected { status: u16, message: String } => "gateway call rejected with status {status}: {message}",
        /// The call did not complete in time.
        Timeout { message: String } => "gateway call timed out: {message}",
        /// Network or server failure.
        Transport { message: String } => "gateway transport failed: {message}",
        /// The response body did not have the expected shape.
        Decode { message: String } => "gateway response could not be decoded: {message}",
    }
}

/// Named resource collection on the remote API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Collection(&'static str);

impl Collection {
    /// User accounts.
    pub const USERS: Self = Self("users");
    /// Follow relationships between users.
    pub const FOLLOWS: Self = Self("follows");
    /// Push notification endpoints.
    pub const NOTIFICATION_ENDPOINTS: Self = Self("oneSignalPlayers");

    /// Collection name as used in paths and type tags.
    pub const fn name(self) -> &'static str {
        self.0
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// Flat resource record exchanged with the gateway.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(Map<String, Value>);

impl Record {
    /// Empty record.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insertion.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    /// Reference to another resource, encoded as `{"id": ...}`.
    #[must_use]
    pub fn reference(id: impl Into<String>) -> Value {
        let mut map = Map::new();
        map.insert("id".to_owned(), Value::String(id.into()));
        Value::Object(map)
    }

    /// Serialise any record-shaped value.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteCallError::InvalidRequest`] when `value` does not
    /// serialise to a JSON object.
    pub fn from_serializable<T: Serialize>(value: &T) -> Result<Self, RemoteCallError> {
        match serde_json::to_value(value) {
            Ok(Value::Object(map)) => Ok(Self(map)),
            Ok(_) => Err(RemoteCallError::invalid_request(
                "record must serialise to an object",
            )),
            Err(err) => Err(RemoteCallError::invalid_request(err.to_string())),
        }
    }

    /// Decode the record into a typed value.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteCallError::Decode`] when the record does not match `T`.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, RemoteCallError> {
        serde_json::from_value(Value::Object(self.0.clone()))
            .map_err(|err| RemoteCallError::decode(err.to_string()))
    }

    /// The record identifier, when present and a string.
    pub fn id(&self) -> Option<&str> {
        self.0.get("id").and_then(Value::as_str)
    }

    /// Look up a single field.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Insert or replace a field.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    /// Remove a field.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.remove(key)
    }

    /// Iterate over fields.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// Unwrap into the underlying JSON map.
    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }
}

impl From<Map<String, Value>> for Record {
    fn from(value: Map<String, Value>) -> Self {
        Self(value)
    }
}

/// Driven port for create/update/find-all calls against the remote API.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ResourceGateway: Send + Sync {
    /// List the records of `collection` matching `query`.
    async fn find_all(
        &self,
        context: &SessionContext,
        collection: Collection,
        query: &ResourceQuery,
    ) -> Result<Vec<Record>, RemoteCallError>;

    /// Create a record and return the stored representation.
    async fn create(
        &self,
        context: &SessionContext,
        collection: Collection,
        record: Record,
    ) -> Result<Record, RemoteCallError>;

    /// Apply a partial update. `record` must carry the target `id`.
    async fn update(
        &self,
        context: &SessionContext,
        collection: Collection,
        record: Record,
    ) -> Result<Record, RemoteCallError>;
}

/// In-memory gateway that stores created records and merges updates.
///
/// Used by the probe binary's dry-run mode and by tests that need a working
/// gateway rather than expectations.
#[derive(Debug, Default)]
pub struct FixtureResourceGateway {
    records: Mutex<Vec<(Collection, Record)>>,
}

impl FixtureResourceGateway {
    /// Gateway pre-seeded with `records`.
    pub fn with_records(records: impl IntoIterator<Item = (Collection, Record)>) -> Self {
        Self {
            records: Mutex::new(records.into_iter().collect()),
        }
    }

    /// Snapshot of every stored record in `collection`.
    pub fn records(&self, collection: Collection) -> Vec<Record> {
        self.records
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .iter()
            .filter(|(stored, _)| *stored == collection)
            .map(|(_, record)| record.clone())
            .collect()
    }
}

#[async_trait]
impl ResourceGateway for FixtureResourceGateway {
    async fn find_all(
        &self,
        context: &SessionContext,
        collection: Collection,
        query: &ResourceQuery,
    ) -> Result<Vec<Record>, RemoteCallError> {
        context
            .require_credential()
            .map_err(|err| RemoteCallError::unauthorized(err.to_string()))?;
        let matches = self
            .records(collection)
            .into_iter()
            .filter(|record| {
                // `self` filters are satisfied by every fixture record.
                ["id"].iter().all(|key| {
                    query
                        .filter_value(key)
                        .is_none_or(|expected| record.id() == Some(expected))
                })
            })
            .map(|record| project(record, query.projected_fields(collection.name())))
            .collect();
        Ok(matches)
    }

    async fn create(
        &self,
        _context: &SessionContext,
        collection: Collection,
        mut record: Record,
    ) -> Result<Record, RemoteCallError> {
        let mut records = self
            .records
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        if record.id().is_none() {
            record.insert("id", (records.len() + 1).to_string());
        }
        records.push((collection, record.clone()));
        Ok(record)
    }

    async fn update(
        &self,
        context: &SessionContext,
        collection: Collection,
        record: Record,
    ) -> Result<Record, RemoteCallError> {
        context
            .require_credential()
            .map_err(|err| RemoteCallError::unauthorized(err.to_string()))?;
        let id = record
            .id()
            .ok_or_else(|| RemoteCallError::invalid_request("update requires an id"))?
            .to_owned();
        let mut records = self
            .records
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let (_, stored) = records
            .iter_mut()
            .find(|(stored, candidate)| *stored == collection && candidate.id() == Some(&id))
            .ok_or_else(|| RemoteCallError::rejected(404_u16, format!("{collection}/{id} not found")))?;
        for (key, value) in record.into_map() {
            stored.insert(key, value);
        }
        Ok(stored.clone())
    }
}

fn project(record: Record, fields: Option<&[String]>) -> Record {
    let Some(fields) = fields else {
        return record;
    };
    record
        .into_map()
        .into_iter()
        .filter(|(key, _)| key == "id" || fields.contains(key))
        .collect::<Map<_, _>>()
        .into()
}
