//! JSON:API documents exchanged with the resource server.
//!
//! Domain records are flat: attributes sit next to `id`, and relationships
//! appear as nested `{"id": ...}` objects. These DTOs convert between that
//! shape and JSON:API resource objects in one pass each way.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::ports::{Collection, Record};

#[derive(Debug, Serialize, Deserialize)]
pub(super) struct ResourceIdentifierDto {
    #[serde(rename = "type")]
    pub(super) kind: String,
    pub(super) id: String,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub(super) struct RelationshipDto {
    /// To-one linkage. To-many linkage and link-only relationships decode as
    /// `Value`s that are skipped when flattening.
    #[serde(default)]
    pub(super) data: Option<Value>,
}

#[derive(Debug, Serialize, Deserialize)]
pub(super) struct ResourceObjectDto {
    #[serde(rename = "type")]
    pub(super) kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(super) id: Option<String>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub(super) attributes: Map<String, Value>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub(super) relationships: BTreeMap<String, RelationshipDto>,
}

#[derive(Debug, Serialize, Deserialize)]
pub(super) struct SingleDocumentDto {
    pub(super) data: ResourceObjectDto,
}

#[derive(Debug, Deserialize)]
pub(super) struct CollectionDocumentDto {
    #[serde(default)]
    pub(super) data: Vec<ResourceObjectDto>,
}

#[derive(Debug, Deserialize)]
pub(super) struct ErrorDocumentDto {
    #[serde(default)]
    pub(super) errors: Vec<ErrorObjectDto>,
}

#[derive(Debug, Deserialize)]
pub(super) struct ErrorObjectDto {
    #[serde(default)]
    pub(super) title: Option<String>,
    #[serde(default)]
    pub(super) detail: Option<String>,
}

impl ErrorDocumentDto {
    /// First human-readable message in the document, preferring `detail`.
    pub(super) fn first_message(&self) -> Option<&str> {
        self.errors
            .iter()
            .find_map(|error| error.detail.as_deref().or(error.title.as_deref()))
    }
}

/// Resource type used for a relationship named `key`.
pub(super) fn relationship_type(key: &str) -> String {
    match key {
        "follower" | "followed" | "user" => Collection::USERS.name().to_owned(),
        other if other.ends_with('s') => other.to_owned(),
        other => format!("{other}s"),
    }
}

fn identifier_of(value: &Value) -> Option<String> {
    match value {
        Value::String(id) => Some(id.clone()),
        Value::Number(id) => Some(id.to_string()),
        _ => None,
    }
}

impl ResourceObjectDto {
    pub(super) fn from_record(collection: Collection, record: Record) -> Self {
        let mut resource = Self {
            kind: collection.name().to_owned(),
            id: None,
            attributes: Map::new(),
            relationships: BTreeMap::new(),
        };
        for (key, value) in record.into_map() {
            if key == "id" {
                resource.id = identifier_of(&value);
                continue;
            }
            let linked = value
                .as_object()
                .and_then(|object| object.get("id"))
                .and_then(identifier_of);
            match linked {
                Some(id) => {
                    let identifier = ResourceIdentifierDto {
                        kind: relationship_type(&key),
                        id,
                    };
                    resource.relationships.insert(
                        key,
                        RelationshipDto {
                            data: serde_json::to_value(identifier).ok(),
                        },
                    );
                }
                None => {
                    resource.attributes.insert(key, value);
                }
            }
        }
        resource
    }

    pub(super) fn into_record(self) -> Record {
        let mut record = Record::new();
        if let Some(id) = self.id {
            record.insert("id", id);
        }
        for (key, value) in self.attributes {
            record.insert(key, value);
        }
        for (key, relationship) in self.relationships {
            let linked = relationship
                .data
                .and_then(|data| serde_json::from_value::<ResourceIdentifierDto>(data).ok());
            if let Some(identifier) = linked {
                record.insert(key, Record::reference(identifier.id));
            }
        }
        record
    }
}
