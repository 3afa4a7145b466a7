//! GO-CAM model records as served by the model endpoint and persisted by
//! the `download` command.
//!
//! Records are loosely shaped upstream, so only the fields the graph
//! extractor reads are typed; everything else rides along in `extra` and is
//! written back out unchanged. Required identifiers are kept optional at the
//! serde layer and checked where they are used, so a bad record can be
//! reported with its position instead of failing the whole file parse.

use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::error::{GocamError, Result};

/// Category assigned to objects that carry no `type`.
pub const DEFAULT_OBJECT_CATEGORY: &str = "gocam:Object";

/// Category assigned to every activity node.
pub const ACTIVITY_CATEGORY: &str = "gocam:Activity";

/// One GO-CAM model.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelRecord {
    #[serde(
        default,
        deserialize_with = "string_or_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<String>,
    #[serde(
        default,
        deserialize_with = "string_or_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub taxon: Option<String>,
    #[serde(
        default,
        deserialize_with = "list_or_empty",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub objects: Vec<ObjectRecord>,
    #[serde(
        default,
        deserialize_with = "list_or_empty",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub activities: Vec<ActivityRecord>,
    /// Fields not used by extraction (title, status, comments, ...).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A biological object referenced by a model (gene product, term, ...).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ObjectRecord {
    #[serde(
        default,
        deserialize_with = "string_or_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<String>,
    #[serde(
        default,
        deserialize_with = "string_or_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub label: Option<String>,
    #[serde(
        rename = "type",
        default,
        deserialize_with = "string_or_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub object_type: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A modeled molecular activity and its associations.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActivityRecord {
    #[serde(
        default,
        deserialize_with = "string_or_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<String>,
    /// Relation name -> association mapping. Values may be null or lack a `term`.
    #[serde(
        default,
        deserialize_with = "map_or_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub associations: Option<Map<String, Value>>,
    /// Remaining fields. Upstream GO-CAM puts associations here directly
    /// (`enabled_by`, `occurs_in`, ...), which is used when `associations` is absent.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

// Optional fields of the wrong type read as absent, so the defaults apply
// instead of failing the whole file.

fn string_or_none<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => Some(s),
        _ => None,
    })
}

fn map_or_none<'de, D>(
    deserializer: D,
) -> std::result::Result<Option<Map<String, Value>>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Object(map) => Some(map),
        _ => None,
    })
}

fn list_or_empty<'de, D, T>(deserializer: D) -> std::result::Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    match Value::deserialize(deserializer)? {
        Value::Array(items) => items
            .into_iter()
            .enumerate()
            .map(|(idx, item)| {
                serde_json::from_value(item)
                    .map_err(|e| D::Error::custom(format!("[{}]: {}", idx, e)))
            })
            .collect(),
        _ => Ok(Vec::new()),
    }
}

/// Returns the id if present and non-empty, otherwise a `MissingField` error
/// located at `path`.
pub(crate) fn require_id<'a>(
    id: &'a Option<String>,
    path: impl FnOnce() -> String,
) -> Result<&'a str> {
    match id.as_deref() {
        Some(id) if !id.is_empty() => Ok(id),
        _ => Err(GocamError::MissingField {
            field: "id",
            path: path(),
        }),
    }
}

impl ModelRecord {
    /// Model identifier, if present and non-empty.
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref().filter(|id| !id.is_empty())
    }

    /// Taxon, defaulting to the empty string.
    pub fn taxon(&self) -> &str {
        self.taxon.as_deref().unwrap_or("")
    }

    /// Drop null-valued fields everywhere in the record, so that a written
    /// record only carries fields that were actually set.
    pub fn elide_empty(&mut self) {
        prune_nulls(&mut self.extra);
        for object in &mut self.objects {
            prune_nulls(&mut object.extra);
        }
        for activity in &mut self.activities {
            if let Some(associations) = &mut activity.associations {
                prune_nulls(associations);
            }
            prune_nulls(&mut activity.extra);
        }
    }
}

impl ObjectRecord {
    pub fn label(&self) -> &str {
        self.label.as_deref().unwrap_or("")
    }

    pub fn category(&self) -> &str {
        self.object_type.as_deref().unwrap_or(DEFAULT_OBJECT_CATEGORY)
    }
}

impl ActivityRecord {
    /// Association entries that carry a non-empty string `term`, as
    /// `(relation, term)` pairs in document order.
    pub fn association_terms(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.associations
            .as_ref()
            .unwrap_or(&self.extra)
            .iter()
            .filter_map(|(relation, value)| {
                value
                    .get("term")
                    .and_then(Value::as_str)
                    .filter(|term| !term.is_empty())
                    .map(|term| (relation.as_str(), term))
            })
    }
}

fn prune_nulls(map: &mut Map<String, Value>) {
    map.retain(|_, value| !value.is_null());
    for value in map.values_mut() {
        prune_value(value);
    }
}

fn prune_value(value: &mut Value) {
    match value {
        Value::Object(map) => prune_nulls(map),
        Value::Array(items) => {
            items.retain(|item| !item.is_null());
            items.iter_mut().for_each(prune_value);
        }
        _ => {}
    }
}
