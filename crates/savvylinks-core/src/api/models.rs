//! SavvyCal API payloads
//!
//! Field names are matched case-insensitively: object keys are folded to
//! lowercase before the typed decode.

use serde::Deserialize;
use serde_json::{Map, Value};

/// Response of `GET /v1/links`
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ListResponse {
    pub entries: Vec<RawEntry>,
    #[serde(default)]
    pub metadata: Option<ListMetadata>,
}

/// Cursor metadata returned alongside the entries (pagination is not followed)
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct ListMetadata {
    #[serde(default)]
    pub before: Option<String>,
    #[serde(default)]
    pub after: Option<String>,
    #[serde(default)]
    pub limit: Option<u32>,
}

/// One scheduling link as the API reports it
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct RawEntry {
    pub id: String,
    #[serde(default)]
    pub state: Option<String>,
    pub slug: String,
    pub name: String,
    #[serde(default)]
    pub private_name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    pub scope: RawScope,
}

/// The grouping (user or team) a link belongs to
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct RawScope {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    pub slug: String,
}

impl ListResponse {
    /// Decode a response body, ignoring the case of field names
    pub fn from_json(body: &str) -> Result<Self, serde_json::Error> {
        let value: Value = serde_json::from_str(body)?;
        serde_json::from_value(fold_keys(value))
    }
}

/// Recursively lowercase every object key
fn fold_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let folded: Map<String, Value> = map
                .into_iter()
                .map(|(k, v)| (k.to_lowercase(), fold_keys(v)))
                .collect();
            Value::Object(folded)
        }
        Value::Array(items) => Value::Array(items.into_iter().map(fold_keys).collect()),
        other => other,
    }
}
