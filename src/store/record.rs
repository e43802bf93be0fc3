// Persisted history layout.
//
//   { "base": "<string>" | null, "deltas": [ [ {"op": ..., "char": ...}, ... ], ... ] }
//
// `base` is required (null only for an empty store). `base_version` is read
// as an alias so documents written by older tooling still load.

use serde::{Deserialize, Deserializer, Serialize};

use crate::diff::Delta;

/// Owned form, produced when reading a document.
#[derive(Debug, Deserialize)]
pub(crate) struct HistoryRecord {
    #[serde(alias = "base_version", deserialize_with = "required_nullable")]
    pub base: Option<String>,
    pub deltas: Vec<Delta>,
}

/// Borrowed form, used when writing so the store is not cloned.
#[derive(Debug, Serialize)]
pub(crate) struct HistoryRef<'a> {
    pub base: Option<&'a str>,
    pub deltas: &'a [Delta],
}

// A plain `Option` field would silently default to None when the key is
// absent; routing it through `deserialize_with` makes the key mandatory.
fn required_nullable<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer)
}
