//! Tagged set encoding
//!
//! Generic JSON cannot tell an ordered sequence from a set, so every set is
//! written with an explicit tag:
//!
//! ```text
//! {"dataType":"Set","value":["a","b"]}
//! ```
//!
//! Use as a serde field adapter: `#[serde(with = "crate::codec::tagged_set")]`.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::error::Result;
use crate::model::NameSet;

/// Tag value written under `dataType`
pub const SET_TAG: &str = "Set";

#[derive(Serialize)]
#[serde(tag = "dataType", content = "value")]
enum TaggedRef<'a> {
    Set(&'a NameSet),
}

#[derive(Deserialize)]
#[serde(tag = "dataType", content = "value")]
enum Tagged {
    Set(NameSet),
}

pub fn serialize<S: Serializer>(set: &NameSet, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    TaggedRef::Set(set).serialize(serializer)
}

pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<NameSet, D::Error> {
    let Tagged::Set(set) = Tagged::deserialize(deserializer)?;
    Ok(set)
}

/// Encode a top-level set value
pub fn encode_set(set: &NameSet) -> Result<String> {
    Ok(serde_json::to_string(&TaggedRef::Set(set))?)
}

/// Decode a top-level set value
pub fn decode_set(raw: &str) -> Result<NameSet> {
    let Tagged::Set(set) = serde_json::from_str(raw)?;
    Ok(set)
}

/// Whether a JSON value already carries the set tag
pub fn is_tagged_set(value: &Value) -> bool {
    value
        .as_object()
        .and_then(|obj| obj.get("dataType"))
        .and_then(Value::as_str)
        == Some(SET_TAG)
}

/// Normalize a stored set value into the tagged form.
///
/// Bare arrays (legacy encoding) are wrapped; a tag wrapped around another
/// tag is collapsed. Returns `None` when nothing needs to change, so callers
/// can skip the write.
pub fn retag_legacy_set(value: &Value) -> Option<Value> {
    match value {
        Value::Array(items) => Some(tagged_value(items.clone())),
        Value::Object(obj) if is_tagged_set(value) => match obj.get("value") {
            Some(inner) if is_tagged_set(inner) => retag_legacy_set(inner).or_else(|| Some(inner.clone())),
            _ => None,
        },
        _ => None,
    }
}

fn tagged_value(items: Vec<Value>) -> Value {
    let mut obj = Map::new();
    obj.insert("dataType".to_string(), Value::String(SET_TAG.to_string()));
    obj.insert("value".to_string(), Value::Array(items));
    Value::Object(obj)
}
