//! Key/Encoding Codec
//!
//! Owns the layout of the flat key space and the JSON encoding of stored
//! values.
//!
//! ## Key Layout
//! ```text
//! {prefix}:gate:{h(name)}          FeatureGate payload
//! {prefix}:config:{h(name)}        DynamicConfig payload
//! {prefix}:experiment:{h(name)}    Experiment payload
//! {prefix}:entities:{h(app)}       EntityNames index ("" = global registry)
//! {prefix}:targetApps              target app registry
//! {prefix}:{h(key)}:targetApps     sdk key → target apps
//! {prefix}:{h(app)}:sdkKeys        target app → sdk keys
//! {prefix}:sdkKey:{h(key)}         registration marker
//! {prefix}:sdkKeys                 sdk key registry
//! ```

mod keys;
pub mod tagged;

/// Serde field adapter for tagged sets
pub use tagged as tagged_set;

pub use keys::{Assoc, KeyCodec};
pub use tagged::{decode_set, encode_set};

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::Result;

/// Encode a domain value for storage
pub fn encode<T: Serialize>(value: &T) -> Result<String> {
    Ok(serde_json::to_string(value)?)
}

/// Decode a stored domain value
pub fn decode<T: DeserializeOwned>(raw: &str) -> Result<T> {
    Ok(serde_json::from_str(raw)?)
}
