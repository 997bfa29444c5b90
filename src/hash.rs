//! Hash Service
//!
//! Pluggable string → string hash used to derive storage keys, cache keys,
//! rule ids and the `hashed_sdk_keys_to_entities` map. The hash is handed
//! to every consumer at construction; there is no process-wide default.

use std::fmt;
use std::sync::Arc;

/// A string hash. Implementations must be deterministic.
pub trait HashService: Send + Sync {
    fn hash(&self, input: &str) -> String;
}

/// Shared handle to a hash service
pub type SharedHash = Arc<dyn HashService>;

/// Default hash: 32-bit rolling hash (`h = h * 31 + unit`) over UTF-16 code
/// units, rendered as the unsigned decimal of the final 32-bit state.
///
/// Non-cryptographic; collisions are an accepted risk.
#[derive(Debug, Clone, Copy, Default)]
pub struct Djb2Hash;

impl Djb2Hash {
    /// Raw 32-bit hash value
    pub fn hash_u32(input: &str) -> u32 {
        input
            .encode_utf16()
            .fold(0u32, |h, unit| (h << 5).wrapping_sub(h).wrapping_add(unit as u32))
    }
}

impl HashService for Djb2Hash {
    fn hash(&self, input: &str) -> String {
        Self::hash_u32(input).to_string()
    }
}

/// Adapts a closure into a [`HashService`]
pub struct FnHash<F>(F);

impl<F> FnHash<F>
where
    F: Fn(&str) -> String + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

impl<F> HashService for FnHash<F>
where
    F: Fn(&str) -> String + Send + Sync,
{
    fn hash(&self, input: &str) -> String {
        (self.0)(input)
    }
}

impl<F> fmt::Debug for FnHash<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FnHash")
    }
}

/// The default hash as a shared handle
pub fn default_hash() -> SharedHash {
    Arc::new(Djb2Hash)
}
