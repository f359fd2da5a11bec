use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

/// Length of the hash prefix served to polling devices.
pub const PROTOCOL_PREFIX_LEN: usize = 8;

/// SHA-256 fingerprint of a configuration payload, lower-case hex.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContentHash(String);

impl ContentHash {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Short form used by the device version check.
    pub fn prefix(&self) -> &str {
        protocol_prefix(&self.0)
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl std::fmt::Display for ContentHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Truncates a stored full hash to the protocol prefix.
pub fn protocol_prefix(full_hash: &str) -> &str {
    full_hash.get(..PROTOCOL_PREFIX_LEN).unwrap_or(full_hash)
}

pub struct VersionHasher;

impl VersionHasher {
    pub fn hash_bytes(bytes: &[u8]) -> ContentHash {
        let digest = Sha256::digest(bytes);
        ContentHash(format!("{:x}", digest))
    }

    /// Hashes the serialized form of `payload`. Object keys are emitted in
    /// sorted order, so equal documents always produce equal bytes.
    ///
    /// Equality is per document, not per submitted bytes: payloads that
    /// differ only in key order or whitespace hash the same, and any change
    /// to a key or value changes the hash. Payloads are stored as JSONB,
    /// which keeps neither key order nor whitespace.
    pub fn hash(payload: &Value) -> ContentHash {
        let bytes = serde_json::to_vec(&canonical(payload)).unwrap_or_default();
        Self::hash_bytes(&bytes)
    }
}

fn canonical(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let sorted: BTreeMap<&String, Value> =
                map.iter().map(|(k, v)| (k, canonical(v))).collect();
            Value::Object(sorted.into_iter().map(|(k, v)| (k.clone(), v)).collect())
        }
        Value::Array(items) => Value::Array(items.iter().map(canonical).collect()),
        other => other.clone(),
    }
}
