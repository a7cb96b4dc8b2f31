//! Canonical serialization and content hashing.
//!
//! Every signed or hashed RansomEye record is first reduced to a unique byte
//! image by [`canonical_bytes`], then hashed with [`sha256_hex`]. The
//! canonicalization rules (sorted keys, minimal separators, UTF-8,
//! non-ASCII preserved) mirror the reference implementation's
//! `json.dumps(..., sort_keys=True, separators=(',', ':'), ensure_ascii=False)`.

use std::collections::BTreeSet;
use std::path::Path;

use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};

pub mod hasher;

pub use hasher::{gzip_deterministic, gzip_file_deterministic, sha256_of_file, FileHashError};

#[derive(Debug, thiserror::Error)]
pub enum CanonError {
    #[error("value could not be serialized to JSON: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Produce the canonical byte image of `value`, dropping every field named
/// in `excluded` (applied only at the top level, matching the spec's
/// signature/hash exclusion contract — nested objects are never field-name
/// filtered, only key-sorted).
pub fn canonical_bytes<T: Serialize>(
    value: &T,
    excluded: &BTreeSet<&str>,
) -> Result<Vec<u8>, CanonError> {
    let mut root = serde_json::to_value(value)?;
    if let Value::Object(map) = &mut root {
        for key in excluded {
            map.remove(*key);
        }
    }
    let sorted = canonicalize_value(root);
    // serde_json::to_string never inserts whitespace and preserves non-ASCII
    // characters verbatim, matching ensure_ascii=False, separators=(',', ':').
    Ok(serde_json::to_string(&sorted)?.into_bytes())
}

/// Recursively rebuild a [`Value`] with every object's keys in sorted
/// lexicographic order. Arrays preserve source order, per the spec.
fn canonicalize_value(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            let mut canonical = serde_json::Map::with_capacity(entries.len());
            for (key, nested) in entries {
                canonical.insert(key, canonicalize_value(nested));
            }
            Value::Object(canonical)
        }
        Value::Array(items) => Value::Array(items.into_iter().map(canonicalize_value).collect()),
        other => other,
    }
}

/// SHA-256 of arbitrary bytes, hex-encoded.
pub fn sha256_hex_bytes(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// SHA-256 of `value`'s canonical bytes (with `excluded` fields dropped),
/// hex-encoded. This is `immutable_hash` production for every record kind.
pub fn sha256_of_canonical<T: Serialize>(
    value: &T,
    excluded: &BTreeSet<&str>,
) -> Result<String, CanonError> {
    let bytes = canonical_bytes(value, excluded)?;
    Ok(sha256_hex_bytes(&bytes))
}

/// Zero hash used for the first link of any hash chain (ledger genesis,
/// first alert in an incident): `"0" * 64`.
pub fn zero_hash() -> String {
    "0".repeat(64)
}

pub fn sha256_of_path(path: &Path) -> Result<String, FileHashError> {
    sha256_of_file(path, 4096)
}
