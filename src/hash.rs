//! Canonical JSON + SHA-256 fingerprints.
//!
//! Canonical form: object keys sorted lexicographically (free, since
//! `serde_json::Map` without the `preserve_order` feature is backed by a
//! `BTreeMap`), no whitespace, `null` values omitted, floats in
//! `serde_json`'s default shortest-round-trip form. This resolves the open
//! question in spec.md §9 about cross-language float reproducibility: we fix
//! the rule here rather than depending on language-default formatting.

use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};

/// Strip `null` values from objects (recursively) so two payloads that
/// differ only by "field absent" vs "field null" hash identically.
fn strip_nulls(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut out = serde_json::Map::new();
            for (k, v) in map {
                if v.is_null() {
                    continue;
                }
                out.insert(k, strip_nulls(v));
            }
            Value::Object(out)
        }
        Value::Array(items) => Value::Array(items.into_iter().map(strip_nulls).collect()),
        other => other,
    }
}

/// Render `value` as canonical JSON bytes.
pub fn canonical_json<T: Serialize>(value: &T) -> serde_json::Result<Vec<u8>> {
    let raw = serde_json::to_value(value)?;
    let canon = strip_nulls(raw);
    serde_json::to_vec(&canon)
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    hex::encode(digest)
}

/// SHA-256 over the canonical JSON of `value`, truncated to `chars` hex
/// characters (lowercase).
pub fn truncated_fingerprint<T: Serialize>(value: &T, chars: usize) -> serde_json::Result<String> {
    let bytes = canonical_json(value)?;
    let full = sha256_hex(&bytes);
    Ok(full[..chars.min(full.len())].to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn canonical_json_sorts_keys_and_drops_nulls() {
        let v = json!({"b": 1, "a": null, "c": 2});
        let bytes = canonical_json(&v).unwrap();
        assert_eq!(String::from_utf8(bytes).unwrap(), r#"{"b":1,"c":2}"#);
    }

    #[test]
    fn fingerprint_is_stable_across_calls() {
        let v = json!({"x": 1.5, "y": "red sea"});
        let h1 = truncated_fingerprint(&v, 16).unwrap();
        let h2 = truncated_fingerprint(&v, 16).unwrap();
        assert_eq!(h1, h2);
        assert_eq!(h1.len(), 16);
    }

    #[test]
    fn float_formatting_is_shortest_round_trip() {
        let v = json!({"p": 0.1_f64 + 0.2_f64});
        let bytes = canonical_json(&v).unwrap();
        let s = String::from_utf8(bytes).unwrap();
        // serde_json formats via ryu: shortest string that round-trips, not
        // the naive 17-significant-digit expansion.
        assert!(s.contains("0.30000000000000004"));
    }
}
