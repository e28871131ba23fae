//! Hashing - SHA-256 digests for conversion records
//!
//! Provides deterministic, reproducible hashes so a conversion can be
//! matched to the exact input and settings that produced it.

use sha2::{Sha256, Digest};
use serde::Serialize;
use serde_json::{Value, to_string};

/// Compute SHA-256 hash of bytes, return hex string
pub fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    let result = hasher.finalize();
    hex::encode(result)
}

/// Convert to canonical JSON (sorted keys, no whitespace)
pub fn canonical_json<T: Serialize>(value: &T) -> Result<String, serde_json::Error> {
    let v: Value = serde_json::to_value(value)?;
    let sorted = sort_value(&v);
    to_string(&sorted)
}

fn sort_value(v: &Value) -> Value {
    match v {
        Value::Object(map) => {
            let mut sorted: Vec<_> = map.iter().collect();
            sorted.sort_by(|a, b| a.0.cmp(b.0));
            let sorted_map: serde_json::Map<String, Value> = sorted
                .into_iter()
                .map(|(k, v)| (k.clone(), sort_value(v)))
                .collect();
            Value::Object(sorted_map)
        }
        Value::Array(arr) => {
            Value::Array(arr.iter().map(sort_value).collect())
        }
        _ => v.clone()
    }
}

/// Compute job hash for one conversion
/// job_hash = sha256(source_digest + canonical_options + canonical_settings + engine_version)
pub fn compute_job_hash(
    source: &[u8],
    options: &impl Serialize,
    settings: &impl Serialize,
    engine_version: &str,
) -> Result<String, serde_json::Error> {
    let combined = format!(
        "{}:{}:{}:{}",
        sha256_hex(source),
        canonical_json(options)?,
        canonical_json(settings)?,
        engine_version
    );
    Ok(sha256_hex(combined.as_bytes()))
}

mod hex {
    pub fn encode(bytes: impl AsRef<[u8]>) -> String {
        bytes.as_ref().iter().map(|b| format!("{:02x}", b)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_canonical_json_sorted() {
        let obj = json!({"z": 1, "a": {"y": 2, "b": 3}, "m": [{"k": 1, "c": 2}]});
        let canonical = canonical_json(&obj).unwrap();
        assert_eq!(canonical, r#"{"a":{"b":3,"y":2},"m":[{"c":2,"k":1}],"z":1}"#);
    }

    #[test]
    fn test_sha256_known_value() {
        assert_eq!(
            sha256_hex(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_job_hash_stable() {
        let options = json!({"backgroundColor": "#FFFFFF", "paddingPercent": 12.5});
        let settings = json!({"alphaThreshold": 128});
        let h1 = compute_job_hash(b"logo", &options, &settings, "1.0.0").unwrap();
        let h2 = compute_job_hash(b"logo", &options, &settings, "1.0.0").unwrap();
        assert_eq!(h1, h2);
        assert_eq!(h1.len(), 64);
    }

    #[test]
    fn test_job_hash_sensitive_to_every_input() {
        let options = json!({"paddingPercent": 12.5});
        let settings = json!({"alphaThreshold": 128});
        let base = compute_job_hash(b"logo", &options, &settings, "1.0.0").unwrap();

        let changed = [
            compute_job_hash(b"logo2", &options, &settings, "1.0.0").unwrap(),
            compute_job_hash(b"logo", &json!({"paddingPercent": 10.0}), &settings, "1.0.0").unwrap(),
            compute_job_hash(b"logo", &options, &json!({"alphaThreshold": 0}), "1.0.0").unwrap(),
            compute_job_hash(b"logo", &options, &settings, "1.0.1").unwrap(),
        ];
        for hash in changed {
            assert_ne!(hash, base);
        }
    }
}
