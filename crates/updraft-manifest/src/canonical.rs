//! Canonical encoding of the signed manifest subset.
//!
//! The signed bytes are the compact JSON encoding of exactly
//! `{"files": [...], "version": "..."}` with object keys sorted
//! lexicographically at every depth and no insignificant whitespace.
//! `releaseDate`, `changelog` and the other descriptive fields are not
//! covered.

use serde_json::{Map, Value};
use updraft_core::{FileEntry, Result};

/// Bytes covered by a manifest signature.
pub fn canonical_payload(version: &str, files: &[FileEntry]) -> Result<Vec<u8>> {
    let mut root = Map::new();
    root.insert("files".to_string(), serde_json::to_value(files)?);
    root.insert("version".to_string(), Value::String(version.to_string()));

    let canonical = sort_keys(Value::Object(root));
    Ok(serde_json::to_vec(&canonical)?)
}

/// Rebuild every object with keys inserted in sorted order, so the output
/// is the same whether or not serde_json preserves insertion order.
fn sort_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            Value::Object(
                entries
                    .into_iter()
                    .map(|(k, v)| (k, sort_keys(v)))
                    .collect(),
            )
        }
        Value::Array(items) => Value::Array(items.into_iter().map(sort_keys).collect()),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry() -> FileEntry {
        FileEntry {
            path: "index.html".to_string(),
            content_hash: "sha256-00ff".to_string(),
            size: 12,
            url: "https://cdn.example.com/1.0.0/index.html".to_string(),
            critical: true,
            mime_type: "text/html".to_string(),
        }
    }

    #[test]
    fn test_exact_encoding() {
        let payload = canonical_payload("1.0.0", &[entry()]).unwrap();
        let expected = concat!(
            r#"{"files":[{"contentHash":"sha256-00ff","critical":true,"mimeType":"text/html","#,
            r#""path":"index.html","size":12,"url":"https://cdn.example.com/1.0.0/index.html"}],"#,
            r#""version":"1.0.0"}"#
        );
        assert_eq!(String::from_utf8(payload).unwrap(), expected);
    }

    #[test]
    fn test_payload_ignores_nothing_in_files() {
        let a = canonical_payload("1.0.0", &[entry()]).unwrap();
        let mut changed = entry();
        changed.mime_type = "text/plain".to_string();
        let b = canonical_payload("1.0.0", &[changed]).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_sort_keys_nested() {
        let value: Value = serde_json::from_str(r#"{"b":{"z":1,"a":2},"a":[{"d":1,"c":2}]}"#).unwrap();
        let sorted = serde_json::to_string(&sort_keys(value)).unwrap();
        assert_eq!(sorted, r#"{"a":[{"c":2,"d":1}],"b":{"a":2,"z":1}}"#);
    }
}
