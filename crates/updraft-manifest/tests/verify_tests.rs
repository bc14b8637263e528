//! Signature Verifier integration tests
//!
//! Run with: cargo test --package updraft-manifest --test verify_tests

mod common;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use common::{builder, other_trusted_key, sign_raw, small_app, trusted_key, web_app};
use updraft_core::{Channel, Error, Manifest};
use updraft_manifest::{
    artifact_path, canonical_payload, verify, verify_file, verify_json, KeyStore, TrustedKey,
    VerifiedManifest,
};

fn signed_manifest() -> Manifest {
    let dir = small_app();
    builder()
        .build(dir.path(), "3.5.1", Channel::Stable, None)
        .unwrap()
}

/// Flip one bit in the byte at `index` of a string, keeping it valid UTF-8.
fn flip_ascii(s: &str, index: usize) -> String {
    let mut bytes = s.as_bytes().to_vec();
    bytes[index] ^= 0x01;
    String::from_utf8(bytes).unwrap()
}

// ═══════════════════════════════════════════════════════════════════════════════
// 1. Round trip and tampering
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_round_trip() {
    let manifest = signed_manifest();
    assert!(verify(&manifest, &trusted_key()));
}

#[test]
fn test_round_trip_through_json() {
    let manifest = signed_manifest();
    let json = manifest.to_json().unwrap();
    assert!(verify_json(&json, &trusted_key()));
    assert!(verify(&Manifest::from_json(&json).unwrap(), &trusted_key()));
}

#[test]
fn test_tampered_hash_fails() {
    let mut manifest = signed_manifest();
    let last = manifest.files[0].content_hash.len() - 1;
    manifest.files[0].content_hash = flip_ascii(&manifest.files[0].content_hash, last);
    assert!(!verify(&manifest, &trusted_key()));
}

#[test]
fn test_tampered_path_fails() {
    let mut manifest = signed_manifest();
    manifest.files[2].path = flip_ascii(&manifest.files[2].path, 0);
    assert!(!verify(&manifest, &trusted_key()));
}

#[test]
fn test_tampered_version_fails() {
    let mut manifest = signed_manifest();
    manifest.version = "3.5.2".to_string();
    assert!(!verify(&manifest, &trusted_key()));
}

#[test]
fn test_tampered_size_and_url_fail() {
    let mut manifest = signed_manifest();
    manifest.files[1].size += 1;
    assert!(!verify(&manifest, &trusted_key()));

    let mut manifest = signed_manifest();
    manifest.files[1].url = "https://evil.example.com/app.js".to_string();
    assert!(!verify(&manifest, &trusted_key()));
}

#[test]
fn test_unsigned_fields_are_not_covered() {
    let mut manifest = signed_manifest();
    manifest
        .changelog
        .insert("fr".to_string(), "Mise à jour".to_string());
    manifest.breaking = !manifest.breaking;
    assert!(verify(&manifest, &trusted_key()));
}

#[test]
fn test_wrong_key_fails() {
    let manifest = signed_manifest();
    assert!(!verify(&manifest, &other_trusted_key()));
}

#[test]
fn test_signature_tampering_fails() {
    let mut manifest = signed_manifest();
    let mut raw = STANDARD.decode(&manifest.signature).unwrap();
    raw[10] ^= 0x80;
    manifest.signature = STANDARD.encode(&raw);
    assert!(!verify(&manifest, &trusted_key()));
}

#[test]
fn test_malformed_signatures_fail_without_error() {
    let mut manifest = signed_manifest();
    for bad in ["", "!!!not-base64!!!", "AAAA", "c2hvcnQ="] {
        manifest.signature = bad.to_string();
        assert!(!verify(&manifest, &trusted_key()), "accepted {:?}", bad);
    }
}

#[test]
fn test_canonical_payload_is_compact_sorted() {
    let manifest = signed_manifest();
    let payload = String::from_utf8(canonical_payload(&manifest.version, &manifest.files).unwrap())
        .unwrap();
    assert!(payload.starts_with(r#"{"files":[{"contentHash":"sha256-"#));
    assert!(payload.ends_with(r#""version":"3.5.1"}"#));
    assert!(!payload.contains(": "));
}

// ═══════════════════════════════════════════════════════════════════════════════
// 2. Structural variant
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_verify_json_missing_fields() {
    let manifest = signed_manifest();
    let mut value: serde_json::Value = serde_json::to_value(&manifest).unwrap();
    value.as_object_mut().unwrap().remove("signature");
    assert!(!verify_json(&value.to_string(), &trusted_key()));

    let mut value: serde_json::Value = serde_json::to_value(&manifest).unwrap();
    value.as_object_mut().unwrap().remove("files");
    assert!(!verify_json(&value.to_string(), &trusted_key()));

    assert!(!verify_json("{not json", &trusted_key()));
    assert!(!verify_json("[]", &trusted_key()));
}

#[test]
fn test_verify_json_only_needs_signed_fields() {
    let manifest = signed_manifest();
    let minimal = serde_json::json!({
        "version": manifest.version,
        "files": manifest.files,
        "signature": manifest.signature,
    });
    assert!(verify_json(&minimal.to_string(), &trusted_key()));
}

#[test]
fn test_legacy_keys_load_but_legacy_signatures_fail() {
    let manifest = signed_manifest();
    let legacy_json = manifest
        .to_json()
        .unwrap()
        .replace("\"contentHash\"", "\"hash\"")
        .replace("\"minCompatibleVersion\"", "\"minVersion\"");

    let mut legacy = Manifest::from_json(&legacy_json).unwrap();
    assert_eq!(legacy, manifest);

    // a signature over the legacy field names covers different bytes
    let payload = canonical_payload(&manifest.version, &manifest.files).unwrap();
    let legacy_payload = String::from_utf8(payload)
        .unwrap()
        .replace("\"contentHash\"", "\"hash\"");
    legacy.signature = sign_raw(legacy_payload.as_bytes());
    assert!(!verify(&legacy, &trusted_key()));
    assert!(VerifiedManifest::new(legacy, &trusted_key()).is_err());
}

// ═══════════════════════════════════════════════════════════════════════════════
// 3. VerifiedManifest gate
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_verified_manifest_accepts_valid() {
    let manifest = signed_manifest();
    let verified = VerifiedManifest::new(manifest.clone(), &trusted_key()).unwrap();
    assert_eq!(verified.manifest(), &manifest);
    assert_eq!(verified.version, "3.5.1");
}

#[test]
fn test_verified_manifest_rejects_tampered() {
    let mut manifest = signed_manifest();
    manifest.version = "9.9.9".to_string();
    let err = VerifiedManifest::new(manifest, &trusted_key()).unwrap_err();
    assert!(matches!(err, Error::Signature { .. }));
    assert!(err.to_string().contains("integrity check failed"));
}

// ═══════════════════════════════════════════════════════════════════════════════
// 4. Artifact checks and keys on disk
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_verify_files_in_build_dir() {
    let dir = web_app();
    let manifest = builder()
        .build(dir.path(), "3.5.1", Channel::Stable, None)
        .unwrap();

    for entry in &manifest.files {
        let path = artifact_path(dir.path(), &entry.path).unwrap();
        verify_file(entry, &path).unwrap();
    }

    let entry = manifest.file("css/main.css").unwrap();
    let path = artifact_path(dir.path(), &entry.path).unwrap();
    std::fs::write(&path, b"p{x}").unwrap();
    assert!(matches!(
        verify_file(entry, &path),
        Err(Error::Integrity { .. })
    ));
}

#[test]
fn test_pinned_key_from_disk() {
    let temp = tempfile::TempDir::new().unwrap();
    let dir = camino::Utf8PathBuf::from_path_buf(temp.path().join("keys")).unwrap();
    let keys = KeyStore::new(dir);
    let signer = keys.load_or_bootstrap(1024).unwrap();

    let build = small_app();
    let manifest = updraft_manifest::ManifestBuilder::new(common::options(), signer)
        .build(build.path(), "2.0.0", Channel::Beta, None)
        .unwrap();

    let key = TrustedKey::from_file(keys.public_key_path()).unwrap();
    assert!(verify(&manifest, &key));
    assert!(!verify(&manifest, &trusted_key()));
}
