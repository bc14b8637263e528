//! Signature verification and artifact integrity checks
//!
//! `verify` and `verify_json` never error: every failure mode (wrong key,
//! malformed base64, truncated signature, missing fields) is reported as
//! `false`. Artifact checks return `Error::Integrity` with the offending path.

use crate::canonical::canonical_payload;
use crate::scan::{hash_bytes, hash_file};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use rsa::pkcs1::DecodeRsaPublicKey;
use rsa::pkcs1v15::{Signature, VerifyingKey};
use rsa::pkcs8::DecodePublicKey;
use rsa::signature::Verifier;
use rsa::RsaPublicKey;
use serde_json::Value;
use sha2::Sha256;
use std::fs;
use std::path::Path;
use tracing::debug;
use updraft_core::{Error, FileEntry, Manifest, Result};

/// Public key pinned by a client out of band.
#[derive(Debug, Clone)]
pub struct TrustedKey {
    public_key: RsaPublicKey,
}

impl TrustedKey {
    pub fn from_public(public_key: RsaPublicKey) -> Self {
        Self { public_key }
    }

    pub fn public_key(&self) -> &RsaPublicKey {
        &self.public_key
    }

    /// Parse a SubjectPublicKeyInfo (`BEGIN PUBLIC KEY`) or PKCS#1
    /// (`BEGIN RSA PUBLIC KEY`) PEM document.
    pub fn from_pem(pem: &str) -> Result<Self> {
        let public_key = RsaPublicKey::from_public_key_pem(pem)
            .or_else(|_| RsaPublicKey::from_pkcs1_pem(pem))
            .map_err(|e| Error::signature(format!("Invalid public key: {}", e)))?;
        Ok(Self::from_public(public_key))
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let pem = fs::read_to_string(path).map_err(|e| {
            Error::signature(format!(
                "Cannot read public key {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::from_pem(&pem)
    }

    fn check(&self, version: &str, files: &[FileEntry], signature_b64: &str) -> bool {
        let Ok(payload) = canonical_payload(version, files) else {
            return false;
        };
        let Ok(raw) = STANDARD.decode(signature_b64.trim()) else {
            debug!("Signature is not valid base64");
            return false;
        };
        let Ok(signature) = Signature::try_from(raw.as_slice()) else {
            return false;
        };
        VerifyingKey::<Sha256>::new(self.public_key.clone())
            .verify(&payload, &signature)
            .is_ok()
    }
}

/// Whether `manifest.signature` is valid for its `{version, files}` under `key`.
pub fn verify(manifest: &Manifest, key: &TrustedKey) -> bool {
    key.check(&manifest.version, &manifest.files, &manifest.signature)
}

/// Structural variant for raw manifest JSON. Only `version`, `files` and
/// `signature` need to be present.
pub fn verify_json(raw: &str, key: &TrustedKey) -> bool {
    let Ok(value) = serde_json::from_str::<Value>(raw) else {
        return false;
    };
    let (Some(version), Some(files), Some(signature)) = (
        value.get("version").and_then(Value::as_str),
        value.get("files"),
        value.get("signature").and_then(Value::as_str),
    ) else {
        return false;
    };
    let Ok(files) = serde_json::from_value::<Vec<FileEntry>>(files.clone()) else {
        return false;
    };
    key.check(version, &files, signature)
}

/// Check downloaded bytes against their manifest entry.
pub fn verify_artifact(entry: &FileEntry, bytes: &[u8]) -> Result<()> {
    check_size(entry, bytes.len() as u64)?;
    check_hash(entry, &hash_bytes(bytes))
}

/// Check a file on disk against its manifest entry.
pub fn verify_file(entry: &FileEntry, path: &Path) -> Result<()> {
    let metadata = fs::metadata(path)
        .map_err(|e| Error::integrity(&entry.path, format!("cannot read {}: {}", path.display(), e)))?;
    check_size(entry, metadata.len())?;
    check_hash(entry, &hash_file(path)?)
}

fn check_size(entry: &FileEntry, actual: u64) -> Result<()> {
    if actual != entry.size {
        return Err(Error::integrity(
            &entry.path,
            format!("expected {} bytes, got {}", entry.size, actual),
        ));
    }
    Ok(())
}

fn check_hash(entry: &FileEntry, actual: &str) -> Result<()> {
    if entry.hex_digest().is_none() {
        return Err(Error::integrity(
            &entry.path,
            format!("unsupported hash algorithm in {}", entry.content_hash),
        ));
    }
    if !actual.eq_ignore_ascii_case(&entry.content_hash) {
        return Err(Error::integrity(
            &entry.path,
            format!("expected {}, got {}", entry.content_hash, actual),
        ));
    }
    Ok(())
}

/// A manifest whose signature has been checked against a pinned key.
///
/// Install code takes this type rather than `Manifest`, so an unverified
/// manifest cannot reach it.
#[derive(Debug, Clone)]
pub struct VerifiedManifest {
    manifest: Manifest,
}

impl VerifiedManifest {
    pub fn new(manifest: Manifest, key: &TrustedKey) -> Result<Self> {
        if !verify(&manifest, key) {
            return Err(Error::signature(format!(
                "integrity check failed: manifest {} ({}) is not signed by the trusted key",
                manifest.version, manifest.channel
            )));
        }
        manifest.validate()?;
        Ok(Self { manifest })
    }

    pub fn from_json(raw: &str, key: &TrustedKey) -> Result<Self> {
        Self::new(Manifest::from_json(raw)?, key)
    }

    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    pub fn into_inner(self) -> Manifest {
        self.manifest
    }
}

impl std::ops::Deref for VerifiedManifest {
    type Target = Manifest;

    fn deref(&self) -> &Manifest {
        &self.manifest
    }
}
