//! Signed update manifest format.
//!
//! A manifest describes one version's distributable file set on one channel.
//! Only `version` and `files` are covered by the detached `signature`; the
//! remaining fields are descriptive.

use crate::error::{Error, Result};
use crate::types::Channel;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// Algorithm tag prepended to every content hash.
pub const HASH_PREFIX: &str = "sha256-";

/// One distributable artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileEntry {
    /// POSIX-style path relative to the build directory
    pub path: String,

    /// `sha256-<hex>` digest of the full file content. Documents using the
    /// legacy `hash` key load, but a signature made over that encoding does
    /// not verify; such manifests have to be regenerated.
    #[serde(alias = "hash")]
    pub content_hash: String,

    /// Byte length
    pub size: u64,

    /// Fully qualified retrieval location
    pub url: String,

    /// Must be activated before any non-critical file
    pub critical: bool,

    /// Content type for transport
    pub mime_type: String,
}

impl FileEntry {
    /// Hex digest without the algorithm tag, if the tag is the supported one.
    pub fn hex_digest(&self) -> Option<&str> {
        self.content_hash.strip_prefix(HASH_PREFIX)
    }

    /// Install order key: critical entries first, then by path.
    pub fn install_order_key(&self) -> (bool, &str) {
        (!self.critical, self.path.as_str())
    }
}

/// Published manifest for one version on one channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    pub version: String,

    pub release_date: DateTime<Utc>,

    pub channel: Channel,

    /// Clients below this version cannot safely apply the update. The
    /// legacy `minVersion` key is also accepted.
    #[serde(alias = "minVersion")]
    pub min_compatible_version: String,

    pub breaking: bool,

    /// Locale code -> human-readable text
    #[serde(default)]
    pub changelog: BTreeMap<String, String>,

    /// Critical entries first, then lexicographic by path
    pub files: Vec<FileEntry>,

    pub total_size: u64,

    pub file_count: usize,

    /// Base64 PKCS#1 v1.5 / SHA-256 signature over `{version, files}`
    pub signature: String,
}

impl Manifest {
    /// Serializes the manifest to pretty JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Deserializes a manifest from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Deserializes a manifest from raw bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }

    /// Looks up an entry by path.
    pub fn file(&self, path: &str) -> Option<&FileEntry> {
        self.files.iter().find(|f| f.path == path)
    }

    /// Checks the structural invariants: unique paths, supported hash tag,
    /// install order, and aggregate fields.
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::with_capacity(self.files.len());
        for entry in &self.files {
            if !seen.insert(entry.path.as_str()) {
                return Err(Error::invalid_manifest(format!(
                    "duplicate path: {}",
                    entry.path
                )));
            }
            if entry.hex_digest().is_none() {
                return Err(Error::invalid_manifest(format!(
                    "unsupported hash for {}: {}",
                    entry.path, entry.content_hash
                )));
            }
        }

        let ordered = self
            .files
            .windows(2)
            .all(|w| w[0].install_order_key() <= w[1].install_order_key());
        if !ordered {
            return Err(Error::invalid_manifest(
                "files are not ordered critical-first then by path",
            ));
        }

        if self.file_count != self.files.len() {
            return Err(Error::invalid_manifest(format!(
                "fileCount is {} but manifest lists {} files",
                self.file_count,
                self.files.len()
            )));
        }

        let total: u64 = self.files.iter().map(|f| f.size).sum();
        if self.total_size != total {
            return Err(Error::invalid_manifest(format!(
                "totalSize is {} but files sum to {}",
                self.total_size, total
            )));
        }

        Ok(())
    }
}
