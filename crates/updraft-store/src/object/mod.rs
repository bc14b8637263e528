//! Blob storage for versioned artifacts
//!
//! One capability trait with interchangeable backends:
//! - `local`: a directory on disk (development, single host)
//! - `s3`: AWS S3 or any S3-compatible endpoint (Cloudflare R2, MinIO)
//!
//! Keys are `/`-separated relative paths such as `3.5.1/js/app.bundle.js`.

mod local;
mod s3;

pub use local::LocalObjectStore;
pub use s3::S3ObjectStore;

use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;
use updraft_core::types::ObjectStoreConfig;
use updraft_core::{Error, Result};

/// Cache policy for immutable versioned artifacts
pub const IMMUTABLE_CACHE_CONTROL: &str = "public, max-age=31536000";

/// Cache policy for manifest uploads
pub const MANIFEST_CACHE_CONTROL: &str = "public, max-age=300";

/// Metadata attached to an uploaded object
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectMeta {
    pub content_type: String,
    pub cache_control: Option<String>,
}

impl ObjectMeta {
    pub fn new(content_type: impl Into<String>) -> Self {
        Self {
            content_type: content_type.into(),
            cache_control: None,
        }
    }

    pub fn with_cache_control(mut self, cache_control: impl Into<String>) -> Self {
        self.cache_control = Some(cache_control.into());
        self
    }
}

/// Artifact blob store
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Backend name (`local`, `s3`)
    fn name(&self) -> &'static str;

    async fn put(&self, key: &str, bytes: Vec<u8>, meta: &ObjectMeta) -> Result<()>;

    /// Object bytes; `Error::NotFound` if absent or if `key` escapes the store.
    async fn get(&self, key: &str) -> Result<Vec<u8>>;

    /// Keys under `prefix`, sorted.
    async fn list(&self, prefix: &str) -> Result<Vec<String>>;

    async fn delete(&self, key: &str) -> Result<()>;
}

/// Validate a store key: relative, `/`-separated, no empty, `.` or `..`
/// segments. Returns `None` for keys that would escape the store root.
pub fn normalize_key(key: &str) -> Option<String> {
    if key.is_empty() || key.starts_with('/') {
        return None;
    }
    for part in key.split('/') {
        if part.is_empty() || part == "." || part == ".." || part.contains('\\') {
            return None;
        }
    }
    Some(key.to_string())
}

/// Object key for one artifact of a version
pub fn artifact_key(version: &str, path: &str) -> String {
    format!("{}/{}", version, path)
}

/// Object key for a version's manifest copy
pub fn manifest_key(version: &str) -> String {
    format!("{}/manifest.json", version)
}

/// Open the backend named `target`, or the configured default.
pub async fn open_object_store(
    config: &ObjectStoreConfig,
    target: Option<&str>,
) -> Result<Arc<dyn ObjectStore>> {
    let target = target.unwrap_or(config.default_target.as_str());
    debug!("Opening object store target '{}'", target);

    match target {
        "local" => Ok(Arc::new(LocalObjectStore::new(
            config.local.root.as_std_path(),
        ))),
        "s3" | "r2" | "cloudflare" => Ok(Arc::new(S3ObjectStore::new(&config.s3).await?)),
        other => Err(Error::invalid_config(format!(
            "Unknown object store target '{}'. Valid targets: local, s3",
            other
        ))),
    }
}
