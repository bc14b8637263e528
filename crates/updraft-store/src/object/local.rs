//! Directory-backed object store

use super::{normalize_key, ObjectMeta, ObjectStore};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;
use updraft_core::{Error, Result};
use walkdir::WalkDir;

const PARTIAL_SUFFIX: &str = ".updraft-partial";

/// Objects stored as plain files under `root`. Content type and cache
/// metadata are not persisted; readers derive the type from the key.
#[derive(Debug, Clone)]
pub struct LocalObjectStore {
    root: PathBuf,
}

impl LocalObjectStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> Option<PathBuf> {
        let key = normalize_key(key)?;
        let mut path = self.root.clone();
        path.extend(key.split('/'));
        Some(path)
    }
}

#[async_trait]
impl ObjectStore for LocalObjectStore {
    fn name(&self) -> &'static str {
        "local"
    }

    async fn put(&self, key: &str, bytes: Vec<u8>, _meta: &ObjectMeta) -> Result<()> {
        let path = self
            .path_for(key)
            .ok_or_else(|| Error::store(key, "invalid object key"))?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| Error::store(key, e.to_string()))?;
        }

        // Write beside the target and rename so readers never see a partial object
        let mut staging = path.clone().into_os_string();
        staging.push(PARTIAL_SUFFIX);
        let staging = PathBuf::from(staging);
        fs::write(&staging, &bytes)
            .await
            .map_err(|e| Error::store(key, e.to_string()))?;
        fs::rename(&staging, &path)
            .await
            .map_err(|e| Error::store(key, e.to_string()))?;

        debug!("Stored {} ({} bytes) at {}", key, bytes.len(), path.display());
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>> {
        let path = self
            .path_for(key)
            .ok_or_else(|| Error::not_found(format!("object {}", key)))?;
        match fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e)
                if e.kind() == std::io::ErrorKind::NotFound
                    || e.kind() == std::io::ErrorKind::IsADirectory =>
            {
                Err(Error::not_found(format!("object {}", key)))
            }
            Err(e) if path.is_dir() => {
                debug!("Refusing to read directory {}: {}", path.display(), e);
                Err(Error::not_found(format!("object {}", key)))
            }
            Err(e) => Err(Error::store(key, e.to_string())),
        }
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>> {
        let root = self.root.clone();
        let prefix = prefix.to_string();

        tokio::task::spawn_blocking(move || -> Result<Vec<String>> {
            if !root.is_dir() {
                return Ok(Vec::new());
            }
            let mut keys = Vec::new();
            for entry in WalkDir::new(&root).follow_links(false) {
                let entry = entry.map_err(|e| Error::store(&prefix, e.to_string()))?;
                if !entry.file_type().is_file() {
                    continue;
                }
                let Ok(rel) = entry.path().strip_prefix(&root) else {
                    continue;
                };
                let key = rel
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy())
                    .collect::<Vec<_>>()
                    .join("/");
                if key.starts_with(&prefix) && !key.ends_with(PARTIAL_SUFFIX) {
                    keys.push(key);
                }
            }
            keys.sort();
            Ok(keys)
        })
        .await
        .map_err(|e| Error::store(self.root.display().to_string(), e.to_string()))?
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let path = self
            .path_for(key)
            .ok_or_else(|| Error::store(key, "invalid object key"))?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::store(key, e.to_string())),
        }
    }
}
