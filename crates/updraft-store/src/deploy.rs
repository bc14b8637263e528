//! Artifact deployment to an object store
//!
//! Uploads every file listed in a manifest to `{version}/{path}`, then the
//! manifest itself to `{version}/manifest.json`. Each artifact is re-hashed
//! before upload. A failing file does not stop the run; failures are
//! collected in the [`DeployReport`] and the manifest is only uploaded when
//! every artifact made it.

use crate::object::{
    artifact_key, manifest_key, ObjectMeta, ObjectStore, IMMUTABLE_CACHE_CONTROL,
    MANIFEST_CACHE_CONTROL,
};
use std::path::Path;
use tracing::{info, warn};
use updraft_core::{Error, FileEntry, Manifest, Result};
use updraft_manifest::{artifact_path, verify_artifact};

type ProgressFn = Box<dyn Fn(&FileEntry) + Send + Sync>;

/// One artifact that could not be deployed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployFailure {
    pub path: String,
    pub reason: String,
}

/// Outcome of a deploy run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeployReport {
    pub version: String,
    pub target: String,
    /// Object keys written, in manifest order
    pub uploaded: Vec<String>,
    pub failures: Vec<DeployFailure>,
    pub manifest_uploaded: bool,
}

impl DeployReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty() && self.manifest_uploaded
    }

    pub fn uploaded_count(&self) -> usize {
        self.uploaded.len()
    }
}

/// Pushes a manifest's artifacts to one object store
pub struct Deployer<'a> {
    store: &'a dyn ObjectStore,
    on_file: Option<ProgressFn>,
}

impl<'a> Deployer<'a> {
    pub fn new(store: &'a dyn ObjectStore) -> Self {
        Self {
            store,
            on_file: None,
        }
    }

    /// Called after each artifact is processed, successful or not.
    pub fn on_file(mut self, callback: impl Fn(&FileEntry) + Send + Sync + 'static) -> Self {
        self.on_file = Some(Box::new(callback));
        self
    }

    pub async fn deploy(&self, manifest: &Manifest, build_dir: &Path) -> Result<DeployReport> {
        if !build_dir.is_dir() {
            return Err(Error::input(format!(
                "Build directory not found: {}",
                build_dir.display()
            )));
        }

        info!(
            "Deploying {} ({} files) to {}",
            manifest.version,
            manifest.file_count,
            self.store.name()
        );

        let mut report = DeployReport {
            version: manifest.version.clone(),
            target: self.store.name().to_string(),
            ..Default::default()
        };

        for entry in &manifest.files {
            match self.deploy_file(&manifest.version, entry, build_dir).await {
                Ok(key) => report.uploaded.push(key),
                Err(e) => {
                    warn!("Failed to deploy {}: {}", entry.path, e);
                    report.failures.push(DeployFailure {
                        path: entry.path.clone(),
                        reason: e.to_string(),
                    });
                }
            }
            if let Some(callback) = &self.on_file {
                callback(entry);
            }
        }

        if report.failures.is_empty() {
            let meta =
                ObjectMeta::new("application/json").with_cache_control(MANIFEST_CACHE_CONTROL);
            let key = manifest_key(&manifest.version);
            match self
                .store
                .put(&key, manifest.to_json()?.into_bytes(), &meta)
                .await
            {
                Ok(()) => report.manifest_uploaded = true,
                Err(e) => {
                    warn!("Failed to upload manifest: {}", e);
                    report.failures.push(DeployFailure {
                        path: key,
                        reason: e.to_string(),
                    });
                }
            }
        } else {
            warn!(
                "Skipping manifest upload: {} of {} files failed",
                report.failures.len(),
                manifest.files.len()
            );
        }

        info!(
            "Deployed {}/{} files for {}",
            report.uploaded.len(),
            manifest.files.len(),
            manifest.version
        );
        Ok(report)
    }

    async fn deploy_file(&self, version: &str, entry: &FileEntry, build_dir: &Path) -> Result<String> {
        let path = artifact_path(build_dir, &entry.path)
            .ok_or_else(|| Error::input(format!("Invalid artifact path: {}", entry.path)))?;
        let bytes = tokio::fs::read(&path).await.map_err(|e| {
            Error::input(format!("Cannot read {}: {}", path.display(), e))
        })?;
        verify_artifact(entry, &bytes)?;

        let key = artifact_key(version, &entry.path);
        let meta = ObjectMeta::new(&entry.mime_type).with_cache_control(IMMUTABLE_CACHE_CONTROL);
        self.store.put(&key, bytes, &meta).await?;
        Ok(key)
    }
}
