//! Update client
//!
//! Check, download and apply follow the manifest protocol:
//! 1. Fetch the channel manifest and verify its signature against the
//!    pinned key. Nothing else happens if verification fails.
//! 2. Download every listed file into a staging directory inside the
//!    install directory, checking size and content hash of each.
//! 3. Move staged files into place in manifest order (critical first).

use crate::error::{ClientError, Result};
use semver::Version;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;
use tracing::{debug, info, warn};
use updraft_core::{Channel, Error, FileEntry};
use updraft_manifest::{artifact_path, verify_artifact, TrustedKey, VerifiedManifest};

/// Marker file recording the installed version inside an install directory
pub const VERSION_MARKER: &str = ".updraft-version";

const STAGING_PREFIX: &str = ".updraft-staging-";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Result of an update check
#[derive(Debug)]
pub enum UpdateCheck {
    /// Nothing has been published on the channel
    NoManifest,
    UpToDate { latest: String },
    Available(AvailableUpdate),
}

#[derive(Debug)]
pub struct AvailableUpdate {
    pub manifest: VerifiedManifest,
    /// The running version is below `minCompatibleVersion`
    pub requires_full_install: bool,
}

/// Fetches and applies signed updates from one update server
pub struct UpdateClient {
    http: reqwest::Client,
    base_url: String,
    key: TrustedKey,
    max_attempts: u32,
}

impl UpdateClient {
    /// `base_url` is the API root, e.g. `https://updates.example.com/v1/updates`.
    pub fn new(base_url: impl Into<String>, key: TrustedKey) -> Result<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let http = reqwest::Client::builder()
            .user_agent(concat!("updraft/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .map_err(|e| ClientError::http(&base_url, e))?;

        Ok(Self {
            http,
            base_url,
            key,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        })
    }

    /// Set maximum attempts per artifact download
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    /// Fetch and verify the channel manifest, and compare it to `current_version`.
    pub async fn check(&self, channel: Channel, current_version: &str) -> Result<UpdateCheck> {
        let url = format!("{}/manifest.json", self.base_url);
        debug!("Checking {} for {} updates", url, channel);

        let response = self
            .http
            .get(&url)
            .query(&[("channel", channel.as_str()), ("current_version", current_version)])
            .send()
            .await
            .map_err(|e| ClientError::http(&url, e))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            info!("No manifest published on {}", channel);
            return Ok(UpdateCheck::NoManifest);
        }
        if !response.status().is_success() {
            return Err(ClientError::Status {
                url,
                status: response.status().as_u16(),
            });
        }

        let raw = response
            .text()
            .await
            .map_err(|e| ClientError::http(&url, e))?;
        let manifest = VerifiedManifest::from_json(&raw, &self.key)?;
        info!("Verified manifest {} on {}", manifest.version, channel);

        let latest = parse(&manifest.version)?;
        let current = Version::parse(current_version.trim()).unwrap_or(Version::new(0, 0, 0));
        if latest <= current {
            return Ok(UpdateCheck::UpToDate {
                latest: manifest.version.clone(),
            });
        }

        let min_compatible = parse(&manifest.min_compatible_version)?;
        Ok(UpdateCheck::Available(AvailableUpdate {
            requires_full_install: current < min_compatible,
            manifest,
        }))
    }

    /// Download and verify every file of `update` into a staging area under
    /// `install_dir`. Any failure discards the staging area.
    pub async fn download(
        &self,
        update: &VerifiedManifest,
        install_dir: &Path,
    ) -> Result<StagedUpdate> {
        fs::create_dir_all(install_dir)?;
        let staging = tempfile::Builder::new()
            .prefix(STAGING_PREFIX)
            .tempdir_in(install_dir)?;

        for entry in &update.files {
            let target = artifact_path(staging.path(), &entry.path).ok_or_else(|| {
                Error::integrity(&entry.path, "path escapes the install directory")
            })?;
            let bytes = self.fetch_artifact(entry).await?;
            verify_artifact(entry, &bytes)?;

            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            tokio::fs::write(&target, &bytes).await?;
            debug!("Staged {} ({} bytes)", entry.path, bytes.len());
        }

        info!(
            "Downloaded and verified {} files for {}",
            update.file_count, update.version
        );
        Ok(StagedUpdate {
            manifest: update.clone(),
            staging,
            install_dir: install_dir.to_path_buf(),
        })
    }

    async fn fetch_artifact(&self, entry: &FileEntry) -> Result<Vec<u8>> {
        let mut attempt = 1;
        loop {
            match self.fetch_once(&entry.url).await {
                Ok(bytes) => return Ok(bytes),
                Err(e) if e.is_transient() && attempt < self.max_attempts => {
                    warn!(
                        "Download of {} failed (attempt {}/{}): {}",
                        entry.path, attempt, self.max_attempts, e
                    );
                    tokio::time::sleep(Duration::from_millis(200 * u64::from(attempt))).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn fetch_once(&self, url: &str) -> Result<Vec<u8>> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| ClientError::http(url, e))?;
        if !response.status().is_success() {
            return Err(ClientError::Status {
                url: url.to_string(),
                status: response.status().as_u16(),
            });
        }
        let bytes = response
            .bytes()
            .await
            .map_err(|e| ClientError::http(url, e))?;
        Ok(bytes.to_vec())
    }
}

/// Verified files waiting to be moved into the install directory
#[derive(Debug)]
pub struct StagedUpdate {
    manifest: VerifiedManifest,
    staging: TempDir,
    install_dir: PathBuf,
}

impl StagedUpdate {
    pub fn manifest(&self) -> &VerifiedManifest {
        &self.manifest
    }

    pub fn staging_dir(&self) -> &Path {
        self.staging.path()
    }

    /// Move staged files into place, critical files first, then record the
    /// installed version. Returns the applied paths in order.
    pub fn apply(self) -> Result<Vec<String>> {
        let mut applied = Vec::with_capacity(self.manifest.files.len());

        for entry in &self.manifest.files {
            let staged = artifact_path(self.staging.path(), &entry.path)
                .ok_or_else(|| Error::integrity(&entry.path, "invalid path"))?;
            let target = artifact_path(&self.install_dir, &entry.path)
                .ok_or_else(|| Error::integrity(&entry.path, "invalid path"))?;

            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::rename(&staged, &target)?;
            debug!("Applied {}", entry.path);
            applied.push(entry.path.clone());
        }

        fs::write(
            self.install_dir.join(VERSION_MARKER),
            format!("{}\n", self.manifest.version),
        )?;
        info!(
            "Applied {} ({} files) to {}",
            self.manifest.version,
            applied.len(),
            self.install_dir.display()
        );
        Ok(applied)
    }
}

/// Version recorded by the last successful apply, if any.
pub fn installed_version(install_dir: &Path) -> Option<String> {
    let raw = fs::read_to_string(install_dir.join(VERSION_MARKER)).ok()?;
    let version = raw.trim();
    Version::parse(version).ok().map(|_| version.to_string())
}

fn parse(version: &str) -> Result<Version> {
    Ok(updraft_core::parse_version(version)?)
}
