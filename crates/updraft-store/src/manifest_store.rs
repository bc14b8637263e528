//! Append-only manifest store with atomic per-channel publication
//!
//! Layout:
//!
//! ```text
//! {dir}/manifest_stable.json          current manifest per channel
//! {dir}/history/stable/3.5.1.json     every manifest ever published
//! ```
//!
//! The current slot is replaced by writing a temp file in `{dir}` and
//! renaming it over the target, so a concurrent reader sees either the old
//! or the new manifest in full.

use semver::Version;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};
use updraft_core::{Channel, Error, Manifest, Result};

const HISTORY_DIR: &str = "history";

/// Directory-backed manifest store
#[derive(Debug, Clone)]
pub struct ManifestStore {
    dir: PathBuf,
}

/// Outcome of a publication
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Published {
    pub channel: Channel,
    pub version: String,
    /// Current-slot file that now holds the manifest
    pub path: PathBuf,
    /// Version that held the slot before, if any
    pub replaced: Option<String>,
}

impl ManifestStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// `manifest_{channel}.json`
    pub fn channel_path(&self, channel: Channel) -> PathBuf {
        self.dir.join(format!("manifest_{}.json", channel))
    }

    pub fn history_path(&self, channel: Channel, version: &str) -> PathBuf {
        self.dir
            .join(HISTORY_DIR)
            .join(channel.as_str())
            .join(format!("{}.json", version))
    }

    /// Make `manifest` the current one for its channel.
    ///
    /// Fails if the manifest is structurally invalid, or if this version was
    /// already published on the channel and `force` is not set.
    pub fn publish(&self, manifest: &Manifest, force: bool) -> Result<Published> {
        manifest.validate()?;
        Version::parse(&manifest.version)
            .map_err(|e| Error::input(format!("Invalid version '{}': {}", manifest.version, e)))?;

        let channel = manifest.channel;
        let history = self.history_path(channel, &manifest.version);
        if history.exists() && !force {
            return Err(Error::store(
                history.display().to_string(),
                format!(
                    "version {} is already published on {}; pass --force to republish",
                    manifest.version, channel
                ),
            ));
        }

        let replaced = match self.current(channel) {
            Ok(previous) => Some(previous.version),
            Err(e) if e.is_not_found() => None,
            Err(e) => {
                warn!("Replacing unreadable {} manifest: {}", channel, e);
                None
            }
        };

        let json = manifest.to_json()?;
        let archived_before = match fs::read(&history) {
            Ok(bytes) => Some(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => return Err(Error::Io(e)),
        };
        write_atomic(&history, json.as_bytes())?;

        let path = self.channel_path(channel);
        if let Err(e) = write_atomic(&path, json.as_bytes()) {
            restore_history(&history, archived_before.as_deref());
            return Err(e);
        }

        info!(
            "Published {} to {} channel{}",
            manifest.version,
            channel,
            replaced
                .as_deref()
                .map(|v| format!(" (replacing {})", v))
                .unwrap_or_default()
        );

        Ok(Published {
            channel,
            version: manifest.version.clone(),
            path,
            replaced,
        })
    }

    /// Stored bytes of the channel's current manifest, unmodified.
    pub fn read_raw(&self, channel: Channel) -> Result<Vec<u8>> {
        let path = self.channel_path(channel);
        match fs::read(&path) {
            Ok(bytes) => {
                debug!("Read {} bytes from {}", bytes.len(), path.display());
                Ok(bytes)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(Error::not_found(format!(
                "no manifest published for channel {}",
                channel
            ))),
            Err(e) => Err(Error::Io(e)),
        }
    }

    /// Parsed current manifest for a channel.
    pub fn current(&self, channel: Channel) -> Result<Manifest> {
        Manifest::from_slice(&self.read_raw(channel)?)
    }

    /// Channels that have a current manifest, in `stable, beta, dev` order.
    pub fn published_channels(&self) -> Vec<Channel> {
        Channel::ALL
            .iter()
            .copied()
            .filter(|c| self.channel_path(*c).is_file())
            .collect()
    }

    /// Archived versions for a channel, oldest first.
    pub fn history(&self, channel: Channel) -> Result<Vec<String>> {
        let dir = self.dir.join(HISTORY_DIR).join(channel.as_str());
        if !dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut versions: Vec<Version> = Vec::new();
        for entry in fs::read_dir(&dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            if let Ok(version) = Version::parse(stem) {
                versions.push(version);
            }
        }
        versions.sort();
        Ok(versions.iter().map(Version::to_string).collect())
    }

    /// An archived manifest.
    pub fn archived(&self, channel: Channel, version: &str) -> Result<Manifest> {
        let path = self.history_path(channel, version);
        match fs::read(&path) {
            Ok(bytes) => Manifest::from_slice(&bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(Error::not_found(format!(
                "manifest {} on channel {}",
                version, channel
            ))),
            Err(e) => Err(Error::Io(e)),
        }
    }
}

/// Undo the history write of a publication whose current-slot write failed.
fn restore_history(history: &Path, previous: Option<&[u8]>) {
    let result = match previous {
        Some(bytes) => write_atomic(history, bytes),
        None => fs::remove_file(history).map_err(Error::Io),
    };
    if let Err(e) = result {
        warn!("Failed to roll back {}: {}", history.display(), e);
    }
}

/// Write `contents` to a temp file beside `target`, then rename over it.
/// Readers see the old or the new contents, never a partial file.
pub fn write_atomic(target: &Path, contents: &[u8]) -> Result<()> {
    let dir = match target.parent() {
        Some(parent) if parent.as_os_str().is_empty() => Path::new("."),
        Some(parent) => parent,
        None => {
            return Err(Error::store(
                target.display().to_string(),
                "path has no parent directory",
            ))
        }
    };
    fs::create_dir_all(dir)?;

    let mut temp = NamedTempFile::new_in(dir)?;
    temp.write_all(contents)?;
    temp.as_file().sync_all()?;
    temp.persist(target).map_err(|e| Error::Io(e.error))?;
    Ok(())
}
