//! Distribution Service
//!
//! Framework-independent operations behind the HTTP surface. Manifests are
//! returned exactly as stored; the service never re-serializes them.

use crate::stats::{StatsSnapshot, UpdateStats};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, warn};
use updraft_core::{Channel, Error, Result};
use updraft_manifest::{mime::mime_type_for, verify_artifact};
use updraft_store::{normalize_key, ManifestStore, ObjectStore};

/// Client version assumed when a check does not report one
pub const DEFAULT_CLIENT_VERSION: &str = "0.0.0";

/// One published channel, as listed by `GET channels`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelInfo {
    pub name: Channel,
    pub version: String,
    pub release_date: String,
}

/// Liveness report
#[derive(Debug, Clone, Serialize)]
pub struct Health {
    pub status: &'static str,
    pub timestamp: String,
    pub version: &'static str,
}

/// Artifact bytes ready to serve
#[derive(Debug, Clone)]
pub struct Download {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

/// Serves manifests and artifacts, and tallies requests
pub struct DistributionService {
    manifests: ManifestStore,
    objects: Arc<dyn ObjectStore>,
    stats: Arc<UpdateStats>,
}

impl DistributionService {
    pub fn new(
        manifests: ManifestStore,
        objects: Arc<dyn ObjectStore>,
        stats: Arc<UpdateStats>,
    ) -> Self {
        Self {
            manifests,
            objects,
            stats,
        }
    }

    pub fn stats(&self) -> &UpdateStats {
        &self.stats
    }

    /// Current manifest bytes for `channel`, recording the check.
    pub fn get_manifest(&self, channel: &str, current_version: Option<&str>) -> Result<Vec<u8>> {
        let channel: Channel = channel.parse()?;
        let raw = self.manifests.read_raw(channel)?;
        self.stats
            .record_check(current_version.unwrap_or(DEFAULT_CLIENT_VERSION), channel);
        Ok(raw)
    }

    /// Published channels in `stable, beta, dev` order. Unreadable channel
    /// files are skipped.
    pub fn list_channels(&self) -> Vec<ChannelInfo> {
        Channel::ALL
            .iter()
            .filter_map(|channel| match self.manifests.current(*channel) {
                Ok(manifest) => Some(ChannelInfo {
                    name: *channel,
                    version: manifest.version,
                    release_date: manifest
                        .release_date
                        .to_rfc3339_opts(SecondsFormat::AutoSi, true),
                }),
                Err(e) if e.is_not_found() => None,
                Err(e) => {
                    warn!("Skipping unreadable {} manifest: {}", channel, e);
                    None
                }
            })
            .collect()
    }

    pub fn health(&self) -> Health {
        Self::health_at(Utc::now())
    }

    fn health_at(now: DateTime<Utc>) -> Health {
        Health {
            status: "healthy",
            timestamp: now.to_rfc3339_opts(SecondsFormat::Millis, true),
            version: env!("CARGO_PKG_VERSION"),
        }
    }

    pub fn stats_snapshot(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Artifact bytes for a store key such as `3.5.1/js/app.bundle.js`.
    ///
    /// With `channel`, an artifact listed in that channel's current manifest
    /// is re-hashed before it is served, and a mismatch is an
    /// `Error::Integrity`.
    pub async fn download(&self, path: &str, channel: Option<&str>) -> Result<Download> {
        let key = normalize_key(path).ok_or_else(|| Error::not_found(format!("file {}", path)))?;

        let entry = match channel {
            Some(channel) => {
                let channel: Channel = channel.parse()?;
                match self.manifests.current(channel) {
                    Ok(manifest) => {
                        let prefix = format!("{}/", manifest.version);
                        key.strip_prefix(&prefix)
                            .and_then(|rel| manifest.file(rel))
                            .cloned()
                    }
                    Err(e) if e.is_not_found() => None,
                    Err(e) => return Err(e),
                }
            }
            None => None,
        };

        let bytes = self.objects.get(&key).await?;

        let mime_type = match &entry {
            Some(entry) => {
                verify_artifact(entry, &bytes)?;
                debug!("Verified {} against manifest", key);
                entry.mime_type.clone()
            }
            None => mime_type_for(Path::new(&key)).to_string(),
        };

        self.stats.record_download();
        Ok(Download { bytes, mime_type })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_health_shape() {
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        let health = DistributionService::health_at(now);
        assert_eq!(health.status, "healthy");
        assert_eq!(health.timestamp, "2026-03-01T12:00:00.000Z");
        assert_eq!(health.version, env!("CARGO_PKG_VERSION"));
    }
}
