//! Advisory request counters
//!
//! Counts are best effort: they are kept in memory, reset on restart, and
//! are not guaranteed exact under concurrent updates.

use semver::Version;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use updraft_core::Channel;

/// Tally key used for client versions that do not parse
pub const UNKNOWN_VERSION: &str = "unknown";

/// Tally key for versions seen after the tally is full
pub const OVERFLOW_VERSION: &str = "other";

/// Distinct `{version}_{channel}` keys kept before new versions fold into
/// `other_{channel}`
pub const MAX_TRACKED_VERSIONS: usize = 256;

/// Counters shared by every request handler
#[derive(Debug, Default)]
pub struct UpdateStats {
    checks: AtomicU64,
    downloads: AtomicU64,
    versions: Mutex<HashMap<String, u64>>,
}

/// Point-in-time copy of the counters
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    pub checks: u64,
    pub downloads: u64,
    /// `"{client_version}_{channel}"` -> count
    pub versions: BTreeMap<String, u64>,
}

impl UpdateStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count a manifest check from a client running `client_version`.
    ///
    /// Versions are tallied as `major.minor.patch`; pre-release and build
    /// metadata are dropped. Once [`MAX_TRACKED_VERSIONS`] keys exist, checks
    /// from versions not yet tracked count under `other_{channel}`.
    pub fn record_check(&self, client_version: &str, channel: Channel) {
        self.checks.fetch_add(1, Ordering::Relaxed);

        let version = Version::parse(client_version.trim())
            .map(|v| format!("{}.{}.{}", v.major, v.minor, v.patch))
            .unwrap_or_else(|_| UNKNOWN_VERSION.to_string());
        let key = format!("{}_{}", version, channel);

        let mut versions = self.versions.lock().unwrap_or_else(|e| e.into_inner());
        let key = if versions.contains_key(&key) || versions.len() < MAX_TRACKED_VERSIONS {
            key
        } else {
            format!("{}_{}", OVERFLOW_VERSION, channel)
        };
        *versions.entry(key).or_insert(0) += 1;
    }

    pub fn record_download(&self) {
        self.downloads.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        let versions = self.versions.lock().unwrap_or_else(|e| e.into_inner());
        StatsSnapshot {
            checks: self.checks.load(Ordering::Relaxed),
            downloads: self.downloads.load(Ordering::Relaxed),
            versions: versions.iter().map(|(k, v)| (k.clone(), *v)).collect(),
        }
    }
}
