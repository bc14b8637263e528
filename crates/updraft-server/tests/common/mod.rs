//! Common test helpers for updraft-server integration tests
//!
//! Starts the real router on an ephemeral port, backed by a temp manifest
//! directory and a local object store.

use chrono::{TimeZone, Utc};
use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::Arc;
use tempfile::TempDir;
use tokio::sync::oneshot;
use updraft_core::{Channel, FileEntry, Manifest};
use updraft_manifest::hash_bytes;
use updraft_server::{serve, DistributionService, UpdateStats};
use updraft_store::{LocalObjectStore, ManifestStore};

pub const APP_JS: &[u8] = b"console.log('v3.5.1')";
pub const INDEX_HTML: &[u8] = b"<!doctype html><title>app</title>";

pub struct TestServer {
    pub base_url: String,
    pub manifests: ManifestStore,
    pub cdn: std::path::PathBuf,
    pub stats: Arc<UpdateStats>,
    shutdown: Option<oneshot::Sender<()>>,
    _temp: TempDir,
}

impl TestServer {
    pub async fn start() -> Self {
        let temp = TempDir::new().unwrap();
        let manifests = ManifestStore::new(temp.path().join("manifests"));
        let cdn = temp.path().join("cdn");
        std::fs::create_dir_all(&cdn).unwrap();
        let stats = Arc::new(UpdateStats::new());

        let service = Arc::new(DistributionService::new(
            manifests.clone(),
            Arc::new(LocalObjectStore::new(&cdn)),
            Arc::clone(&stats),
        ));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr: SocketAddr = listener.local_addr().unwrap();
        let (tx, rx) = oneshot::channel::<()>();
        tokio::spawn(async move {
            serve(listener, service, async {
                let _ = rx.await;
            })
            .await
            .unwrap();
        });

        Self {
            base_url: format!("http://{}/v1/updates", addr),
            manifests,
            cdn,
            stats,
            shutdown: Some(tx),
            _temp: temp,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Put an artifact into the object store under `{version}/{path}`
    pub fn put_artifact(&self, version: &str, path: &str, bytes: &[u8]) {
        let target = self.cdn.join(version).join(path);
        std::fs::create_dir_all(target.parent().unwrap()).unwrap();
        std::fs::write(target, bytes).unwrap();
    }

    /// Publish a two-file manifest and deploy its artifacts
    pub fn publish(&self, version: &str, channel: Channel) -> Manifest {
        let manifest = manifest(version, channel);
        self.put_artifact(version, "index.html", INDEX_HTML);
        self.put_artifact(version, "js/app.bundle.js", APP_JS);
        self.manifests.publish(&manifest, false).unwrap();
        manifest
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}

fn entry(version: &str, path: &str, bytes: &[u8], mime: &str) -> FileEntry {
    FileEntry {
        path: path.to_string(),
        content_hash: hash_bytes(bytes),
        size: bytes.len() as u64,
        url: format!("http://localhost:8000/v1/updates/download/{}/{}", version, path),
        critical: true,
        mime_type: mime.to_string(),
    }
}

pub fn manifest(version: &str, channel: Channel) -> Manifest {
    let files = vec![
        entry(version, "index.html", INDEX_HTML, "text/html"),
        entry(version, "js/app.bundle.js", APP_JS, "application/javascript"),
    ];
    Manifest {
        version: version.to_string(),
        release_date: Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap(),
        channel,
        min_compatible_version: format!("{}.0.0", version.split('.').next().unwrap()),
        breaking: false,
        changelog: BTreeMap::from([("en".to_string(), format!("Update to version {}", version))]),
        total_size: files.iter().map(|f| f.size).sum(),
        file_count: files.len(),
        files,
        signature: "dGVzdA==".to_string(),
    }
}
