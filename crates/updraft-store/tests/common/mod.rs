//! Common test helpers for updraft-store integration tests
//!
//! Manifests here are structurally valid but unsigned; the store never
//! checks signatures.

use chrono::{TimeZone, Utc};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use updraft_core::{Channel, FileEntry, Manifest};
use updraft_manifest::hash_bytes;

/// Build-relative path and contents, critical first
pub const APP_FILES: &[(&str, &[u8], bool)] = &[
    ("index.html", b"<html></html>" as &[u8], true),
    ("js/app.bundle.js", b"boot()" as &[u8], true),
    ("css/main.css", b"body{}" as &[u8], false),
    ("img/logo.svg", b"<svg/>" as &[u8], false),
];

pub fn entry(version: &str, path: &str, contents: &[u8], critical: bool) -> FileEntry {
    FileEntry {
        path: path.to_string(),
        content_hash: hash_bytes(contents),
        size: contents.len() as u64,
        url: format!("https://cdn.example.com/{}/{}", version, path),
        critical,
        mime_type: "application/octet-stream".to_string(),
    }
}

pub fn manifest(version: &str, channel: Channel) -> Manifest {
    let files: Vec<FileEntry> = APP_FILES
        .iter()
        .map(|(path, contents, critical)| entry(version, path, contents, *critical))
        .collect();
    let mut sorted = files;
    sorted.sort_by(|a, b| a.install_order_key().cmp(&b.install_order_key()));

    Manifest {
        version: version.to_string(),
        release_date: Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap(),
        channel,
        min_compatible_version: format!("{}.0.0", version.split('.').next().unwrap()),
        breaking: false,
        changelog: BTreeMap::from([("en".to_string(), format!("Update to version {}", version))]),
        total_size: sorted.iter().map(|f| f.size).sum(),
        file_count: sorted.len(),
        files: sorted,
        signature: "dGVzdA==".to_string(),
    }
}

#[allow(dead_code)]
pub fn write_build_dir(root: &Path) {
    for (path, contents, _) in APP_FILES {
        let target = root.join(path);
        fs::create_dir_all(target.parent().unwrap()).unwrap();
        fs::write(target, contents).unwrap();
    }
}
