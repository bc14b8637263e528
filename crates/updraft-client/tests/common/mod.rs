//! Common test helpers for updraft-client integration tests
//!
//! Builds real signed manifests from a temp build directory and serves
//! them, with their artifacts, from a wiremock server.

use rsa::RsaPrivateKey;
use std::fs;
use std::sync::OnceLock;
use tempfile::TempDir;
use updraft_core::{BreakingRule, Channel, Manifest};
use updraft_manifest::{BuildOptions, ManifestBuilder, ManifestSigner, ScanOptions, TrustedKey};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const API_PATH: &str = "/v1/updates";

pub const FILES: &[(&str, &[u8])] = &[
    ("index.html", b"<!doctype html>" as &[u8]),
    ("js/app.bundle.js", b"start()" as &[u8]),
    ("css/main.css", b"body{margin:0}" as &[u8]),
];

fn private_key() -> &'static RsaPrivateKey {
    static KEY: OnceLock<RsaPrivateKey> = OnceLock::new();
    KEY.get_or_init(|| {
        let mut rng = rand::rngs::OsRng;
        RsaPrivateKey::new(&mut rng, 1024).expect("test key generation")
    })
}

pub fn trusted_key() -> TrustedKey {
    TrustedKey::from_public(private_key().to_public_key())
}

#[allow(dead_code)]
pub fn untrusted_key() -> TrustedKey {
    static KEY: OnceLock<RsaPrivateKey> = OnceLock::new();
    let key = KEY.get_or_init(|| {
        let mut rng = rand::rngs::OsRng;
        RsaPrivateKey::new(&mut rng, 1024).expect("test key generation")
    });
    TrustedKey::from_public(key.to_public_key())
}

/// Sign a manifest for `version` whose URLs point at `server`
pub fn signed_manifest(server: &MockServer, version: &str, channel: Channel) -> Manifest {
    let build = TempDir::new().unwrap();
    for (rel, contents) in FILES {
        let target = build.path().join(rel);
        fs::create_dir_all(target.parent().unwrap()).unwrap();
        fs::write(target, contents).unwrap();
    }

    let options = BuildOptions {
        scan: ScanOptions::new(&["js/app.bundle.js".to_string()], &[]),
        base_url: format!("{}/cdn", server.uri()),
        breaking_rule: BreakingRule::MinorZero,
        changelog_locale: "en".to_string(),
        breaking_override: None,
    };
    ManifestBuilder::new(options, ManifestSigner::new(private_key().clone()))
        .build(build.path(), version, channel, None)
        .unwrap()
}

pub async fn mount_manifest(server: &MockServer, manifest: &Manifest) {
    Mock::given(method("GET"))
        .and(path(format!("{}/manifest.json", API_PATH)))
        .and(query_param("channel", manifest.channel.as_str()))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(manifest.to_json().unwrap(), "application/json"),
        )
        .mount(server)
        .await;
}

/// Serve every artifact at `/cdn/{version}/{path}`
pub async fn mount_artifacts(server: &MockServer, version: &str) {
    for (rel, contents) in FILES {
        mount_artifact(server, version, rel, contents).await;
    }
}

pub async fn mount_artifact(server: &MockServer, version: &str, rel: &str, contents: &[u8]) {
    Mock::given(method("GET"))
        .and(path(format!("/cdn/{}/{}", version, rel)))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(contents.to_vec()))
        .mount(server)
        .await;
}

pub fn api_url(server: &MockServer) -> String {
    format!("{}{}", server.uri(), API_PATH)
}
