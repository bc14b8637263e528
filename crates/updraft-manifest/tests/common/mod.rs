//! Common test helpers for updraft-manifest integration tests
//!
//! - One shared RSA key per test binary (key generation is slow)
//! - Build directory fixtures shaped like a typical web app bundle

use rsa::RsaPrivateKey;
use std::fs;
use std::path::Path;
use std::sync::OnceLock;
use tempfile::TempDir;
use updraft_core::BreakingRule;
use updraft_manifest::{BuildOptions, ManifestBuilder, ManifestSigner, ScanOptions, TrustedKey};

pub const BASE_URL: &str = "https://cdn.example.com/updates";

// ─── Keys ────────────────────────────────────────────────────────────────────

fn shared_private_key() -> &'static RsaPrivateKey {
    static KEY: OnceLock<RsaPrivateKey> = OnceLock::new();
    KEY.get_or_init(|| {
        let mut rng = rand::rngs::OsRng;
        RsaPrivateKey::new(&mut rng, 1024).expect("test key generation")
    })
}

#[allow(dead_code)]
pub fn signer() -> ManifestSigner {
    ManifestSigner::new(shared_private_key().clone())
}

/// Sign arbitrary bytes with the shared key, bypassing canonical encoding
#[allow(dead_code)]
pub fn sign_raw(payload: &[u8]) -> String {
    use base64::{engine::general_purpose::STANDARD, Engine as _};
    use rsa::pkcs1v15::SigningKey;
    use rsa::signature::{SignatureEncoding, Signer};
    use sha2::Sha256;

    let key = SigningKey::<Sha256>::new(shared_private_key().clone());
    STANDARD.encode(key.sign(payload).to_bytes())
}

pub fn trusted_key() -> TrustedKey {
    TrustedKey::from_public(shared_private_key().to_public_key())
}

#[allow(dead_code)]
pub fn other_trusted_key() -> TrustedKey {
    static KEY: OnceLock<RsaPrivateKey> = OnceLock::new();
    let key = KEY.get_or_init(|| {
        let mut rng = rand::rngs::OsRng;
        RsaPrivateKey::new(&mut rng, 1024).expect("test key generation")
    });
    TrustedKey::from_public(key.to_public_key())
}

// ─── Builders ────────────────────────────────────────────────────────────────

#[allow(dead_code)]
pub fn options() -> BuildOptions {
    BuildOptions {
        scan: ScanOptions::new(
            &[
                "js/app.bundle.js".to_string(),
                "service-worker.js".to_string(),
                "index.html".to_string(),
            ],
            &[".DS_Store".to_string(), "Thumbs.db".to_string()],
        ),
        base_url: BASE_URL.to_string(),
        breaking_rule: BreakingRule::MinorZero,
        changelog_locale: "en".to_string(),
        breaking_override: None,
    }
}

pub fn builder() -> ManifestBuilder {
    ManifestBuilder::new(options(), signer())
}

// ─── Build directory fixtures ────────────────────────────────────────────────

#[allow(dead_code)]
pub fn write_file(root: &Path, rel: &str, contents: &[u8]) {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, contents).unwrap();
}

/// `index.html` (2 bytes), `js/app.bundle.js` (3 bytes), `css/main.css` (4 bytes)
pub fn small_app() -> TempDir {
    let temp = TempDir::new().unwrap();
    write_file(temp.path(), "index.html", b"<>");
    write_file(temp.path(), "js/app.bundle.js", b"a()");
    write_file(temp.path(), "css/main.css", b"p{ }");
    temp
}

/// A larger bundle with nested assets and metadata noise
#[allow(dead_code)]
pub fn web_app() -> TempDir {
    let temp = small_app();
    write_file(temp.path(), "service-worker.js", b"self.addEventListener('fetch', () => {})");
    write_file(temp.path(), "assets/logo.svg", b"<svg/>");
    write_file(temp.path(), "assets/fonts/inter.woff2", &[0u8, 1, 2, 3, 4, 5]);
    write_file(temp.path(), ".DS_Store", b"finder");
    write_file(temp.path(), "assets/Thumbs.db", b"thumbs");
    temp
}
