//! Publisher key pair storage and one-time bootstrap

use crate::signer::ManifestSigner;
use camino::{Utf8Path, Utf8PathBuf};
use rsa::pkcs8::{DecodePrivateKey, EncodePrivateKey, EncodePublicKey, LineEnding};
use rsa::{RsaPrivateKey, RsaPublicKey};
use std::fs::{self, OpenOptions};
use std::io::Write;
use tracing::{debug, info, warn};
use updraft_core::{Error, Result};

/// PKCS#8 PEM private key file name
pub const PRIVATE_KEY_FILE: &str = "private_key.pem";

/// SubjectPublicKeyInfo PEM public key file name
pub const PUBLIC_KEY_FILE: &str = "public_key.pem";

/// Smallest modulus accepted for new keys
const MIN_KEY_BITS: usize = 1024;

/// Directory holding the publisher key pair
#[derive(Debug, Clone)]
pub struct KeyStore {
    dir: Utf8PathBuf,
}

impl KeyStore {
    pub fn new(dir: impl Into<Utf8PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Utf8Path {
        &self.dir
    }

    pub fn private_key_path(&self) -> Utf8PathBuf {
        self.dir.join(PRIVATE_KEY_FILE)
    }

    pub fn public_key_path(&self) -> Utf8PathBuf {
        self.dir.join(PUBLIC_KEY_FILE)
    }

    /// Whether either half of the key pair is present
    pub fn exists(&self) -> bool {
        self.private_key_path().exists() || self.public_key_path().exists()
    }

    /// Generate and persist a new key pair. Refuses to overwrite existing keys.
    pub fn generate(&self, bits: usize) -> Result<ManifestSigner> {
        if bits < MIN_KEY_BITS {
            return Err(Error::input(format!(
                "Key size {} is below the minimum of {} bits",
                bits, MIN_KEY_BITS
            )));
        }
        if self.exists() {
            return Err(Error::signature(format!(
                "Key material already present in {}; refusing to overwrite",
                self.dir
            )));
        }

        info!("Generating {}-bit RSA key pair in {}", bits, self.dir);
        let mut rng = rand::rngs::OsRng;
        let private_key = RsaPrivateKey::new(&mut rng, bits)
            .map_err(|e| Error::signature(format!("Key generation failed: {}", e)))?;

        fs::create_dir_all(&self.dir)?;
        let private_pem = private_key
            .to_pkcs8_pem(LineEnding::LF)
            .map_err(|e| Error::signature(format!("Failed to encode private key: {}", e)))?;
        write_private(&self.private_key_path(), private_pem.as_bytes())?;

        let public_pem = RsaPublicKey::from(&private_key)
            .to_public_key_pem(LineEnding::LF)
            .map_err(|e| Error::signature(format!("Failed to encode public key: {}", e)))?;
        fs::write(self.public_key_path(), public_pem)?;

        Ok(ManifestSigner::new(private_key))
    }

    /// Load the signing key from disk.
    pub fn load_signer(&self) -> Result<ManifestSigner> {
        let path = self.private_key_path();
        let pem = fs::read_to_string(&path).map_err(|e| {
            Error::signature(format!("Cannot read private key {}: {}", path, e))
        })?;
        let private_key = RsaPrivateKey::from_pkcs8_pem(&pem)
            .map_err(|e| Error::signature(format!("Invalid private key {}: {}", path, e)))?;
        debug!("Loaded signing key from {}", path);
        Ok(ManifestSigner::new(private_key))
    }

    /// Load the signing key, generating a pair only if neither file exists.
    /// A public key without its private half is a `Signature` error.
    pub fn load_or_bootstrap(&self, bits: usize) -> Result<ManifestSigner> {
        let private_path = self.private_key_path();
        if private_path.exists() {
            return self.load_signer();
        }

        if self.public_key_path().exists() {
            return Err(Error::signature(format!(
                "Public key {} exists but private key {} is missing; restore it instead of regenerating",
                self.public_key_path(),
                private_path
            )));
        }

        warn!(
            "No signing keys found in {}; bootstrapping a new key pair. Distribute {} to clients.",
            self.dir,
            self.public_key_path()
        );
        self.generate(bits)
    }

    /// Public key PEM text, for pinning in clients.
    pub fn public_key_pem(&self) -> Result<String> {
        let path = self.public_key_path();
        fs::read_to_string(&path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::not_found(format!("public key {}", path))
            } else {
                Error::Io(e)
            }
        })
    }
}

/// Create the private key file with owner-only permissions.
fn write_private(path: &Utf8Path, contents: &[u8]) -> Result<()> {
    let mut options = OpenOptions::new();
    options.write(true).create_new(true);

    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let mut file = options.open(path)?;
    file.write_all(contents)?;
    file.sync_all()?;
    Ok(())
}
