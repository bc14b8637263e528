//! Manifest signing

use crate::canonical::canonical_payload;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use rsa::pkcs1v15::SigningKey;
use rsa::signature::{SignatureEncoding, Signer};
use rsa::{RsaPrivateKey, RsaPublicKey};
use sha2::Sha256;
use updraft_core::{Error, FileEntry, Result};

/// Signs the canonical `{version, files}` payload with RSA PKCS#1 v1.5 / SHA-256.
pub struct ManifestSigner {
    signing_key: SigningKey<Sha256>,
    public_key: RsaPublicKey,
}

impl ManifestSigner {
    pub fn new(private_key: RsaPrivateKey) -> Self {
        let public_key = RsaPublicKey::from(&private_key);
        Self {
            signing_key: SigningKey::<Sha256>::new(private_key),
            public_key,
        }
    }

    /// Base64 (standard alphabet, padded) signature for a version's file list.
    pub fn sign(&self, version: &str, files: &[FileEntry]) -> Result<String> {
        let payload = canonical_payload(version, files)?;
        let signature = self
            .signing_key
            .try_sign(&payload)
            .map_err(|e| Error::signature(format!("Signing failed: {}", e)))?;
        Ok(STANDARD.encode(signature.to_bytes()))
    }

    /// Public half, for pinning in clients.
    pub fn public_key(&self) -> &RsaPublicKey {
        &self.public_key
    }
}

impl std::fmt::Debug for ManifestSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ManifestSigner")
            .field("public_key", &self.public_key)
            .finish_non_exhaustive()
    }
}
