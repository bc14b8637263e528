//! Signed update manifests
//!
//! This crate produces and checks the manifests served by updraft:
//! - **Scanning**: walks a build directory, streams every artifact through
//!   SHA-256 and classifies critical files and MIME types
//! - **Canonical encoding**: the exact byte sequence covered by a signature
//! - **Signing**: RSA PKCS#1 v1.5 over SHA-256, base64 encoded
//! - **Key store**: one-time key pair bootstrap with owner-only private key
//! - **Verification**: signature checks against a pinned public key and
//!   per-artifact content hash checks
//!
//! # Example
//!
//! ```no_run
//! use updraft_core::{Channel, UpdraftConfig};
//! use updraft_manifest::{BuildOptions, KeyStore, ManifestBuilder, TrustedKey};
//!
//! fn main() -> updraft_core::Result<()> {
//!     let config = UpdraftConfig::default();
//!     let keys = KeyStore::new(config.signing.keys_dir.clone());
//!     let signer = keys.load_or_bootstrap(config.signing.key_bits)?;
//!
//!     let builder = ManifestBuilder::new(BuildOptions::from_config(&config), signer);
//!     let manifest = builder.build("dist".as_ref(), "3.5.1", Channel::Stable, None)?;
//!
//!     let key = TrustedKey::from_file(&keys.public_key_path())?;
//!     assert!(updraft_manifest::verify(&manifest, &key));
//!     Ok(())
//! }
//! ```

pub mod builder;
pub mod canonical;
pub mod keys;
pub mod mime;
pub mod scan;
pub mod signer;
pub mod verify;

pub use builder::{BuildOptions, ManifestBuilder};
pub use canonical::canonical_payload;
pub use keys::{KeyStore, PRIVATE_KEY_FILE, PUBLIC_KEY_FILE};
pub use scan::{artifact_path, hash_bytes, hash_file, ScanOptions, HASH_CHUNK_SIZE};
pub use signer::ManifestSigner;
pub use verify::{verify, verify_artifact, verify_file, verify_json, TrustedKey, VerifiedManifest};
