//! CLI command implementations

pub mod check;
pub mod deploy;
pub mod generate;
pub mod keys;
pub mod serve;
pub mod verify;

use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use updraft_core::{HierarchicalConfigLoader, UpdraftConfig};
use updraft_manifest::{KeyStore, TrustedKey};

/// Load configuration: embedded defaults, ~/.updraft/config.yaml, the
/// `--config` file, then `UPDRAFT_*` environment variables.
pub fn load_config(config_file: Option<&Utf8Path>) -> Result<UpdraftConfig> {
    let loader = HierarchicalConfigLoader::new().context("Failed to locate config directory")?;
    loader
        .load(config_file)
        .context("Failed to load configuration")
}

/// Pinned public key path: flag, then `signing.public-key`, then the keys dir.
pub fn public_key_path(flag: Option<Utf8PathBuf>, config: &UpdraftConfig) -> Utf8PathBuf {
    flag.or_else(|| config.signing.public_key.clone())
        .unwrap_or_else(|| KeyStore::new(config.signing.keys_dir.clone()).public_key_path())
}

pub fn load_trusted_key(flag: Option<Utf8PathBuf>, config: &UpdraftConfig) -> Result<TrustedKey> {
    let path = public_key_path(flag, config);
    TrustedKey::from_file(&path)
        .with_context(|| format!("Failed to load public key from {}", path))
}
