//! Configuration types
//!
//! Every section has serde defaults, so a partial YAML file only needs to
//! name the keys it overrides.

use crate::version::BreakingRule;
use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};

/// Complete updraft configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct UpdraftConfig {
    /// Manifest builder settings
    #[serde(default)]
    pub builder: BuilderConfig,

    /// Public artifact location
    #[serde(default)]
    pub cdn: CdnConfig,

    /// Signing key location
    #[serde(default)]
    pub signing: SigningConfig,

    /// Manifest store location
    #[serde(default)]
    pub manifests: ManifestStoreConfig,

    /// Distribution API server
    #[serde(default)]
    pub server: ServerConfig,

    /// Object store backends
    #[serde(default)]
    pub store: ObjectStoreConfig,
}

/// Manifest builder settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct BuilderConfig {
    /// Default build output directory
    #[serde(default = "default_build_dir")]
    pub build_dir: Utf8PathBuf,

    /// Build-relative paths installed before everything else
    #[serde(default = "default_critical_files")]
    pub critical_files: Vec<String>,

    /// Exact file names never included in a manifest
    #[serde(default = "default_ignored_files")]
    pub ignored_files: Vec<String>,

    /// How the breaking flag is derived
    #[serde(default)]
    pub breaking_rule: BreakingRule,

    /// Locale used for the generated default changelog
    #[serde(default = "default_changelog_locale")]
    pub changelog_locale: String,
}

impl Default for BuilderConfig {
    fn default() -> Self {
        Self {
            build_dir: default_build_dir(),
            critical_files: default_critical_files(),
            ignored_files: default_ignored_files(),
            breaking_rule: BreakingRule::default(),
            changelog_locale: default_changelog_locale(),
        }
    }
}

fn default_build_dir() -> Utf8PathBuf {
    Utf8PathBuf::from("dist")
}
fn default_critical_files() -> Vec<String> {
    vec![
        "js/app.bundle.js".to_string(),
        "service-worker.js".to_string(),
        "index.html".to_string(),
    ]
}
fn default_ignored_files() -> Vec<String> {
    vec![".DS_Store".to_string(), "Thumbs.db".to_string()]
}
fn default_changelog_locale() -> String {
    "en".to_string()
}

/// Where published artifacts are fetched from
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CdnConfig {
    /// Prefix for every `FileEntry.url`; entries become `{base-url}/{version}/{path}`
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

impl Default for CdnConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:8000/v1/updates/download".to_string()
}

/// Signing key location
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SigningConfig {
    /// Directory holding `private_key.pem` and `public_key.pem`
    #[serde(default = "default_keys_dir")]
    pub keys_dir: Utf8PathBuf,

    /// RSA modulus size used when bootstrapping a key pair
    #[serde(default = "default_key_bits")]
    pub key_bits: usize,

    /// Pinned public key used for verification (defaults to the keys dir)
    #[serde(default)]
    pub public_key: Option<Utf8PathBuf>,
}

impl Default for SigningConfig {
    fn default() -> Self {
        Self {
            keys_dir: default_keys_dir(),
            key_bits: default_key_bits(),
            public_key: None,
        }
    }
}

fn default_keys_dir() -> Utf8PathBuf {
    Utf8PathBuf::from("keys")
}
fn default_key_bits() -> usize {
    2048
}

/// Manifest store location
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ManifestStoreConfig {
    #[serde(default = "default_manifest_dir")]
    pub dir: Utf8PathBuf,
}

impl Default for ManifestStoreConfig {
    fn default() -> Self {
        Self {
            dir: default_manifest_dir(),
        }
    }
}

fn default_manifest_dir() -> Utf8PathBuf {
    Utf8PathBuf::from("manifests")
}

/// Distribution API server
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Object store target that backs `GET download/{path}`
    #[serde(default = "default_download_target")]
    pub download_target: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            download_target: default_download_target(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8000
}
fn default_download_target() -> String {
    "local".to_string()
}

/// Object store backends, selected by target name
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ObjectStoreConfig {
    /// Target used by `deploy` when none is given
    #[serde(default = "default_target")]
    pub default_target: String,

    #[serde(default)]
    pub local: LocalStoreConfig,

    #[serde(default)]
    pub s3: S3StoreConfig,
}

impl Default for ObjectStoreConfig {
    fn default() -> Self {
        Self {
            default_target: default_target(),
            local: LocalStoreConfig::default(),
            s3: S3StoreConfig::default(),
        }
    }
}

fn default_target() -> String {
    "local".to_string()
}

/// Directory-backed object store
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct LocalStoreConfig {
    #[serde(default = "default_local_root")]
    pub root: Utf8PathBuf,
}

impl Default for LocalStoreConfig {
    fn default() -> Self {
        Self {
            root: default_local_root(),
        }
    }
}

fn default_local_root() -> Utf8PathBuf {
    Utf8PathBuf::from("cdn")
}

/// S3 or S3-compatible (R2, MinIO, Spaces) object store
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct S3StoreConfig {
    #[serde(default = "default_bucket")]
    pub bucket: String,

    #[serde(default = "default_region")]
    pub region: String,

    /// Custom endpoint for S3-compatible services
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Key prefix inside the bucket
    #[serde(default)]
    pub prefix: String,
}

impl Default for S3StoreConfig {
    fn default() -> Self {
        Self {
            bucket: default_bucket(),
            region: default_region(),
            endpoint: None,
            prefix: String::new(),
        }
    }
}

fn default_bucket() -> String {
    "updraft-updates".to_string()
}
fn default_region() -> String {
    "us-east-1".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let yaml = r#"
builder:
  critical-files:
    - boot.js
server:
  port: 9090
"#;
        let config: UpdraftConfig = serde_yaml_ng::from_str(yaml).unwrap();
        assert_eq!(config.builder.critical_files, vec!["boot.js".to_string()]);
        assert_eq!(config.builder.ignored_files.len(), 2);
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.signing.key_bits, 2048);
    }

    #[test]
    fn test_breaking_rule_kebab_case() {
        let yaml = "builder:\n  breaking-rule: never\n";
        let config: UpdraftConfig = serde_yaml_ng::from_str(yaml).unwrap();
        assert_eq!(config.builder.breaking_rule, BreakingRule::Never);
    }
}
