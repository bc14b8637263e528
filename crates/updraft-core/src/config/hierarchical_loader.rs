//! Hierarchical configuration loader with precedence
//!
//! Loads configuration from multiple sources with the following precedence (low to high):
//! 1. Embedded defaults (built into binary)
//! 2. Global config (~/.updraft/config.yaml)
//! 3. Project config (passed with --config)
//! 4. Environment variables (UPDRAFT_* prefix)
//! 5. CLI flags (handled by caller)
//!
//! Layers are deep-merged as YAML before deserialization, so a file only
//! needs to name the keys it changes.

use crate::error::{Error, Result};
use crate::types::UpdraftConfig;
use crate::utils::get_home_dir;
use camino::{Utf8Path, Utf8PathBuf};
use rust_embed::RustEmbed;
use serde_yaml_ng::{Mapping, Value};
use std::env;
use std::fs;
use tracing::debug;

/// Embedded configuration files
#[derive(RustEmbed)]
#[folder = "$CARGO_MANIFEST_DIR/../../embedded/config/"]
#[prefix = ""]
struct EmbeddedConfigs;

const DEFAULTS_FILE: &str = "updraft-defaults.yaml";
const GLOBAL_CONFIG_FILE: &str = "config.yaml";

/// Configuration hierarchy loader
pub struct HierarchicalConfigLoader {
    /// Directory holding the global config file
    config_dir: Utf8PathBuf,
}

impl HierarchicalConfigLoader {
    /// Create a loader rooted at ~/.updraft
    pub fn new() -> Result<Self> {
        let home = get_home_dir()?;
        let home = Utf8PathBuf::from_path_buf(home)
            .map_err(|p| Error::invalid_config(format!("Non UTF-8 home directory: {:?}", p)))?;
        Ok(Self {
            config_dir: home.join(".updraft"),
        })
    }

    /// Create a loader with a custom config directory
    pub fn with_dir(config_dir: Utf8PathBuf) -> Self {
        Self { config_dir }
    }

    /// Get the config directory path
    pub fn config_dir(&self) -> &Utf8Path {
        &self.config_dir
    }

    /// Load configuration with hierarchical precedence
    pub fn load(&self, project_file: Option<&Utf8Path>) -> Result<UpdraftConfig> {
        let mut merged = Self::load_embedded_defaults()?;

        let global_path = self.config_dir.join(GLOBAL_CONFIG_FILE);
        if global_path.exists() {
            debug!("Loading global config from {}", global_path);
            merge_values(&mut merged, Self::load_yaml_file(&global_path)?);
        }

        if let Some(path) = project_file {
            if !path.exists() {
                return Err(Error::config_not_found(path.as_str()));
            }
            debug!("Loading project config from {}", path);
            merge_values(&mut merged, Self::load_yaml_file(path)?);
        }

        let config: UpdraftConfig = serde_yaml_ng::from_value(merged)
            .map_err(|e| Error::invalid_config(format!("Failed to parse configuration: {}", e)))?;

        Self::apply_env_overrides(config)
    }

    /// Load the embedded defaults as a YAML tree
    fn load_embedded_defaults() -> Result<Value> {
        let embedded_file = EmbeddedConfigs::get(DEFAULTS_FILE).ok_or_else(|| {
            Error::config_not_found(format!("Embedded config not found: {}", DEFAULTS_FILE))
        })?;

        let content = std::str::from_utf8(&embedded_file.data).map_err(|_| {
            Error::invalid_config(format!("Invalid UTF-8 in embedded config: {}", DEFAULTS_FILE))
        })?;

        serde_yaml_ng::from_str(content).map_err(|e| {
            Error::invalid_config(format!(
                "Failed to parse embedded config {}: {}",
                DEFAULTS_FILE, e
            ))
        })
    }

    /// Load a YAML file as a tree
    fn load_yaml_file(path: &Utf8Path) -> Result<Value> {
        let content = fs::read_to_string(path)?;
        let value: Value = serde_yaml_ng::from_str(&content)
            .map_err(|e| Error::invalid_config(format!("Failed to parse {}: {}", path, e)))?;
        // An empty file parses as null; treat it as "no overrides"
        Ok(match value {
            Value::Null => Value::Mapping(Mapping::new()),
            other => other,
        })
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(mut config: UpdraftConfig) -> Result<UpdraftConfig> {
        if let Ok(val) = env::var("UPDRAFT_BUILD_DIR") {
            config.builder.build_dir = Utf8PathBuf::from(val);
        }

        if let Ok(val) = env::var("UPDRAFT_MANIFEST_DIR") {
            config.manifests.dir = Utf8PathBuf::from(val);
        }

        if let Ok(val) = env::var("UPDRAFT_KEYS_DIR") {
            config.signing.keys_dir = Utf8PathBuf::from(val);
        }

        if let Ok(val) = env::var("UPDRAFT_PUBLIC_KEY") {
            config.signing.public_key = Some(Utf8PathBuf::from(val));
        }

        if let Ok(val) = env::var("UPDRAFT_CDN_BASE_URL") {
            config.cdn.base_url = val;
        }

        if let Ok(val) = env::var("UPDRAFT_SERVER_HOST") {
            config.server.host = val;
        }

        if let Ok(val) = env::var("UPDRAFT_SERVER_PORT") {
            config.server.port = val.parse().map_err(|_| {
                Error::invalid_config("UPDRAFT_SERVER_PORT must be a valid port number")
            })?;
        }

        if let Ok(val) = env::var("UPDRAFT_STORE_TARGET") {
            config.store.default_target = val;
        }

        if let Ok(val) = env::var("UPDRAFT_LOCAL_STORE_ROOT") {
            config.store.local.root = Utf8PathBuf::from(val);
        }

        if let Ok(val) = env::var("UPDRAFT_S3_BUCKET") {
            config.store.s3.bucket = val;
        }

        if let Ok(val) = env::var("UPDRAFT_S3_REGION") {
            config.store.s3.region = val;
        }

        if let Ok(val) = env::var("UPDRAFT_S3_ENDPOINT") {
            config.store.s3.endpoint = Some(val);
        }

        Ok(config)
    }
}

/// Deep-merge `overlay` into `base`: mappings merge key by key, anything
/// else (scalars, sequences) is replaced.
fn merge_values(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Mapping(base_map), Value::Mapping(overlay_map)) => {
            for (key, value) in overlay_map {
                match base_map.get_mut(&key) {
                    Some(existing) => merge_values(existing, value),
                    None => {
                        base_map.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}
