//! Error types for updraft-core

use thiserror::Error;

/// Result type alias using updraft-core's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Error taxonomy shared by the builder, store, server and client
#[derive(Error, Debug)]
pub enum Error {
    /// Bad or missing build input (directory, version string)
    #[error("Invalid input: {message}")]
    Input { message: String },

    /// Channel outside the fixed set
    #[error("Invalid channel: {channel}. Valid channels: stable, beta, dev")]
    InvalidChannel { channel: String },

    /// Nothing published for a channel, or artifact absent
    #[error("Not found: {what}")]
    NotFound { what: String },

    /// Signing key missing/unreadable, or signature rejected
    #[error("Signature error: {message}")]
    Signature { message: String },

    /// Artifact bytes do not match the manifest entry
    #[error("Integrity check failed for {path}: {message}")]
    Integrity { path: String, message: String },

    /// Blob store or manifest store failure for a specific key
    #[error("Store error for '{key}': {message}")]
    Store { key: String, message: String },

    /// Manifest document violates a structural invariant
    #[error("Invalid manifest: {message}")]
    InvalidManifest { message: String },

    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: String },

    /// Invalid configuration format
    #[error("Invalid configuration format: {message}")]
    InvalidConfig { message: String },

    /// YAML parsing error
    #[error("YAML parsing error: {0}")]
    YamlParse(#[from] serde_yaml_ng::Error),

    /// JSON parsing error
    #[error("JSON parsing error: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create an input error
    pub fn input(message: impl Into<String>) -> Self {
        Self::Input {
            message: message.into(),
        }
    }

    /// Create an invalid channel error
    pub fn invalid_channel(channel: impl Into<String>) -> Self {
        Self::InvalidChannel {
            channel: channel.into(),
        }
    }

    /// Create a not found error
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound { what: what.into() }
    }

    /// Create a signature error
    pub fn signature(message: impl Into<String>) -> Self {
        Self::Signature {
            message: message.into(),
        }
    }

    /// Create an integrity error for an artifact path
    pub fn integrity(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Integrity {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a store error for a key
    pub fn store(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Store {
            key: key.into(),
            message: message.into(),
        }
    }

    /// Create an invalid manifest error
    pub fn invalid_manifest(message: impl Into<String>) -> Self {
        Self::InvalidManifest {
            message: message.into(),
        }
    }

    /// Create a config not found error
    pub fn config_not_found(path: impl Into<String>) -> Self {
        Self::ConfigNotFound { path: path.into() }
    }

    /// Create an invalid config error
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Whether this error means "nothing there" rather than a failure
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
