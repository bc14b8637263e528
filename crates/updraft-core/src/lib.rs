//! # updraft-core
//!
//! Core library for updraft providing:
//! - The signed update manifest model (`Manifest`, `FileEntry`)
//! - Release channels
//! - Version rules (minimum compatible version, breaking classification)
//! - The error taxonomy shared by every updraft crate
//! - Hierarchical configuration loading (embedded defaults, files, env)

pub mod config;
pub mod error;
pub mod types;
pub mod utils;
pub mod version;

pub use config::{HierarchicalConfigLoader, UpdraftConfig};
pub use error::{Error, Result};
pub use types::{Channel, FileEntry, Manifest, HASH_PREFIX};
pub use utils::get_home_dir;
pub use version::{is_breaking, min_compatible_version, parse_version, BreakingRule};
