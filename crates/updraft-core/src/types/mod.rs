//! Type definitions for updraft

mod channel;
mod config_types;
mod manifest;

pub use channel::Channel;
pub use config_types::*;
pub use manifest::{FileEntry, Manifest, HASH_PREFIX};
