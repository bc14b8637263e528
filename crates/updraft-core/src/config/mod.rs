//! Configuration loading and management

mod hierarchical_loader;

pub use crate::types::UpdraftConfig;
pub use hierarchical_loader::HierarchicalConfigLoader;
