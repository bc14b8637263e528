//! Storage for updraft
//!
//! - [`ManifestStore`]: append-only, per-channel manifest publication with
//!   atomic replacement of the current slot
//! - [`ObjectStore`]: artifact blobs on local disk or S3-compatible storage
//! - [`Deployer`]: pushes a manifest's artifacts to an object store

pub mod deploy;
pub mod manifest_store;
pub mod object;

pub use deploy::{DeployFailure, DeployReport, Deployer};
pub use manifest_store::{write_atomic, ManifestStore, Published};
pub use object::{
    artifact_key, manifest_key, normalize_key, open_object_store, LocalObjectStore, ObjectMeta,
    ObjectStore, S3ObjectStore,
};
