//! Reference update client for updraft
//!
//! Implements the client side of the protocol: a manifest is only trusted
//! after its signature verifies under a pinned public key, and every file
//! is hash-checked before anything in the install directory is touched.

pub mod client;
pub mod error;

pub use client::{
    installed_version, AvailableUpdate, StagedUpdate, UpdateCheck, UpdateClient, VERSION_MARKER,
};
pub use error::{ClientError, Result};
