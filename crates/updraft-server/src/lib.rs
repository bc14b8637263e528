//! Distribution Service for signed update manifests
//!
//! Serves the current manifest of each release channel byte for byte,
//! lists channels, reports health and request counters, and streams
//! versioned artifacts from an object store.

pub mod routes;
pub mod service;
pub mod stats;

pub use routes::{router, serve, ApiError, API_PREFIX};
pub use service::{ChannelInfo, DistributionService, Download, Health, DEFAULT_CLIENT_VERSION};
pub use stats::{
    StatsSnapshot, UpdateStats, MAX_TRACKED_VERSIONS, OVERFLOW_VERSION, UNKNOWN_VERSION,
};
