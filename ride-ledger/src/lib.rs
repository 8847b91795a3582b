//! RideLedger Core
//!
//! Shared ride registry with atomic per-ride state transitions.
//!
//! # Architecture
//!
//! - **Registry**: one shared map of rides plus a monotone id counter
//! - **Entry-level locking**: transitions are atomic per ride, never global
//! - **Actor surface**: RPC-style handle over a bounded mailbox
//! - **Write-through persistence**: RocksDB snapshot of map and counter
//!
//! # Invariants
//!
//! - Status only moves pending → accepted → completed, or pending → cancelled
//! - A driver is recorded iff the ride is accepted or completed
//! - Ride ids are strictly increasing and never reused
//! - `updated_at` strictly increases on every mutation

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    rust_2018_idioms,
    missing_debug_implementations,
    clippy::all
)]

pub mod actor;
pub mod config;
pub mod error;
pub mod ledger;
pub mod metrics;
pub mod registry;
pub mod storage;
pub mod types;

// Re-exports
pub use config::Config;
pub use error::{Error, Result};
pub use ledger::RideLedger;
pub use metrics::Metrics;
pub use registry::RideRegistry;
pub use storage::Storage;
pub use types::{CallerId, Location, Ride, RideId, RideStatus};
