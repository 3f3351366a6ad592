//! HadronStore - an embedded object database engine.
//!
//! HadronStore keeps schema-validated records (ADP classes, atoms,
//! object containers) in either a RAM-resident or disk-resident
//! repository, with unique-key/enum/text indexes, append-only blob
//! storage for binary and document members, and an optional
//! delta-mirroring client that forwards every write to a cluster
//! daemon over TCP.
#![warn(missing_docs)]

pub mod blobstore;
pub mod constants;
pub mod container;
pub mod core;
pub mod delta_client;
pub mod idset;
pub mod index;
pub mod isam;
pub mod repo;
pub mod schema;
pub mod strings;
pub mod system;
pub mod types;

pub use core::{Config, Error, Result};

/// Crate version, as set in `Cargo.toml`.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
/// Crate name, as set in `Cargo.toml`.
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Initialize logging and the metrics registry. Call once, before
/// opening any repository.
pub fn init(config: &Config) {
    core::logging::init(&config.logging);
    system::metrics::init_registry();
    tracing::info!(name = NAME, version = VERSION, "starting up");
}
