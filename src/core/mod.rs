//! Core foundations: error handling, configuration and logging.
//!
//! Every other module in the crate depends on this one; nothing here
//! depends on storage, schema or index code.

/// Error types and result handling
pub mod error;
/// Configuration management
pub mod config;
/// Logging initialization
pub mod logging;

pub use error::{Error, Result};
pub use config::Config;
