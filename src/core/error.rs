//! Error types and handling for the database core.
//!
//! One variant per error kind in the data model (lifecycle,
//! validation, lookup, I/O). Predictable errors propagate as typed
//! results; unrecoverable schema corruption aborts the process instead
//! of returning a `Result` (see [`Error::abort_on_corruption`]).

use thiserror::Error;

/// Result type used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type for the database core.
#[derive(Error, Debug)]
pub enum Error {
    /// Operation called before initialization completed, or after close.
    #[error("not initialized: {0}")]
    NotInit(String),

    /// Second registration of an already-registered name, or a duplicate
    /// unique-key value on insert.
    #[error("already exists: {0}")]
    Duplicate(String),

    /// A required argument was missing or malformed.
    #[error("bad argument: {0}")]
    Argument(String),

    /// A value failed to parse as its declared base type.
    #[error("bad value: {0}")]
    BadValue(String),

    /// Operation refused by a member's base type (e.g. `fetch_bin` on a
    /// non-blob member).
    #[error("type error: {0}")]
    Type(String),

    /// Object ID outside the current population, or a lookup key absent.
    #[error("not found: {0}")]
    NotFound(String),

    /// Non-contiguous object ID on insert, or a replay line seen out of
    /// order, or an initialization step called out of sequence.
    #[error("sequence error: {0}")]
    Sequence(String),

    /// A persistent file failed to parse or failed an invariant check.
    #[error("corrupt data: {0}")]
    Corrupt(String),

    /// Underlying I/O failure.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Delta mirror send failure.
    #[error("mirror send failed: {0}")]
    SendFail(String),

    /// Delta mirror receive failure.
    #[error("mirror recv failed: {0}")]
    RecvFail(String),

    /// Segment arena growth failed.
    #[error("out of memory: {0}")]
    Memory(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// JSON (de)serialization error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// XML (de)serialization error (ADP profile export/import).
    #[error("xml error: {0}")]
    Xml(String),

    /// Prometheus metrics registration error.
    #[error("metrics error: {0}")]
    Metrics(#[from] prometheus::Error),
}

impl Error {
    /// Build a [`Error::NotFound`] for a range-out-of-population lookup.
    pub fn range(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Abort the process on detection of unrecoverable schema corruption
    /// (ADP-ID collision, on-disk class description mismatching the live
    /// class). These are configuration errors the core refuses to run
    /// past, per the design: continuing with an inconsistent schema is
    /// worse than stopping.
    pub fn abort_on_corruption(context: &str) -> ! {
        tracing::error!(%context, "unrecoverable schema corruption detected, aborting");
        std::process::abort()
    }
}
