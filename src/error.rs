//! Error taxonomy for the decoder pipeline.
//!
//! Mirrors the propagation policy in the design doc: malformed frames and
//! decode failures are best-effort and never surface as an `Err` from the
//! hot parsing path (they are logged and swallowed there); this type exists
//! for the paths that *do* propagate — configuration and database loading.

use thiserror::Error;

/// Top-level error type for `auditcap`.
#[derive(Debug, Error)]
pub enum Error {
    /// A configuration problem discovered at startup (missing database
    /// file, unreadable path, ...). Fatal: initialization must abort.
    #[error("configuration error: {0}")]
    Config(String),

    /// The software-fingerprint database failed to parse.
    #[error("hassh database error: {0}")]
    Database(String),

    /// I/O failure while reading configuration or database files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization failure for a database or audit record.
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
