// src/error.rs

//! Error types for ksfetch
//!
//! A single typed error enum covers the whole crate. Only a handful of
//! conditions are fatal for a run (an unreadable kickstart source above all);
//! recoverable conditions are logged as warnings at the call site and the run
//! continues with whatever could be produced.

use thiserror::Error;

/// Result type alias using our Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in ksfetch operations
#[derive(Error, Debug)]
pub enum Error {
    /// A kickstart source (entry point or %include target) could not be read.
    /// Always fatal: the closure's seed set would be incomplete.
    #[error("Kickstart error: {0}")]
    KsError(String),

    /// Network fetch or file download failure
    #[error("Download error: {0}")]
    DownloadError(String),

    /// Malformed repository metadata (XML, compression, SQLite)
    #[error("Metadata error: {0}")]
    MetadataError(String),

    /// Generic parse failure (config files, numeric expressions)
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Filesystem I/O failure
    #[error("I/O error: {0}")]
    IoError(String),

    /// Component initialization failure (HTTP client, thread pool)
    #[error("Initialization error: {0}")]
    InitError(String),
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::IoError(e.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::DownloadError(e.to_string())
    }
}

impl From<rusqlite::Error> for Error {
    fn from(e: rusqlite::Error) -> Self {
        Error::MetadataError(e.to_string())
    }
}

impl From<quick_xml::Error> for Error {
    fn from(e: quick_xml::Error) -> Self {
        Error::MetadataError(e.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::ParseError(e.to_string())
    }
}
