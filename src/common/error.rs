//! Unified error types for Quince.
//!
//! Only conditions that abort an export are modelled as errors. Everything
//! else is reported through the ordered warning list carried by the export
//! result.

use thiserror::Error;

/// Main error type for Quince operations.
#[derive(Error, Debug)]
pub enum Error {
    /// IO error while writing the output
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The requested OCD version is not one of 8, 9, 10, 11, 12
    #[error("OCD files of version {0} are not supported")]
    UnsupportedVersion(u16),

    /// The color table exceeds a hard format limit
    #[error(
        "The map contains {count} colors, more than the {limit} supported by OCD version {version}"
    )]
    TooManyColors {
        count: usize,
        limit: usize,
        version: u16,
    },
}

/// Result type for Quince operations.
pub type Result<T> = std::result::Result<T, Error>;
