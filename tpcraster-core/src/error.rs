//! Error types for tpcraster-core.

use thiserror::Error;

/// Result type alias for tpcraster operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for tpcraster operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Unsupported projection selector.
    #[error("invalid projection value: {0:?} (expected \"xy\" or \"zy\")")]
    InvalidProjection(String),

    /// Unsupported ingestion mode.
    #[error("invalid data type: {0:?} (expected \"real\" or \"sim\")")]
    InvalidDataType(String),

    /// Unknown single-letter class code in a label table.
    #[error("invalid label code: {0:?}")]
    InvalidLabelCode(String),

    /// The normalization scale cannot be computed or is zero.
    #[error("cannot normalize charge: {0}")]
    DegenerateScale(String),

    /// Requested event does not exist in the source.
    #[error("event {0} not found")]
    EventNotFound(u64),

    /// Point-cloud columns have mismatched lengths.
    #[error("malformed point cloud: {0}")]
    MalformedCloud(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    ConfigError(String),
}
