//! I/O error types.

use thiserror::Error;

/// Result type for I/O operations.
pub type Result<T> = std::result::Result<T, Error>;

/// I/O error types.
#[derive(Error, Debug)]
pub enum Error {
    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HDF5 library error.
    #[error("HDF5 error: {0}")]
    Hdf5(#[from] hdf5::Error),

    /// Label table parse error.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Invalid file format.
    #[error("invalid file format: {0}")]
    InvalidFormat(String),

    /// Required input is missing.
    #[error("missing input: {}", .0.display())]
    MissingInput(std::path::PathBuf),

    /// Core library error.
    #[error("core error: {0}")]
    CoreError(#[from] tpcraster_core::Error),
}
