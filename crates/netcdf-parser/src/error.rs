//! Error types for NetCDF parsing operations.

use thiserror::Error;

/// Result type for NetCDF parser operations.
pub type NetCdfResult<T> = Result<T, NetCdfError>;

/// Error types for NetCDF parsing.
#[derive(Error, Debug)]
pub enum NetCdfError {
    /// The dataset could not be opened (missing file, unreachable or unpublished URL)
    #[error("Failed to open {location}: {reason}")]
    Open { location: String, reason: String },

    /// Missing required variable, dimension or attribute
    #[error("Missing required data: {0}")]
    MissingData(String),

    /// Invalid data format
    #[error("Invalid data format: {0}")]
    InvalidFormat(String),

    /// The requested geographic window contains no grid points
    #[error("No grid points inside the requested window")]
    EmptyWindow,
}
