//! Error types for RTMA and NDFD retrieval.

use chrono::{DateTime, Utc};
use firewx_common::{Region, TimeParseError};
use storage::CacheError;
use thiserror::Error;

pub type FetchResult<T> = Result<T, FetchError>;

#[derive(Error, Debug)]
pub enum FetchError {
    /// The parameter is not in the static NDFD parameter table.
    #[error("Unknown NDFD parameter: {0}")]
    UnknownParameter(String),

    /// The remote could not be reached or refused to open the dataset.
    #[error("Request to {url} failed: {reason}")]
    Remote { url: String, reason: String },

    #[error("{url} returned HTTP {status}")]
    HttpStatus { url: String, status: u16 },

    /// A payload was retrieved but could not be decoded.
    #[error("Failed to parse {location}: {reason}")]
    Parse { location: String, reason: String },

    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    /// Every RTMA candidate hour failed.
    #[error(
        "No current {region} analysis available: {attempts} candidate hours up to {reference_time} failed"
    )]
    NoCurrentAnalysis {
        region: Region,
        reference_time: DateTime<Utc>,
        attempts: usize,
    },

    #[error("Invalid time: {0}")]
    InvalidTime(#[from] TimeParseError),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl FetchError {
    pub(crate) fn parse(location: impl Into<String>, reason: impl ToString) -> Self {
        FetchError::Parse {
            location: location.into(),
            reason: reason.to_string(),
        }
    }

    /// Whether the remote reported the resource as missing.
    pub fn is_not_found(&self) -> bool {
        matches!(self, FetchError::HttpStatus { status: 404, .. })
    }
}
