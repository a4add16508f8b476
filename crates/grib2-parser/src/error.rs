use thiserror::Error;

#[derive(Debug, Error)]
pub enum Grib2Error {
    #[error("Invalid GRIB2 format: {0}")]
    InvalidFormat(String),

    #[error("Invalid section {section}: {reason}")]
    InvalidSection { section: u8, reason: String },

    #[error("Unsupported grid template 3.{0}")]
    UnsupportedGrid(u16),

    #[error("Unpacking error: {0}")]
    UnpackingError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
