//! Local scratch storage for downloaded grid payloads.
//!
//! Retrieval stages raw downloads in a scratch directory before parsing them.
//! The directory is an explicit handle ([`ScratchCache`]) rather than a
//! process-wide path, so every fetcher (and every test) can be pointed at its
//! own location.

pub mod error;
pub mod scratch;

pub use error::{CacheError, CacheResult};
pub use scratch::ScratchCache;
