//! Common types and utilities shared across the firewx crates.

pub mod bbox;
pub mod grid;
pub mod region;
pub mod time;

pub use bbox::{BoundingBox, GeoWindow};
pub use grid::{GridCoordinates, IndexWindow};
pub use region::Region;
pub use time::{decode_cf_time, truncate_to_hour, TimeParseError, ValidTime};
