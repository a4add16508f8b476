//! GRIB2 parser implementation (WMO FM 92 GRIB Edition 2).
//!
//! Covers what NDFD forecast grids need: message scanning, sections 0-7,
//! grid templates 3.0 / 3.10 / 3.20 / 3.30, product templates 4.0 / 4.8,
//! native simple unpacking and a fallback decoder for the other packings.
//! Opening a file through [`GribDataset::open_file`] also writes a
//! wgrib2-style inventory next to it.

pub mod dataset;
pub mod error;
pub mod grid;
pub mod inventory;
pub mod reader;
pub mod sections;
pub mod unpacking;

pub use dataset::{GribDataset, GribField};
pub use error::Grib2Error;
pub use grid::GridTemplate;
pub use inventory::INDEX_SUFFIX;
pub use reader::{Grib2Message, Grib2Reader};
