//! NetCDF / OPeNDAP reader for gridded surface analyses.
//!
//! Opens a dataset by local path or DAP URL through libnetcdf, reads the 1-D
//! `lat`/`lon` axes and the first `time` value, and loads each requested
//! variable as a 2-D slab, optionally restricted to a geographic window.
//! Only the slab inside the window is transferred from the server.

pub mod analysis;
pub mod error;
pub mod hdf5;

pub use analysis::{open_analysis, AnalysisDataset};
pub use error::{NetCdfError, NetCdfResult};
pub use hdf5::silence_hdf5_errors;
