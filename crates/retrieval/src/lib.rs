//! Retrieval of RTMA analyses and NDFD forecast grids.
//!
//! Two fetchers make up the crate:
//!
//! - [`RtmaFetcher`] finds the newest published RTMA analysis within a
//!   five-hour window, together with the analysis 24 hours before it.
//! - [`NdfdFetcher`] downloads the short-range (VP.001-003) and extended-range
//!   (VP.004-007) grids of one NDFD parameter into a [`ScratchCache`], then
//!   decodes them into [`NormalizedGrid`]s. The extended range is best-effort.
//!
//! Remote I/O goes through the [`AnalysisSource`] and [`PayloadSource`]
//! traits so the fetchers can run against in-process sources in tests.
//!
//! [`ScratchCache`]: storage::ScratchCache

pub mod config;
pub mod error;
pub mod ndfd;
pub mod normalize;
pub mod parameters;
pub mod rtma;
pub mod transport;

pub use config::{NdfdConfig, RetrievalConfig, RtmaConfig};
pub use error::{FetchError, FetchResult};
pub use ndfd::{ExtendedRange, ForecastRange, NdfdFetcher, NdfdRetrieval};
pub use normalize::{select_time_index, GridStep, NormalizedGrid, TimeSelection};
pub use parameters::NdfdParameter;
pub use rtma::{Candidate, RtmaFetcher, RtmaRetrieval, CANDIDATE_HOURS};
pub use transport::{AnalysisRequest, AnalysisSource, HttpSource, OpendapSource, PayloadSource};

// Types that appear in the fetchers' public signatures
pub use firewx_common::Region;
pub use netcdf_parser::AnalysisDataset;
