//! NDFD short-range and extended-range grid retrieval.

use std::path::PathBuf;
use std::sync::Arc;

use firewx_common::Region;
use grib2_parser::{GribDataset, INDEX_SUFFIX};
use storage::ScratchCache;
use tracing::{debug, info, warn};

use crate::config::NdfdConfig;
use crate::error::{FetchError, FetchResult};
use crate::normalize::NormalizedGrid;
use crate::parameters::NdfdParameter;
use crate::transport::PayloadSource;

/// Forecast-period directory of an NDFD product.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForecastRange {
    /// Days 1-3
    Short,
    /// Days 4-7
    Extended,
}

impl ForecastRange {
    pub fn path_segment(self) -> &'static str {
        match self {
            ForecastRange::Short => "VP.001-003",
            ForecastRange::Extended => "VP.004-007",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ForecastRange::Short => "short",
            ForecastRange::Extended => "extended",
        }
    }

    pub fn cache_name(self, parameter: NdfdParameter) -> String {
        match self {
            ForecastRange::Short => parameter.short_cache_name(),
            ForecastRange::Extended => parameter.extended_cache_name(),
        }
    }
}

/// URL of one range of a parameter, e.g.
/// `https://tgftp.nws.noaa.gov/SL.us008001/ST.opnl/DF.gr2/DC.ndfd/AR.conus/VP.001-003/ds.maxrh.bin`
pub fn grid_url(
    base_url: &str,
    scope: &str,
    range: ForecastRange,
    parameter: NdfdParameter,
) -> String {
    let base = base_url.trim_end_matches('/');
    let scope = scope.trim_matches('/');
    format!(
        "{}/{}/{}/{}",
        base,
        scope,
        range.path_segment(),
        parameter.file_name()
    )
}

/// The extended-range result, which may be missing without failing the fetch.
#[derive(Debug, Clone)]
pub enum ExtendedRange {
    Available(NormalizedGrid),
    Unavailable,
}

impl ExtendedRange {
    pub fn is_available(&self) -> bool {
        matches!(self, ExtendedRange::Available(_))
    }

    pub fn grid(&self) -> Option<&NormalizedGrid> {
        match self {
            ExtendedRange::Available(grid) => Some(grid),
            ExtendedRange::Unavailable => None,
        }
    }

    pub fn into_grid(self) -> Option<NormalizedGrid> {
        match self {
            ExtendedRange::Available(grid) => Some(grid),
            ExtendedRange::Unavailable => None,
        }
    }
}

/// Both ranges of one NDFD parameter.
#[derive(Debug, Clone)]
pub struct NdfdRetrieval {
    pub parameter: NdfdParameter,
    pub region: Region,
    pub short: NormalizedGrid,
    pub extended: ExtendedRange,
}

/// Downloads NDFD grids into a scratch cache and decodes them.
///
/// Each fetch starts by clearing the cache, so the directory only ever holds
/// the payloads of the latest call.
pub struct NdfdFetcher {
    source: Arc<dyn PayloadSource>,
    cache: ScratchCache,
    base_url: String,
}

impl NdfdFetcher {
    pub fn new(source: Arc<dyn PayloadSource>, cache: ScratchCache, config: &NdfdConfig) -> Self {
        Self {
            source,
            cache,
            base_url: config.base_url.clone(),
        }
    }

    pub fn cache(&self) -> &ScratchCache {
        &self.cache
    }

    /// Fetch `parameter` (a server file name such as `ds.maxrh.bin`) under
    /// the directory `scope` (e.g. `AR.conus`).
    ///
    /// Unknown parameters fail before anything is downloaded.
    pub async fn fetch(
        &self,
        scope: &str,
        parameter: &str,
        region: Region,
    ) -> FetchResult<NdfdRetrieval> {
        let parameter: NdfdParameter = parameter.parse()?;
        self.fetch_parameter(scope, parameter, region).await
    }

    /// Download and decode both ranges of `parameter`.
    ///
    /// A short-range failure fails the call; an extended-range failure,
    /// whether in the download or the decode, yields
    /// [`ExtendedRange::Unavailable`].
    pub async fn fetch_parameter(
        &self,
        scope: &str,
        parameter: NdfdParameter,
        region: Region,
    ) -> FetchResult<NdfdRetrieval> {
        self.cache.ensure().await?;
        self.cache.purge().await;

        let short_path = self.download(scope, ForecastRange::Short, parameter).await?;

        let extended_path = match self.download(scope, ForecastRange::Extended, parameter).await {
            Ok(path) => Some(path),
            Err(e) => {
                warn!(
                    parameter = %parameter,
                    scope = %scope,
                    error = %e,
                    "Extended-range grid unavailable"
                );
                None
            }
        };

        let short = match open_grid(short_path, region).await {
            Ok(grid) => grid,
            Err(e) => {
                self.cache.remove_files_with_suffix(INDEX_SUFFIX).await;
                return Err(e);
            }
        };

        let extended = match extended_path {
            Some(path) => match open_grid(path, region).await {
                Ok(grid) => ExtendedRange::Available(grid),
                Err(e) => {
                    warn!(
                        parameter = %parameter,
                        error = %e,
                        "Extended-range grid could not be decoded"
                    );
                    ExtendedRange::Unavailable
                }
            },
            None => ExtendedRange::Unavailable,
        };

        let removed = self.cache.remove_files_with_suffix(INDEX_SUFFIX).await;
        debug!(removed = removed, "Removed GRIB2 inventory files");

        Ok(NdfdRetrieval {
            parameter,
            region,
            short,
            extended,
        })
    }

    async fn download(
        &self,
        scope: &str,
        range: ForecastRange,
        parameter: NdfdParameter,
    ) -> FetchResult<PathBuf> {
        let url = grid_url(&self.base_url, scope, range, parameter);
        let payload = self.source.fetch(&url).await?;

        let path = self
            .cache
            .store(parameter.file_name(), &range.cache_name(parameter), &payload)
            .await?;

        info!(
            parameter = %parameter,
            range = range.label(),
            url = %url,
            bytes = payload.len(),
            "Downloaded NDFD grid"
        );
        Ok(path)
    }
}

/// Decode a cached GRIB2 file on the blocking pool and normalize it.
async fn open_grid(path: PathBuf, region: Region) -> FetchResult<NormalizedGrid> {
    let location = path.display().to_string();

    let dataset = tokio::task::spawn_blocking(move || GribDataset::open_file(&path))
        .await
        .map_err(|e| FetchError::parse(&location, format!("decode task failed: {}", e)))?
        .map_err(|e| FetchError::parse(&location, e))?;

    info!(
        file = %location,
        messages = dataset.len(),
        reference_times = dataset.reference_times().len(),
        "Opened NDFD grid"
    );

    NormalizedGrid::from_dataset(dataset, region)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_urls() {
        let base = "https://tgftp.nws.noaa.gov/SL.us008001/ST.opnl/DF.gr2/DC.ndfd/";
        assert_eq!(
            grid_url(base, "AR.conus", ForecastRange::Short, NdfdParameter::MaxRelativeHumidity),
            "https://tgftp.nws.noaa.gov/SL.us008001/ST.opnl/DF.gr2/DC.ndfd/AR.conus/VP.001-003/ds.maxrh.bin"
        );
        assert_eq!(
            grid_url(base, "AR.alaska/", ForecastRange::Extended, NdfdParameter::MinTemperature),
            "https://tgftp.nws.noaa.gov/SL.us008001/ST.opnl/DF.gr2/DC.ndfd/AR.alaska/VP.004-007/ds.mint.bin"
        );
    }

    #[test]
    fn test_range_cache_names() {
        let p = NdfdParameter::WindGust;
        assert_eq!(ForecastRange::Short.cache_name(p), "ds.wgust_short.bin");
        assert_eq!(ForecastRange::Extended.cache_name(p), "ds.wgust_extended.bin");
    }

    #[test]
    fn test_unavailable_extended_has_no_grid() {
        let extended = ExtendedRange::Unavailable;
        assert!(!extended.is_available());
        assert!(extended.grid().is_none());
        assert!(extended.into_grid().is_none());
    }
}
