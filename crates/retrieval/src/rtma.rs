//! RTMA retrieval with fallback to older analysis hours.
//!
//! The newest RTMA analysis is often not yet published when it is asked for.
//! The fetcher walks back through [`CANDIDATE_HOURS`] hours, newest first,
//! and returns the first hour whose analysis and 24-hour-prior analysis both
//! open.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use firewx_common::{truncate_to_hour, GeoWindow, Region};
use netcdf_parser::AnalysisDataset;
use tracing::{debug, info, warn};

use crate::config::RtmaConfig;
use crate::error::{FetchError, FetchResult};
use crate::transport::{AnalysisRequest, AnalysisSource};

/// Number of hours tried: the reference hour and the four before it.
pub const CANDIDATE_HOURS: usize = 5;

/// One analysis hour and its 24-hour-prior counterpart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Candidate {
    pub current: DateTime<Utc>,
    pub prior: DateTime<Utc>,
}

impl Candidate {
    fn new(current: DateTime<Utc>) -> Self {
        Self {
            current,
            prior: current - Duration::hours(24),
        }
    }
}

/// Candidates for `reference_time`, newest first.
pub fn candidates(reference_time: DateTime<Utc>) -> Vec<Candidate> {
    let newest = truncate_to_hour(reference_time);
    (0..CANDIDATE_HOURS as i64)
        .map(|hours_back| Candidate::new(newest - Duration::hours(hours_back)))
        .collect()
}

/// OPeNDAP URL of a region's analysis valid at `time`.
///
/// e.g. `http://nomads.ncep.noaa.gov:80/dods/akrtma/akrtma20240115/akrtma_anl_09z`
pub fn analysis_url(base_url: &str, region: Region, time: DateTime<Utc>) -> String {
    let code = region.rtma_code();
    format!(
        "{}/{code}/{code}{}/{code}_anl_{}z",
        base_url.trim_end_matches('/'),
        time.format("%Y%m%d"),
        time.format("%H"),
    )
}

/// A successful RTMA retrieval.
#[derive(Debug, Clone)]
pub struct RtmaRetrieval {
    pub region: Region,
    pub current: AnalysisDataset,
    pub prior: AnalysisDataset,
    /// Analysis hour that satisfied "current"
    pub current_time: DateTime<Utc>,
    /// Always `current_time` minus 24 hours
    pub prior_time: DateTime<Utc>,
    /// Candidates tried, including the one that succeeded
    pub attempts: usize,
}

impl RtmaRetrieval {
    pub fn into_parts(
        self,
    ) -> (
        AnalysisDataset,
        AnalysisDataset,
        DateTime<Utc>,
        DateTime<Utc>,
    ) {
        (self.current, self.prior, self.current_time, self.prior_time)
    }
}

pub struct RtmaFetcher {
    source: Arc<dyn AnalysisSource>,
    base_url: String,
    variables: Vec<String>,
}

impl RtmaFetcher {
    pub fn new(source: Arc<dyn AnalysisSource>, config: &RtmaConfig) -> Self {
        Self {
            source,
            base_url: config.base_url.clone(),
            variables: config.variables.clone(),
        }
    }

    /// What each open reads: the configured variables, windowed for Alaska.
    pub fn request_for(&self, region: Region) -> AnalysisRequest {
        AnalysisRequest {
            variables: self.variables.clone(),
            window: region.is_alaska().then_some(GeoWindow::ALASKA),
        }
    }

    /// Retrieve the newest available analysis at or before `reference_time`
    /// together with the analysis 24 hours before it.
    ///
    /// Fails with [`FetchError::NoCurrentAnalysis`] when none of the
    /// candidate hours could be opened.
    pub async fn fetch(
        &self,
        region: Region,
        reference_time: DateTime<Utc>,
    ) -> FetchResult<RtmaRetrieval> {
        let candidates = candidates(reference_time);
        let request = self.request_for(region);

        for (attempt, candidate) in candidates.iter().enumerate() {
            match self.open_candidate(region, candidate, &request).await {
                Ok((current, prior)) => {
                    info!(
                        region = %region,
                        current = %candidate.current,
                        prior = %candidate.prior,
                        attempt = attempt + 1,
                        "Matched RTMA analysis hour"
                    );
                    return Ok(RtmaRetrieval {
                        region,
                        current,
                        prior,
                        current_time: candidate.current,
                        prior_time: candidate.prior,
                        attempts: attempt + 1,
                    });
                }
                Err(e) => {
                    debug!(
                        region = %region,
                        hour = %candidate.current,
                        attempt = attempt + 1,
                        error = %e,
                        "RTMA candidate unavailable"
                    );
                }
            }
        }

        let reference_time = truncate_to_hour(reference_time);
        warn!(
            region = %region,
            reference_time = %reference_time,
            attempts = candidates.len(),
            "No current RTMA analysis available"
        );
        Err(FetchError::NoCurrentAnalysis {
            region,
            reference_time,
            attempts: candidates.len(),
        })
    }

    /// Open one candidate. The prior hour is only requested once the current
    /// hour has opened.
    async fn open_candidate(
        &self,
        region: Region,
        candidate: &Candidate,
        request: &AnalysisRequest,
    ) -> FetchResult<(AnalysisDataset, AnalysisDataset)> {
        let current_url = analysis_url(&self.base_url, region, candidate.current);
        let current = self.source.open(&current_url, request).await?;

        let prior_url = analysis_url(&self.base_url, region, candidate.prior);
        let prior = self.source.open(&prior_url, request).await?;

        Ok((current, prior))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_candidates_step_back_hourly() {
        let reference = Utc.with_ymd_and_hms(2024, 1, 15, 12, 34, 56).unwrap();
        let list = candidates(reference);

        assert_eq!(list.len(), CANDIDATE_HOURS);
        assert_eq!(list[0].current, Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap());
        assert_eq!(list[4].current, Utc.with_ymd_and_hms(2024, 1, 15, 8, 0, 0).unwrap());
        for pair in list.windows(2) {
            assert!(pair[0].current > pair[1].current);
        }
        for c in &list {
            assert_eq!(c.current - c.prior, Duration::hours(24));
        }
    }

    #[test]
    fn test_candidates_cross_midnight() {
        let reference = Utc.with_ymd_and_hms(2024, 3, 1, 2, 0, 0).unwrap();
        let list = candidates(reference);

        assert_eq!(list[3].current, Utc.with_ymd_and_hms(2024, 2, 29, 23, 0, 0).unwrap());
        assert_eq!(list[3].prior, Utc.with_ymd_and_hms(2024, 2, 28, 23, 0, 0).unwrap());
    }

    #[test]
    fn test_analysis_urls() {
        let time = Utc.with_ymd_and_hms(2024, 1, 15, 9, 0, 0).unwrap();
        assert_eq!(
            analysis_url("http://nomads.ncep.noaa.gov:80/dods", Region::Alaska, time),
            "http://nomads.ncep.noaa.gov:80/dods/akrtma/akrtma20240115/akrtma_anl_09z"
        );
        assert_eq!(
            analysis_url("http://example.test/dods/", Region::Conus, time),
            "http://example.test/dods/rtma2p5/rtma2p520240115/rtma2p5_anl_09z"
        );
        assert_eq!(
            analysis_url("http://example.test/dods", Region::Hawaii, time),
            "http://example.test/dods/hirtma/hirtma20240115/hirtma_anl_09z"
        );
    }
}
