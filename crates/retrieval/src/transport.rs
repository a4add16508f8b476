//! Remote collaborators of the fetchers.
//!
//! RTMA analyses are opened in place over OPeNDAP; NDFD grids are plain
//! files fetched over HTTP. Both sit behind traits so the fetchers can be
//! driven by in-process sources.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use firewx_common::GeoWindow;
use netcdf_parser::{open_analysis, AnalysisDataset, NetCdfError};
use reqwest::Client;
use tracing::{debug, instrument};

use crate::error::{FetchError, FetchResult};

/// What to read from an analysis dataset.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnalysisRequest {
    pub variables: Vec<String>,
    /// Geographic sub-window; `None` reads the full grid
    pub window: Option<GeoWindow>,
}

/// Opens remote gridded analyses.
#[async_trait]
pub trait AnalysisSource: Send + Sync {
    async fn open(&self, url: &str, request: &AnalysisRequest) -> FetchResult<AnalysisDataset>;
}

/// Downloads remote files.
#[async_trait]
pub trait PayloadSource: Send + Sync {
    /// GET `url`. Any non-2xx response is [`FetchError::HttpStatus`].
    async fn fetch(&self, url: &str) -> FetchResult<Bytes>;
}

/// OPeNDAP access through libnetcdf's DAP client.
///
/// libnetcdf is blocking, so every open runs on the blocking thread pool.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpendapSource;

#[async_trait]
impl AnalysisSource for OpendapSource {
    #[instrument(skip(self, request), fields(variables = request.variables.len()))]
    async fn open(&self, url: &str, request: &AnalysisRequest) -> FetchResult<AnalysisDataset> {
        let location = url.to_string();
        let variables = request.variables.clone();
        let window = request.window;

        let opened = tokio::task::spawn_blocking(move || {
            open_analysis(&location, &variables, window.as_ref())
        })
        .await
        .map_err(|e| FetchError::Remote {
            url: url.to_string(),
            reason: format!("open task failed: {}", e),
        })?;

        opened.map_err(|e| match e {
            NetCdfError::Open { reason, .. } => FetchError::Remote {
                url: url.to_string(),
                reason,
            },
            other => FetchError::parse(url, other),
        })
    }
}

/// HTTP downloads with reqwest.
#[derive(Debug, Clone)]
pub struct HttpSource {
    client: Client,
}

impl HttpSource {
    pub fn new() -> FetchResult<Self> {
        let client = Client::builder()
            .user_agent(concat!("firewx/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| FetchError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client })
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PayloadSource for HttpSource {
    #[instrument(skip(self))]
    async fn fetch(&self, url: &str) -> FetchResult<Bytes> {
        let remote_error = |e: reqwest::Error| FetchError::Remote {
            url: url.to_string(),
            reason: e.to_string(),
        };

        let response = self.client.get(url).send().await.map_err(remote_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let bytes = response.bytes().await.map_err(remote_error)?;
        debug!(size = bytes.len(), "Downloaded file");
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opendap_open_failure_is_remote_error() {
        let request = AnalysisRequest {
            variables: vec!["tmp2m".to_string()],
            window: None,
        };
        let result = tokio_test::block_on(
            OpendapSource.open("/nonexistent/firewx/akrtma_anl_09z.nc", &request),
        );

        match result {
            Err(FetchError::Remote { url, .. }) => {
                assert_eq!(url, "/nonexistent/firewx/akrtma_anl_09z.nc")
            }
            other => panic!("expected a remote error, got {:?}", other),
        }
    }
}
