//! In-process transports for driving the fetchers without a network.

#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use bytes::Bytes;
use firewx_common::GridCoordinates;
use retrieval::{AnalysisDataset, AnalysisRequest, AnalysisSource, FetchError, PayloadSource};

pub const RTMA_BASE_URL: &str = "http://rtma.test/dods";
pub const NDFD_BASE_URL: &str = "http://ndfd.test/DC.ndfd/";

/// Analysis server that publishes a fixed set of URLs (or every URL).
pub struct MockAnalysisSource {
    published: Option<HashSet<String>>,
    opened: Mutex<Vec<(String, AnalysisRequest)>>,
}

impl MockAnalysisSource {
    pub fn publishing<I, S>(urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            published: Some(urls.into_iter().map(Into::into).collect()),
            opened: Mutex::new(Vec::new()),
        }
    }

    pub fn publishing_everything() -> Self {
        Self {
            published: None,
            opened: Mutex::new(Vec::new()),
        }
    }

    /// URLs in the order they were opened, failed opens included.
    pub fn opened_urls(&self) -> Vec<String> {
        self.opened
            .lock()
            .unwrap()
            .iter()
            .map(|(url, _)| url.clone())
            .collect()
    }

    pub fn requests(&self) -> Vec<AnalysisRequest> {
        self.opened
            .lock()
            .unwrap()
            .iter()
            .map(|(_, request)| request.clone())
            .collect()
    }
}

#[async_trait]
impl AnalysisSource for MockAnalysisSource {
    async fn open(&self, url: &str, request: &AnalysisRequest) -> Result<AnalysisDataset, FetchError> {
        self.opened
            .lock()
            .unwrap()
            .push((url.to_string(), request.clone()));

        let is_published = self
            .published
            .as_ref()
            .map_or(true, |published| published.contains(url));
        if !is_published {
            return Err(FetchError::Remote {
                url: url.to_string(),
                reason: "dataset not published".to_string(),
            });
        }

        Ok(synthetic_analysis(url, request))
    }
}

/// A 1-degree analysis covering 45..75N, 180..240E, windowed like the real source.
pub fn synthetic_analysis(url: &str, request: &AnalysisRequest) -> AnalysisDataset {
    let lats: Vec<f64> = (0..=30).map(|j| 45.0 + j as f64).collect();
    let lons: Vec<f64> = (0..=60).map(|i| 180.0 + i as f64).collect();
    let full = GridCoordinates::Regular { lats, lons };

    let coordinates = match request.window.as_ref() {
        Some(window) => {
            let slab = full.window_indices(window).expect("window overlaps the grid");
            full.crop(&slab)
        }
        None => full,
    };

    let variables: BTreeMap<String, Vec<f32>> = request
        .variables
        .iter()
        .map(|name| (name.clone(), vec![273.15; coordinates.len()]))
        .collect();

    AnalysisDataset {
        source: url.to_string(),
        valid_time: None,
        coordinates,
        variables,
    }
}

/// File server with 404 for anything not registered.
#[derive(Default)]
pub struct MockPayloadSource {
    files: Mutex<HashMap<String, Vec<u8>>>,
    requested: Mutex<Vec<String>>,
}

impl MockPayloadSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn serve(&self, url: impl Into<String>, body: Vec<u8>) {
        self.files.lock().unwrap().insert(url.into(), body);
    }

    pub fn requested(&self) -> Vec<String> {
        self.requested.lock().unwrap().clone()
    }
}

#[async_trait]
impl PayloadSource for MockPayloadSource {
    async fn fetch(&self, url: &str) -> Result<Bytes, FetchError> {
        self.requested.lock().unwrap().push(url.to_string());

        match self.files.lock().unwrap().get(url) {
            Some(body) => Ok(Bytes::from(body.clone())),
            None => Err(FetchError::HttpStatus {
                url: url.to_string(),
                status: 404,
            }),
        }
    }
}

pub fn short_url(scope: &str, file: &str) -> String {
    format!("{}{}/VP.001-003/{}", NDFD_BASE_URL, scope, file)
}

pub fn extended_url(scope: &str, file: &str) -> String {
    format!("{}{}/VP.004-007/{}", NDFD_BASE_URL, scope, file)
}
