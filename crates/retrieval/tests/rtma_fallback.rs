//! RTMA candidate-hour fallback against an in-process analysis server.

mod common;

use std::sync::Arc;

use chrono::Duration;
use common::{MockAnalysisSource, RTMA_BASE_URL};
use firewx_common::{GeoWindow, Region};
use retrieval::rtma::analysis_url;
use retrieval::{FetchError, RtmaConfig, RtmaFetcher, CANDIDATE_HOURS};
use test_utils::fixtures::time::{AK_PUBLISHED_CURRENT, AK_PUBLISHED_PRIOR, REFERENCE_TIME};
use test_utils::utc;

fn config() -> RtmaConfig {
    RtmaConfig {
        base_url: RTMA_BASE_URL.to_string(),
        variables: vec!["tmp2m".to_string(), "dpt2m".to_string()],
    }
}

fn fetcher(source: &Arc<MockAnalysisSource>) -> RtmaFetcher {
    RtmaFetcher::new(source.clone(), &config())
}

fn url(region: Region, time: &str) -> String {
    analysis_url(RTMA_BASE_URL, region, utc(time))
}

#[tokio::test]
async fn test_alaska_falls_back_to_published_hour() {
    let source = Arc::new(MockAnalysisSource::publishing([
        url(Region::Alaska, AK_PUBLISHED_CURRENT),
        url(Region::Alaska, AK_PUBLISHED_PRIOR),
    ]));

    let retrieval = fetcher(&source)
        .fetch(Region::from_code("AK"), utc(REFERENCE_TIME))
        .await
        .expect("09Z analysis is published");

    assert_eq!(retrieval.current_time, utc(AK_PUBLISHED_CURRENT));
    assert_eq!(retrieval.prior_time, utc(AK_PUBLISHED_PRIOR));
    assert_eq!(retrieval.attempts, 4);

    // 12Z, 11Z and 10Z fail on "current"; their prior hours are never requested
    assert_eq!(
        source.opened_urls(),
        vec![
            url(Region::Alaska, "2024-01-15T12:00:00Z"),
            url(Region::Alaska, "2024-01-15T11:00:00Z"),
            url(Region::Alaska, "2024-01-15T10:00:00Z"),
            url(Region::Alaska, AK_PUBLISHED_CURRENT),
            url(Region::Alaska, AK_PUBLISHED_PRIOR),
        ]
    );

    // Both members are confined to the Alaska window
    for request in source.requests() {
        assert_eq!(request.window, Some(GeoWindow::ALASKA));
    }
    for dataset in [&retrieval.current, &retrieval.prior] {
        let extent = dataset.coordinates.extent().unwrap();
        assert!(extent.min_y >= 50.0 && extent.max_y <= 72.0);
        assert!(extent.min_x >= 190.0 && extent.max_x <= 230.0);
        assert_eq!(dataset.shape(), (23, 41));
    }
}

#[tokio::test]
async fn test_region_code_is_case_insensitive() {
    let upper = Arc::new(MockAnalysisSource::publishing_everything());
    let lower = Arc::new(MockAnalysisSource::publishing_everything());

    let a = fetcher(&upper)
        .fetch(Region::from_code("AK"), utc(REFERENCE_TIME))
        .await
        .unwrap();
    let b = fetcher(&lower)
        .fetch(Region::from_code("ak"), utc(REFERENCE_TIME))
        .await
        .unwrap();

    assert_eq!(upper.opened_urls(), lower.opened_urls());
    assert_eq!(a.current.coordinates, b.current.coordinates);
}

#[tokio::test]
async fn test_conus_reads_full_grid() {
    let source = Arc::new(MockAnalysisSource::publishing_everything());

    let retrieval = fetcher(&source)
        .fetch(Region::Conus, utc(REFERENCE_TIME))
        .await
        .unwrap();

    assert_eq!(retrieval.attempts, 1);
    assert_eq!(retrieval.current.shape(), (31, 61));
    assert!(source.requests().iter().all(|r| r.window.is_none()));
    assert_eq!(
        retrieval.current.variable("tmp2m").map(|v| v.len()),
        Some(31 * 61)
    );
}

#[tokio::test]
async fn test_candidate_needs_both_hours() {
    // 12Z is published but its prior is not; 11Z has both
    let source = Arc::new(MockAnalysisSource::publishing([
        url(Region::Conus, "2024-01-15T12:00:00Z"),
        url(Region::Conus, "2024-01-15T11:00:00Z"),
        url(Region::Conus, "2024-01-14T11:00:00Z"),
    ]));

    let retrieval = fetcher(&source)
        .fetch(Region::Conus, utc(REFERENCE_TIME))
        .await
        .unwrap();

    assert_eq!(retrieval.current_time, utc("2024-01-15T11:00:00Z"));
    assert_eq!(retrieval.prior_time, utc("2024-01-14T11:00:00Z"));
    assert_eq!(retrieval.attempts, 2);
}

#[tokio::test]
async fn test_exhausted_candidates_report_no_current_analysis() {
    let source = Arc::new(MockAnalysisSource::publishing(Vec::<String>::new()));

    let err = fetcher(&source)
        .fetch(Region::Hawaii, utc("2024-01-15T12:40:00Z"))
        .await
        .unwrap_err();

    match err {
        FetchError::NoCurrentAnalysis {
            region,
            reference_time,
            attempts,
        } => {
            assert_eq!(region, Region::Hawaii);
            assert_eq!(reference_time, utc(REFERENCE_TIME));
            assert_eq!(attempts, CANDIDATE_HOURS);
        }
        other => panic!("expected NoCurrentAnalysis, got {:?}", other),
    }

    // One "current" open per candidate, newest first, nothing older than 08Z
    let opened = source.opened_urls();
    assert_eq!(opened.len(), CANDIDATE_HOURS);
    assert_eq!(opened[0], url(Region::Hawaii, REFERENCE_TIME));
    assert_eq!(opened[4], url(Region::Hawaii, "2024-01-15T08:00:00Z"));
}

#[tokio::test]
async fn test_prior_is_always_a_day_earlier() {
    for reference in [
        "2024-01-15T12:00:00Z",
        "2024-03-01T00:15:00Z",
        "2024-12-31T23:59:59Z",
    ] {
        let source = Arc::new(MockAnalysisSource::publishing_everything());
        let retrieval = fetcher(&source)
            .fetch(Region::Conus, utc(reference))
            .await
            .unwrap();

        assert_eq!(retrieval.current_time - retrieval.prior_time, Duration::hours(24));
        assert!(retrieval.current_time <= utc(reference));

        let (_, _, current_time, prior_time) = retrieval.into_parts();
        assert_eq!(prior_time + Duration::hours(24), current_time);
    }
}
