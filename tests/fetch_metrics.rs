use std::collections::HashSet;
use std::time::Duration;

use folio::ContentCache;
use folio::cache::{CacheConfig, ResourceKey};
use folio::fetch::{ContentClient, FetchOutcome};
use httpmock::MockServer;
use metrics_util::debugging::DebuggingRecorder;
use serde_json::json;

#[tokio::test]
async fn fetch_paths_emit_expected_metric_keys() {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();
    recorder
        .install()
        .expect("debug metrics recorder should install in this test process");
    folio::telemetry::describe_metrics();

    let server = MockServer::start();
    server.mock(|when, then| {
        when.method("GET").path("/api/projects");
        then.status(200)
            .delay(Duration::from_millis(50))
            .json_body(json!([]));
    });
    server.mock(|when, then| {
        when.method("GET").path("/api/education");
        then.status(500);
    });
    server.mock(|when, then| {
        when.method("GET").path("/api/experience");
        then.status(200)
            .delay(Duration::from_millis(50))
            .json_body(json!([]));
    });

    let client = ContentClient::new(&server.base_url()).expect("client");
    let cache = ContentCache::new(CacheConfig::default(), client);

    // Started, suppressed, then a fresh hit.
    let projects = cache.projects();
    let key = ResourceKey::Projects;
    let (first, second) = tokio::join!(
        projects.ensure_fresh_default(&key),
        projects.ensure_fresh_default(&key)
    );
    assert_eq!(first, FetchOutcome::Fetched);
    assert_eq!(second, FetchOutcome::InFlight);
    assert_eq!(
        projects.ensure_fresh_default(&key).await,
        FetchOutcome::Fresh
    );

    // Failure.
    assert_eq!(
        cache
            .education()
            .ensure_fresh_default(&ResourceKey::Education)
            .await,
        FetchOutcome::Failed
    );

    // Response for an entry invalidated mid-flight.
    let experience = cache.experience();
    let key = ResourceKey::Experience;
    let (outcome, ()) = tokio::join!(experience.ensure_fresh_default(&key), async {
        tokio::task::yield_now().await;
        experience.invalidate(&key);
    });
    assert_eq!(outcome, FetchOutcome::Superseded);

    let names: HashSet<String> = snapshotter
        .snapshot()
        .into_vec()
        .into_iter()
        .map(|(composite_key, _, _, _)| composite_key.key().name().to_string())
        .collect();

    let expected = [
        "folio_cache_fresh_hit_total",
        "folio_fetch_started_total",
        "folio_fetch_suppressed_total",
        "folio_fetch_failed_total",
        "folio_fetch_discarded_total",
        "folio_fetch_ms",
    ];

    for metric in expected {
        assert!(names.contains(metric), "missing metric: {metric}");
    }
}
