//! Session-level tests: the full submit flow against in-memory collaborators.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use trial_search::client::geocode::Geocoder;
use trial_search::client::search::SearchBackend;
use trial_search::config::Config;
use trial_search::coords::LatLng;
use trial_search::map::{Viewport, DEFAULT_CENTER, DEFAULT_ZOOM};
use trial_search::models::{SearchParams, TrialRecord};
use trial_search::render::NO_RESULTS_MESSAGE;
use trial_search::session::{Outcome, Phase, SearchSession};

/// Backend that replays a fixed response and records queries.
struct FakeBackend {
    response: Mutex<Result<Vec<TrialRecord>, String>>,
    queries: Mutex<Vec<String>>,
}

impl FakeBackend {
    fn ok(trials: Vec<TrialRecord>) -> Self {
        Self {
            response: Mutex::new(Ok(trials)),
            queries: Mutex::new(Vec::new()),
        }
    }

    fn failing() -> Self {
        Self {
            response: Mutex::new(Err("503 Service Unavailable".to_string())),
            queries: Mutex::new(Vec::new()),
        }
    }

    fn set_response(&self, response: Result<Vec<TrialRecord>, String>) {
        *self.response.lock().unwrap() = response;
    }

    fn calls(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

impl SearchBackend for FakeBackend {
    async fn search(&self, query: &str) -> anyhow::Result<Vec<TrialRecord>> {
        self.queries.lock().unwrap().push(query.to_string());
        self.response
            .lock()
            .unwrap()
            .clone()
            .map_err(|e| anyhow::anyhow!(e))
    }
}

struct FakeGeocoder {
    answer: Option<LatLng>,
    calls: AtomicUsize,
}

impl FakeGeocoder {
    fn new(answer: Option<LatLng>) -> Self {
        Self {
            answer,
            calls: AtomicUsize::new(0),
        }
    }
}

impl Geocoder for FakeGeocoder {
    async fn geocode(&self, _place: &str) -> Option<LatLng> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.answer
    }
}

fn trial(id: &str, rank: f64, locations: &str, params: Option<SearchParams>) -> TrialRecord {
    TrialRecord {
        id: id.to_string(),
        rank,
        title: Some(format!("Study {id}")),
        status: Some("RECRUITING".to_string()),
        locations: Some(locations.to_string()),
        search_params: params,
        ..Default::default()
    }
}

fn radius_params(location: &str, miles: f64) -> SearchParams {
    SearchParams {
        query: Some("asthma near here".to_string()),
        semantic_phrase: Some("asthma".to_string()),
        location: Some(location.to_string()),
        radius_miles: Some(miles),
        ..Default::default()
    }
}

fn sample_trials(params: Option<SearchParams>) -> Vec<TrialRecord> {
    vec![
        trial("NCT3", 0.31, "[]", params.clone()),
        trial("NCT1", 0.92, "[[42.36, -71.06], [40.71, -74.0]]", params.clone()),
        trial("NCT2", 0.55, "('41.88', '-87.63')", params.clone()),
        trial("NCT4", 0.12, "not-a-coordinate", params),
    ]
}

fn test_config(dir: &tempfile::TempDir) -> Config {
    Config {
        data_dir: dir.path().to_path_buf(),
        ..Config::default()
    }
}

#[tokio::test]
async fn test_empty_query_is_rejected_without_side_effects() {
    let dir = tempfile::tempdir().unwrap();
    let backend = FakeBackend::ok(sample_trials(None));
    let geocoder = FakeGeocoder::new(None);
    let mut session = SearchSession::new(test_config(&dir), &backend, &geocoder);

    assert_eq!(session.submit("   ").await, Outcome::Rejected);
    assert!(backend.calls().is_empty());
    assert_eq!(session.phase(), Phase::Idle);
    assert!(session.phase().is_idle());
    assert!(!session.view().is_visible());
    assert!(!session.view().map().is_initialized());
    assert!(session.recent().is_empty());
}

#[tokio::test]
async fn test_successful_search_renders_sorted_rows_and_markers() {
    let dir = tempfile::tempdir().unwrap();
    let backend = FakeBackend::ok(sample_trials(None));
    let geocoder = FakeGeocoder::new(None);
    let mut session = SearchSession::new(test_config(&dir), &backend, &geocoder);

    let outcome = session.submit("  asthma  ").await;
    assert_eq!(outcome, Outcome::Results { trials: 4, markers: 3 });
    assert_eq!(backend.calls(), vec!["asthma".to_string()]);
    assert_eq!(session.phase(), Phase::Results);

    let view = session.view();
    let ids: Vec<&str> = view.rows().iter().map(|r| r.trial_id.as_str()).collect();
    assert_eq!(ids, vec!["NCT1", "NCT2", "NCT3", "NCT4"]);
    assert!(view.message().is_none());
    // No facets echoed back, so no banner
    assert!(view.banner().is_none());

    let map = view.map();
    assert!(map.is_initialized());
    assert_eq!(map.markers().len(), 3);
    assert!(map.circle().is_none());
    assert_ne!(map.viewport(), Viewport::default());

    assert_eq!(session.recent(), ["asthma"]);
    assert_eq!(geocoder.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_radius_search_centers_on_geocoded_location() {
    let dir = tempfile::tempdir().unwrap();
    let boston = LatLng::new(42.3601, -71.0589);
    let backend = FakeBackend::ok(sample_trials(Some(radius_params("Boston, MA", 10.0))));
    let geocoder = FakeGeocoder::new(Some(boston));
    let mut session = SearchSession::new(test_config(&dir), &backend, &geocoder);

    session.submit("asthma within 10 miles of Boston").await;

    let map = session.view().map();
    assert_eq!(map.viewport(), Viewport { center: boston, zoom: 11 });
    assert_eq!(map.search_center(), Some(boston));
    assert!(map.circle().is_some());
    assert_eq!(map.markers().len(), 3);
    assert_eq!(
        session.view().banner(),
        Some("Showing trials for asthma within 10 miles of Boston, MA.")
    );

    backend.set_response(Ok(sample_trials(Some(radius_params("USA", 1000.0)))));
    session.submit("asthma anywhere").await;
    assert_eq!(session.view().map().viewport().zoom, 4);
}

#[tokio::test]
async fn test_geocoding_failure_falls_back_to_marker_fit() {
    let dir = tempfile::tempdir().unwrap();
    let backend = FakeBackend::ok(sample_trials(Some(radius_params("Atlantis", 25.0))));
    let geocoder = FakeGeocoder::new(None);
    let mut session = SearchSession::new(test_config(&dir), &backend, &geocoder);

    let outcome = session.submit("asthma near Atlantis").await;
    assert!(matches!(outcome, Outcome::Results { .. }));
    assert_eq!(geocoder.calls.load(Ordering::SeqCst), 1);

    let map = session.view().map();
    assert!(map.circle().is_none());
    assert!(map.search_center().is_none());
    // Banner and list still render
    assert!(session.view().banner().is_some());
    assert_eq!(session.view().rows().len(), 4);
}

#[tokio::test]
async fn test_zero_radius_skips_geocoding() {
    let dir = tempfile::tempdir().unwrap();
    let backend = FakeBackend::ok(sample_trials(Some(radius_params("Boston", 0.0))));
    let geocoder = FakeGeocoder::new(Some(LatLng::new(1.0, 1.0)));
    let mut session = SearchSession::new(test_config(&dir), &backend, &geocoder);

    session.submit("asthma").await;
    assert_eq!(geocoder.calls.load(Ordering::SeqCst), 0);
    assert!(session.view().map().circle().is_none());
}

#[tokio::test]
async fn test_failed_search_shows_no_results_and_clears_markers() {
    let dir = tempfile::tempdir().unwrap();
    let backend = FakeBackend::ok(sample_trials(None));
    let geocoder = FakeGeocoder::new(None);
    let mut session = SearchSession::new(test_config(&dir), &backend, &geocoder);

    session.submit("asthma").await;
    assert_eq!(session.view().map().markers().len(), 3);

    backend.set_response(Err("connection refused".to_string()));
    assert_eq!(session.submit("melanoma").await, Outcome::Failed);
    assert_eq!(session.phase(), Phase::Error);
    assert!(session.phase().is_idle());

    let view = session.view();
    assert_eq!(view.message(), Some(NO_RESULTS_MESSAGE));
    assert!(view.rows().is_empty());
    assert!(view.banner().is_none());
    assert!(view.map().markers().is_empty());
    assert!(session.trials().is_empty());
    // Failed searches are not remembered
    assert_eq!(session.recent(), ["asthma"]);
}

#[tokio::test]
async fn test_empty_result_set() {
    let dir = tempfile::tempdir().unwrap();
    let backend = FakeBackend::ok(sample_trials(None));
    let geocoder = FakeGeocoder::new(None);
    let mut session = SearchSession::new(test_config(&dir), &backend, &geocoder);

    // A previous search leaves the map fitted to its markers
    session.submit("asthma").await;
    assert_ne!(session.view().map().viewport(), Viewport::default());

    backend.set_response(Ok(Vec::new()));
    assert_eq!(session.submit("unobtainium").await, Outcome::Empty);
    assert!(session.phase().is_idle());
    let view = session.view();
    assert_eq!(view.message(), Some(NO_RESULTS_MESSAGE));
    assert!(view.banner().is_none());
    assert!(view.map().markers().is_empty());
    assert_eq!(
        view.map().viewport(),
        Viewport {
            center: DEFAULT_CENTER,
            zoom: DEFAULT_ZOOM
        }
    );
    assert_eq!(session.recent(), ["unobtainium", "asthma"]);
}

#[tokio::test]
async fn test_failing_backend_from_the_start() {
    let dir = tempfile::tempdir().unwrap();
    let backend = FakeBackend::failing();
    let geocoder = FakeGeocoder::new(None);
    let mut session = SearchSession::new(test_config(&dir), &backend, &geocoder);

    assert_eq!(session.submit("asthma").await, Outcome::Failed);
    assert!(session.view().is_visible());
    assert!(session.recent().is_empty());
}

#[tokio::test]
async fn test_recent_searches_capped_and_persisted() {
    let dir = tempfile::tempdir().unwrap();
    let backend = FakeBackend::ok(Vec::new());
    let geocoder = FakeGeocoder::new(None);
    {
        let mut session = SearchSession::new(test_config(&dir), &backend, &geocoder);
        for q in ["one", "two", "three", "four", "five", "six", "three"] {
            session.submit(q).await;
        }
        assert_eq!(session.recent(), ["three", "six", "five", "four", "two"]);
    }

    let mut session = SearchSession::new(test_config(&dir), &backend, &geocoder);
    assert_eq!(session.recent(), ["three", "six", "five", "four", "two"]);

    assert!(session.submit_recent(3).await.is_some());
    assert_eq!(backend.calls().last().map(String::as_str), Some("four"));
    assert_eq!(session.recent()[0], "four");
    assert!(session.submit_recent(10).await.is_none());
}

#[tokio::test]
async fn test_suggestion_chip_submits_search() {
    let dir = tempfile::tempdir().unwrap();
    let backend = FakeBackend::ok(sample_trials(None));
    let geocoder = FakeGeocoder::new(None);
    let mut session = SearchSession::new(test_config(&dir), &backend, &geocoder)
        .with_suggestions(vec!["lupus".to_string(), "gout".to_string()]);

    let outcome = session.submit_suggestion(1).await;
    assert!(matches!(outcome, Some(Outcome::Results { .. })));
    assert_eq!(backend.calls(), vec!["gout".to_string()]);
    assert!(session.submit_suggestion(2).await.is_none());
}

#[tokio::test]
async fn test_default_suggestions_sampled_on_start() {
    let dir = tempfile::tempdir().unwrap();
    let backend = FakeBackend::ok(Vec::new());
    let geocoder = FakeGeocoder::new(None);
    let session = SearchSession::new(test_config(&dir), &backend, &geocoder);
    assert_eq!(session.suggestions().len(), 3);
}

#[tokio::test]
async fn test_cross_highlight_through_session() {
    let dir = tempfile::tempdir().unwrap();
    let backend = FakeBackend::ok(sample_trials(None));
    let geocoder = FakeGeocoder::new(None);
    let mut session = SearchSession::new(test_config(&dir), &backend, &geocoder);
    session.submit("asthma").await;

    let touched = session.view_mut().click_popup_link("NCT1");
    assert_eq!(touched.rows, 1);
    assert_eq!(touched.markers, 2);

    let view = session.view();
    assert!(view.row("NCT1").unwrap().active);
    assert_eq!(view.flash(), Some("NCT1"));
    assert_eq!(
        view.map()
            .markers()
            .iter()
            .filter(|m| m.active)
            .count(),
        2
    );

    // A new search resets selection state
    session.submit("asthma again").await;
    assert!(session.view().selected().is_none());
    assert!(session.view().rows().iter().all(|r| !r.active));
}
