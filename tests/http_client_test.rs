//! HTTP-level tests: the reqwest clients against an in-process axum server
//! standing in for the search backend and the geocoder.

use std::collections::HashMap;

use axum::extract::Query;
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};

use trial_search::client::build_http_client;
use trial_search::client::geocode::{Geocoder, NominatimGeocoder};
use trial_search::client::search::{HttpSearchClient, SearchBackend};
use trial_search::config::{Config, GeocoderConfig};
use trial_search::coords::LatLng;
use trial_search::map::Viewport;
use trial_search::session::{Outcome, SearchSession};

async fn spawn(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

/// Mimics the trial backend: `boom` fails, `nothing` is empty, anything
/// else returns two trials using the legacy coordinate encoding.
async fn search_handler(Json(body): Json<Value>) -> impl IntoResponse {
    let query = body.get("query").and_then(Value::as_str).unwrap_or_default();
    match query {
        "" => (StatusCode::BAD_REQUEST, Json(json!({"error": "No query provided"}))),
        "boom" => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": "index unavailable"})),
        ),
        "nothing" => (StatusCode::OK, Json(json!([]))),
        _ => {
            let params = json!({
                "query": query,
                "type": "INTERVENTIONAL",
                "semantic_phrase": "pediatric asthma",
                "location": "Boston",
                "radius_miles": 10
            });
            (
                StatusCode::OK,
                Json(json!([
                    {
                        "id": "NCT00000002",
                        "rank": 0.41,
                        "title": "Inhaled Steroids in Children",
                        "status": "COMPLETED",
                        "sponsor": "Boston Children's Hospital",
                        "type": "INTERVENTIONAL",
                        "phase": "PHASE2",
                        "conditions": "Asthma",
                        "locations": "[('42.337', '-71.105')]",
                        "search_params": params
                    },
                    {
                        "id": "NCT00000001",
                        "rank": 0.87,
                        "title": "Biologics for Severe Pediatric Asthma",
                        "status": "RECRUITING",
                        "sponsor": "NIAID",
                        "type": "INTERVENTIONAL",
                        "phase": "PHASE3",
                        "conditions": ["Asthma", "Allergy"],
                        "sex": "ALL",
                        "min_age": "6 Years",
                        "max_age": "17 Years",
                        "start_date": "2022-09",
                        "locations": "[[42.36, -71.06], [42.44, -71.23]]",
                        "search_params": params
                    }
                ])),
            )
        }
    }
}

async fn geocode_handler(
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    if !headers.contains_key("user-agent") {
        return (StatusCode::FORBIDDEN, Json(json!({"error": "missing user agent"})));
    }
    assert_eq!(params.get("format").map(String::as_str), Some("json"));
    match params.get("q").map(String::as_str) {
        Some("Boston") => (
            StatusCode::OK,
            Json(json!([{"lat": "42.3554334", "lon": "-71.060511", "display_name": "Boston"}])),
        ),
        Some("Broken") => (StatusCode::BAD_GATEWAY, Json(json!({"error": "upstream"}))),
        _ => (StatusCode::OK, Json(json!([]))),
    }
}

async fn mock_backend() -> String {
    spawn(Router::new().route("/search", post(search_handler))).await
}

async fn mock_geocoder() -> String {
    spawn(Router::new().route("/search", get(geocode_handler))).await
}

fn geocoder_config(base_url: String) -> GeocoderConfig {
    GeocoderConfig {
        base_url,
        ..GeocoderConfig::default()
    }
}

#[tokio::test]
async fn test_search_client_parses_records() {
    let base = mock_backend().await;
    let client = build_http_client(&Config::default()).unwrap();
    let backend = HttpSearchClient::new(client, format!("{base}/search"));

    let trials = backend.search("pediatric asthma").await.unwrap();
    assert_eq!(trials.len(), 2);
    assert_eq!(trials[1].conditions, vec!["Asthma", "Allergy"]);
    assert_eq!(
        trials[0].search_params.as_ref().unwrap().radius_search(),
        Some(("Boston", 10.0))
    );
}

#[tokio::test]
async fn test_search_client_non_success_is_error() {
    let base = mock_backend().await;
    let client = build_http_client(&Config::default()).unwrap();
    let backend = HttpSearchClient::new(client, format!("{base}/search"));

    let err = backend.search("boom").await.unwrap_err();
    assert!(err.to_string().contains("500"), "unexpected error: {err}");
}

#[tokio::test]
async fn test_search_client_transport_failure_is_error() {
    let client = build_http_client(&Config::default()).unwrap();
    // Port 9 (discard) is not listening on loopback
    let backend = HttpSearchClient::new(client, "http://127.0.0.1:9/search");
    assert!(backend.search("asthma").await.is_err());
}

#[tokio::test]
async fn test_geocoder_first_match_and_absorbed_failures() {
    let base = mock_geocoder().await;
    let client = build_http_client(&Config::default()).unwrap();
    let geocoder = NominatimGeocoder::new(client.clone(), geocoder_config(base.clone()));

    assert_eq!(
        geocoder.geocode("Boston").await,
        Some(LatLng::new(42.3554334, -71.060511))
    );
    assert_eq!(geocoder.geocode("Nowhere").await, None);
    assert_eq!(geocoder.geocode("Broken").await, None);
    assert_eq!(geocoder.geocode("  ").await, None);

    let disabled = NominatimGeocoder::new(
        client,
        GeocoderConfig {
            enabled: false,
            ..geocoder_config(base)
        },
    );
    assert_eq!(disabled.geocode("Boston").await, None);
}

#[tokio::test]
async fn test_session_end_to_end_over_http() {
    let backend_url = mock_backend().await;
    let geocoder_url = mock_geocoder().await;
    let dir = tempfile::tempdir().unwrap();

    let config = Config {
        search_base_url: backend_url,
        data_dir: dir.path().to_path_buf(),
        geocoder: geocoder_config(geocoder_url),
        ..Config::default()
    };
    let client = build_http_client(&config).unwrap();
    let backend = HttpSearchClient::new(client.clone(), config.search_url());
    let geocoder = NominatimGeocoder::new(client, config.geocoder.clone());
    let mut session = SearchSession::new(config, backend, geocoder);

    let outcome = session.submit("pediatric asthma near Boston").await;
    assert_eq!(outcome, Outcome::Results { trials: 2, markers: 3 });

    let view = session.view();
    assert_eq!(view.rows()[0].trial_id, "NCT00000001");
    assert_eq!(view.rows()[0].start_date, "September 2022");
    assert_eq!(
        view.banner(),
        Some("Showing interventional trials for pediatric asthma within 10 miles of Boston.")
    );
    assert_eq!(
        view.map().viewport(),
        Viewport {
            center: LatLng::new(42.3554334, -71.060511),
            zoom: 11
        }
    );

    assert_eq!(session.submit("boom").await, Outcome::Failed);
    assert_eq!(session.submit("nothing").await, Outcome::Empty);
    assert_eq!(session.recent(), ["nothing", "pediatric asthma near Boston"]);

    let persisted = std::fs::read_to_string(dir.path().join("recent_searches.json")).unwrap();
    let saved: Vec<String> = serde_json::from_str(&persisted).unwrap();
    assert_eq!(saved, vec!["nothing", "pediatric asthma near Boston"]);
}
