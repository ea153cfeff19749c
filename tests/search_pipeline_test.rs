use cp_selection::{CandidateSet, Config, CpError, CpSearch, SearchRequest, StepMode};
use httpmock::prelude::*;
use serde_json::json;

const ISOCHRONE_PATH: &str = "/v2/isochrones/foot-walking";
const OVERPASS_PATH: &str = "/api/interpreter";

fn isochrone_body(range: u32) -> serde_json::Value {
    json!({
        "type": "FeatureCollection",
        "bbox": [5.18, 52.06, 5.27, 52.11],
        "features": [{
            "type": "Feature",
            "properties": {"group_index": 0, "value": range, "center": [5.1214, 52.0907]},
            "geometry": {
                "type": "Polygon",
                "coordinates": [[[5.18, 52.08], [5.22, 52.06], [5.27, 52.08], [5.22, 52.11], [5.18, 52.08]]]
            }
        }],
        "metadata": {"service": "isochrones"}
    })
}

// Way 2 (small, no capacity) comes first; way 3 has a gap, way 4 is a bare segment.
const PARKINGS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<osm version="0.6" generator="Overpass API">
  <way id="2">
    <nd ref="20" lat="52.0800" lon="5.2100"/>
    <nd ref="21" lat="52.0800" lon="5.2110"/>
    <nd ref="22" lat="52.0810" lon="5.2110"/>
    <nd ref="23" lat="52.0810" lon="5.2100"/>
    <nd ref="20" lat="52.0800" lon="5.2100"/>
    <tag k="amenity" v="parking"/>
    <tag k="parking" v="surface"/>
  </way>
  <way id="1">
    <nd ref="10" lat="52.0800" lon="5.2000"/>
    <nd ref="11" lat="52.0800" lon="5.2020"/>
    <nd ref="12" lat="52.0820" lon="5.2020"/>
    <nd ref="13" lat="52.0820" lon="5.2000"/>
    <nd ref="10" lat="52.0800" lon="5.2000"/>
    <tag k="amenity" v="parking"/>
    <tag k="capacity" v="500"/>
    <tag k="access" v="yes"/>
    <tag k="parking" v="surface"/>
  </way>
  <way id="3">
    <nd ref="30" lat="52.0900" lon="5.2300"/>
    <nd ref="31"/>
    <nd ref="32" lat="52.0910" lon="5.2310"/>
    <nd ref="33" lat="52.0900" lon="5.2310"/>
  </way>
  <way id="4">
    <nd ref="40" lat="52.0950" lon="5.2400"/>
    <nd ref="41" lat="52.0951" lon="5.2401"/>
  </way>
</osm>"#;

fn config_for(server: &MockServer) -> Config {
    let mut config = Config::default();
    config.geocoder.url = server.base_url();
    config.geocoder.timeout_secs = 5;
    config.isochrone.url = server.base_url();
    config.isochrone.api_key = Some("test-key".to_string());
    config.isochrone.timeout_secs = 5;
    config.overpass.url = server.url(OVERPASS_PATH);
    config.overpass.timeout_secs = 5;
    config
}

#[tokio::test]
async fn test_coordinates_to_ranked_candidates() {
    let server = MockServer::start_async().await;

    let geocoder_mock = server
        .mock_async(|when, then| {
            when.method(GET).path("/search");
            then.status(200).json_body(json!([]));
        })
        .await;
    let isochrone_mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path(ISOCHRONE_PATH)
                .header("Authorization", "test-key")
                .body_contains("\"locations\":[[5.1214,52.0907]]")
                .body_contains("\"range\":[5000]")
                .body_contains("\"range_type\":\"distance\"");
            then.status(200).json_body(isochrone_body(5000));
        })
        .await;
    let overpass_mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path(OVERPASS_PATH)
                .body_contains("way[\"parking\"=\"surface\"](52.06, 5.18, 52.11, 5.27);out geom;");
            then.status(200)
                .header("Content-Type", "application/osm3s+xml")
                .body(PARKINGS_XML);
        })
        .await;

    let search = CpSearch::from_config(&config_for(&server)).unwrap();
    let outcome = search
        .run(&SearchRequest::new("52.0907, 5.1214", 2.0, 5.0))
        .await
        .unwrap();

    geocoder_mock.assert_hits_async(0).await;
    isochrone_mock.assert_async().await;
    overpass_mock.assert_async().await;

    assert_eq!(outcome.origin.latitude, 52.0907);
    assert_eq!(outcome.origin.longitude, 5.1214);
    assert_eq!(outcome.budget.distance_budget_m, 5000);
    assert_eq!(outcome.query_box.as_array(), [52.06, 5.18, 52.11, 5.27]);
    assert_eq!(outcome.catchment.rings.len(), 1);

    let candidates = outcome.candidates.as_slice();
    assert_eq!(candidates.len(), 2);
    assert_eq!(candidates[0].osm_id, 1);
    assert_eq!(candidates[1].osm_id, 2);
    assert!(candidates[0].area_m2 > candidates[1].area_m2);
    assert!(candidates.iter().all(|c| c.area_m2 > 0.0));

    assert_eq!(candidates[0].capacity, 500);
    assert!(!candidates[0].capacity_estimated);
    assert_eq!(candidates[0].access, "yes");

    // A quarter of the big lot's area at its density
    assert!(candidates[1].capacity_estimated);
    assert!((124..=126).contains(&candidates[1].capacity), "{}", candidates[1].capacity);
    assert_eq!(candidates[1].access, "unknown");
}

#[tokio::test]
async fn test_address_goes_through_geocoder_once() {
    let server = MockServer::start_async().await;

    let geocoder_mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/search")
                .query_param("q", "Domplein 1, Utrecht")
                .query_param("format", "json")
                .query_param("limit", "1");
            then.status(200)
                .json_body(json!([{"lat": "52.0907", "lon": "5.1214", "display_name": "Domplein 1"}]));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(POST).path(ISOCHRONE_PATH);
            then.status(200).json_body(isochrone_body(5000));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(POST).path(OVERPASS_PATH);
            then.status(200).body(PARKINGS_XML);
        })
        .await;

    let search = CpSearch::from_config(&config_for(&server)).unwrap();
    let request = SearchRequest::new("  Domplein 1, Utrecht ", 2.0, 5.0);
    let first = search.run(&request).await.unwrap();
    let second = search.run(&request).await.unwrap();

    geocoder_mock.assert_hits_async(1).await;
    assert_eq!(first.origin, second.origin);
    assert_eq!(first.origin.latitude, 52.0907);
    assert_eq!(first.candidates, second.candidates);
}

#[tokio::test]
async fn test_unknown_address_fails_resolution() {
    let server = MockServer::start_async().await;

    server
        .mock_async(|when, then| {
            when.method(GET).path("/search");
            then.status(200).json_body(json!([]));
        })
        .await;
    let isochrone_mock = server
        .mock_async(|when, then| {
            when.method(POST).path(ISOCHRONE_PATH);
            then.status(200).json_body(isochrone_body(5000));
        })
        .await;

    let search = CpSearch::from_config(&config_for(&server)).unwrap();
    let err = search
        .run(&SearchRequest::new("Nergensstraat 99, Nergenshuizen", 2.0, 5.0))
        .await
        .unwrap_err();

    assert!(matches!(err, CpError::Resolution { .. }));
    isochrone_mock.assert_hits_async(0).await;
}

#[tokio::test]
async fn test_invalid_budget_makes_no_requests() {
    let server = MockServer::start_async().await;

    let any_mock = server
        .mock_async(|when, then| {
            when.path_contains("/");
            then.status(200);
        })
        .await;

    let search = CpSearch::from_config(&config_for(&server)).unwrap();
    for (hours, speed) in [(2.0, 0.0), (0.0, 5.0), (2.0, -3.0)] {
        let err = search
            .run(&SearchRequest::new("Domplein 1, Utrecht", hours, speed))
            .await
            .unwrap_err();
        assert!(matches!(err, CpError::InvalidBudget(_)), "{:?}", err);
    }

    // One hour at 4 km/h only leaves the zero ring in incremental mode
    let request = SearchRequest {
        step_mode: StepMode::Incremental,
        ..SearchRequest::new("52.0907, 5.1214", 1.0, 4.0)
    };
    let err = search.run(&request).await.unwrap_err();
    assert!(matches!(err, CpError::InvalidBudget(_)));

    any_mock.assert_hits_async(0).await;
}

#[tokio::test]
async fn test_incremental_rings_skip_zero() {
    let server = MockServer::start_async().await;

    let isochrone_mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path(ISOCHRONE_PATH)
                .body_contains("\"range\":[2000,4000]");
            then.status(200).json_body(isochrone_body(4000));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(POST).path(OVERPASS_PATH);
            then.status(200).body(PARKINGS_XML);
        })
        .await;

    let search = CpSearch::from_config(&config_for(&server)).unwrap();
    let request = SearchRequest {
        step_mode: StepMode::Incremental,
        ..SearchRequest::new("52.0907, 5.1214", 3.0, 4.0)
    };
    let outcome = search.run(&request).await.unwrap();

    isochrone_mock.assert_async().await;
    assert_eq!(outcome.budget.range_steps, vec![0, 2000, 4000]);
}

#[tokio::test]
async fn test_isochrone_failure_aborts_search() {
    let server = MockServer::start_async().await;

    server
        .mock_async(|when, then| {
            when.method(POST).path(ISOCHRONE_PATH);
            then.status(500).body("internal error");
        })
        .await;
    let overpass_mock = server
        .mock_async(|when, then| {
            when.method(POST).path(OVERPASS_PATH);
            then.status(200).body(PARKINGS_XML);
        })
        .await;

    let search = CpSearch::from_config(&config_for(&server)).unwrap();
    let err = search
        .run(&SearchRequest::new("52.0907, 5.1214", 2.0, 5.0))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        CpError::UpstreamService {
            service: "Isochrone",
            ..
        }
    ));
    overpass_mock.assert_hits_async(0).await;
}

#[tokio::test]
async fn test_overpass_failure_aborts_search() {
    let server = MockServer::start_async().await;

    server
        .mock_async(|when, then| {
            when.method(POST).path(ISOCHRONE_PATH);
            then.status(200).json_body(isochrone_body(5000));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(POST).path(OVERPASS_PATH);
            then.status(504).body("Gateway Timeout");
        })
        .await;

    let search = CpSearch::from_config(&config_for(&server)).unwrap();
    let err = search
        .run(&SearchRequest::new("52.0907, 5.1214", 2.0, 5.0))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        CpError::UpstreamService {
            service: "Overpass",
            ..
        }
    ));
}

#[tokio::test]
async fn test_overpass_timeout_remark_aborts_search() {
    let server = MockServer::start_async().await;

    server
        .mock_async(|when, then| {
            when.method(POST).path(ISOCHRONE_PATH);
            then.status(200).json_body(isochrone_body(5000));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(POST).path(OVERPASS_PATH);
            then.status(200).body(
                r#"<?xml version="1.0" encoding="UTF-8"?>
<osm version="0.6" generator="Overpass API">
<remark> runtime error: Query timed out in "query" at line 1 after 5 seconds. </remark>
</osm>"#,
            );
        })
        .await;

    let search = CpSearch::from_config(&config_for(&server)).unwrap();
    let err = search
        .run(&SearchRequest::new("52.0907, 5.1214", 2.0, 5.0))
        .await
        .unwrap_err();

    match err {
        CpError::UpstreamService { service, reason } => {
            assert_eq!(service, "Overpass");
            assert!(reason.contains("Query timed out"), "{}", reason);
        }
        other => panic!("unexpected error {:?}", other),
    }
}

#[tokio::test]
async fn test_zero_max_candidates_is_rejected_as_input() {
    let server = MockServer::start_async().await;

    let any_mock = server
        .mock_async(|when, then| {
            when.path_contains("/");
            then.status(200);
        })
        .await;

    let search = CpSearch::from_config(&config_for(&server)).unwrap();
    let request = SearchRequest {
        max_candidates: Some(0),
        ..SearchRequest::new("52.0907, 5.1214", 2.0, 5.0)
    };
    let err = search.run(&request).await.unwrap_err();

    assert!(matches!(err, CpError::InvalidRequest(_)), "{:?}", err);
    assert!(err.is_user_input());
    any_mock.assert_hits_async(0).await;
}

#[tokio::test]
async fn test_no_parkings_is_an_empty_result() {
    let server = MockServer::start_async().await;

    server
        .mock_async(|when, then| {
            when.method(POST).path(ISOCHRONE_PATH);
            then.status(200).json_body(isochrone_body(5000));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(POST).path(OVERPASS_PATH);
            then.status(200)
                .body(r#"<?xml version="1.0" encoding="UTF-8"?><osm version="0.6"></osm>"#);
        })
        .await;

    let search = CpSearch::from_config(&config_for(&server)).unwrap();
    let outcome = search
        .run(&SearchRequest::new("52.0907, 5.1214", 2.0, 5.0))
        .await
        .unwrap();

    assert!(outcome.candidates.is_empty());
}

#[tokio::test]
async fn test_max_candidates_truncates_and_export_round_trips() {
    let server = MockServer::start_async().await;

    server
        .mock_async(|when, then| {
            when.method(POST).path(ISOCHRONE_PATH);
            then.status(200).json_body(isochrone_body(5000));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(POST).path(OVERPASS_PATH);
            then.status(200).body(PARKINGS_XML);
        })
        .await;

    let search = CpSearch::from_config(&config_for(&server)).unwrap();
    let request = SearchRequest {
        max_candidates: Some(1),
        ..SearchRequest::new("52.0907, 5.1214", 2.0, 5.0)
    };
    let outcome = search.run(&request).await.unwrap();
    assert_eq!(outcome.candidates.len(), 1);
    assert_eq!(outcome.candidates.as_slice()[0].osm_id, 1);

    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("cp_selection_parking.json");
    std::fs::write(&path, outcome.candidates.to_geojson_string()).unwrap();

    let back = CandidateSet::from_geojson_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(back, outcome.candidates);
}
