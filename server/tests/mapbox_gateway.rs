//! The Mapbox gateway against a throwaway axum server that mimics the provider.

use std::collections::HashMap;

use axum::{
    extract::{Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use navigation_lib::{coordinate::Coordinate, error::NavError, gateway::MapsGateway};
use serde_json::json;
use server::maps::{MapboxGateway, INVALID_KEY_MESSAGE};
use tokio::net::TcpListener;

const KEY: &str = "pk.eyJ1IjoidGVzdCIsImEiOiJjbGZha2V0b2tlbiJ9.fake-signature";

async fn geocode(Path(query): Path<String>, Query(params): Query<HashMap<String, String>>) -> impl IntoResponse {
    if params.get("access_token").map(String::as_str) != Some(KEY) {
        return (StatusCode::UNAUTHORIZED, Json(json!({ "message": "Not Authorized - Invalid Token" })));
    }
    if params.get("limit").map(String::as_str) != Some("1") {
        return (StatusCode::BAD_REQUEST, Json(json!({ "message": "limit missing" })));
    }
    if query.starts_with("Atlantis") {
        return (StatusCode::OK, Json(json!({ "type": "FeatureCollection", "features": [] })));
    }
    if query.starts_with("Teapot") {
        return (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "message": "boom" })));
    }

    let place = query.trim_end_matches(".json");
    (StatusCode::OK, Json(json!({
        "type": "FeatureCollection",
        "features": [{ "place_name": format!("{place}, Ontario, Canada"), "center": [-79.3797, 43.6505] }]
    })))
}

async fn directions(Path(coordinates): Path<String>, Query(params): Query<HashMap<String, String>>) -> impl IntoResponse {
    if params.get("access_token").map(String::as_str) != Some(KEY) {
        return (StatusCode::UNAUTHORIZED, Json(json!({ "message": "Not Authorized - Invalid Token" })));
    }
    if params.get("geometries").map(String::as_str) != Some("geojson") || params.get("overview").map(String::as_str) != Some("full") {
        return (StatusCode::BAD_REQUEST, Json(json!({ "message": "bad params" })));
    }

    let points: Vec<[f64; 2]> = coordinates
        .split(';')
        .map(|pair| {
            let mut parts = pair.split(',').map(|part| part.parse::<f64>().unwrap());
            [parts.next().unwrap(), parts.next().unwrap()]
        })
        .collect();

    if points[1] == [0.0, 0.0] {
        return (StatusCode::OK, Json(json!({ "code": "NoRoute", "routes": [] })));
    }

    (StatusCode::OK, Json(json!({
        "code": "Ok",
        "routes": [{ "distance": 5000.0, "duration": 600.0, "geometry": { "type": "LineString", "coordinates": points } }]
    })))
}

async fn fake_provider() -> String {
    let app = Router::new()
        .route("/geocoding/v5/mapbox.places/{query}", get(geocode))
        .route("/directions/v5/mapbox/driving/{coordinates}", get(directions));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{addr}")
}

#[tokio::test]
async fn geocode_takes_the_first_feature() {
    let gateway = MapboxGateway::new(fake_provider().await, KEY);

    let destination = gateway.geocode("350 Bay Street, Toronto").await.unwrap();
    assert_eq!(destination.place_name, "350 Bay Street, Toronto, Ontario, Canada");
    assert_eq!(destination.coords, Coordinate::new(43.6505, -79.3797));
}

#[tokio::test]
async fn geocode_without_match_is_not_found() {
    let gateway = MapboxGateway::new(fake_provider().await, KEY);

    let error = gateway.geocode("Atlantis").await.unwrap_err();
    assert_eq!(error, NavError::NotFound("Unable to geocode destination.".into()));
}

#[tokio::test]
async fn provider_failure_is_unavailable() {
    let gateway = MapboxGateway::new(fake_provider().await, KEY);

    assert!(matches!(gateway.geocode("Teapot").await, Err(NavError::Unavailable(_))));
}

#[tokio::test]
async fn rejected_key_is_unauthorized() {
    let gateway = MapboxGateway::new(fake_provider().await, format!("{KEY}-revoked"));

    assert!(matches!(gateway.geocode("CN Tower").await, Err(NavError::Unauthorized(_))));
    let route = gateway.route(Coordinate::new(43.65, -79.38), Coordinate::new(43.6505, -79.3797)).await;
    assert!(matches!(route, Err(NavError::Unauthorized(_))));
}

#[tokio::test]
async fn placeholder_key_never_reaches_the_provider() {
    let gateway = MapboxGateway::new("http://127.0.0.1:9", "YOUR_MAPBOX_TOKEN");

    let error = gateway.geocode("CN Tower").await.unwrap_err();
    assert_eq!(error, NavError::Unauthorized(INVALID_KEY_MESSAGE.into()));
}

#[tokio::test]
async fn route_polyline_is_converted_from_lon_lat() {
    let gateway = MapboxGateway::new(fake_provider().await, KEY);

    let metrics = gateway.route(Coordinate::new(43.65, -79.38), Coordinate::new(43.6505, -79.3797)).await.unwrap();
    assert_eq!(metrics.distance_meters, 5000.0);
    assert_eq!(metrics.duration_seconds, 600.0);
    assert_eq!(metrics.polyline, vec![Coordinate::new(43.65, -79.38), Coordinate::new(43.6505, -79.3797)]);
}

#[tokio::test]
async fn empty_route_list_is_no_route() {
    let gateway = MapboxGateway::new(fake_provider().await, KEY);

    let error = gateway.route(Coordinate::new(43.65, -79.38), Coordinate::new(0.0, 0.0)).await.unwrap_err();
    assert_eq!(error, NavError::NoRoute("No route returned from mapping provider.".into()));
}

#[tokio::test]
async fn unreachable_provider_is_unavailable() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let gateway = MapboxGateway::new(format!("http://{addr}"), KEY);
    assert!(matches!(gateway.geocode("CN Tower").await, Err(NavError::Unavailable(_))));
}
