use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, HeaderMap, Method, Request, StatusCode},
    Router,
};
use chrono::{DateTime, Utc};
use http_body_util::BodyExt;
use navigation_data_management::DataManager;
use navigation_lib::{
    coordinate::Coordinate,
    destination::Destination,
    error::NavError,
    gateway::MapsGateway,
    route::RouteMetrics,
};
use serde_json::{json, Value};
use server::{maps::MapboxGateway, server_state::ServerState};
use tower::ServiceExt;

struct StubMaps;

#[async_trait]
impl MapsGateway for StubMaps {
    async fn geocode(&self, address: &str) -> Result<Destination, NavError> {
        if address.starts_with("Atlantis") {
            return Err(NavError::NotFound("Unable to geocode destination.".into()));
        }
        Ok(Destination::new(format!("{address}, Ontario, Canada"), Coordinate::new(43.6505, -79.3797)))
    }

    async fn route(&self, origin: Coordinate, destination: Coordinate) -> Result<RouteMetrics, NavError> {
        if destination.latitude == 0.0 && destination.longitude == 0.0 {
            return Err(NavError::NoRoute("No route returned from mapping provider.".into()));
        }
        Ok(RouteMetrics::new(5000.0, 600.0, vec![origin, destination]))
    }
}

async fn app_with(data_manager: DataManager, maps: Arc<dyn MapsGateway>) -> Router {
    server::app(Arc::new(ServerState::new(data_manager, maps)))
}

async fn connected_app() -> Router {
    let data_manager = DataManager::start(Some("sqlite::memory:")).await.unwrap();
    app_with(data_manager, Arc::new(StubMaps)).await
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, HeaderMap, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };

    (status, headers, json)
}

fn route_body(address: &str) -> Value {
    json!({
        "origin": { "latitude": 43.65, "longitude": -79.38 },
        "destinationAddress": address
    })
}

#[tokio::test]
async fn health_is_ok_and_uncached() {
    let app = connected_app().await;
    let (status, headers, body) = send(&app, Method::GET, "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "ok" }));
    assert_eq!(headers.get(header::CACHE_CONTROL).unwrap(), "no-store");
}

#[tokio::test]
async fn route_by_address_returns_metrics_and_records_history() {
    let app = connected_app().await;
    let before = Utc::now();

    let (status, _, body) = send(&app, Method::POST, "/api/navigation/route", Some(route_body("350 Bay Street, Toronto"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["distance"], 5000.0);
    assert_eq!(body["duration"], 600.0);
    assert_eq!(body["destination"]["placeName"], "350 Bay Street, Toronto, Ontario, Canada");
    assert_eq!(body["polyline"].as_array().unwrap().len(), 2);

    let eta: DateTime<Utc> = body["eta"].as_str().unwrap().parse().unwrap();
    let offset = (eta - before).num_seconds();
    assert!((599..=605).contains(&offset), "eta offset was {offset}s");

    let (status, _, body) = send(&app, Method::GET, "/api/navigation/history", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["history"][0]["address"], "350 Bay Street, Toronto");
}

#[tokio::test]
async fn route_by_coordinates_skips_history_without_a_label() {
    let app = connected_app().await;
    let body = json!({
        "origin": { "latitude": 43.65, "longitude": -79.38 },
        "destination": { "placeName": "", "coords": { "latitude": 43.645, "longitude": -79.38 } }
    });

    let (status, _, _) = send(&app, Method::POST, "/api/navigation/route", Some(body)).await;
    assert_eq!(status, StatusCode::OK);

    // Only the trip log exists, surfaced through the fallback.
    let (_, _, body) = send(&app, Method::GET, "/api/navigation/history", None).await;
    assert_eq!(body["history"][0]["address"], "Previous destination");
    let (_, _, body) = send(&app, Method::DELETE, "/api/navigation/history", None).await;
    assert_eq!(body, json!({ "cleared": 0 }));
}

#[tokio::test]
async fn route_by_coordinates_records_the_place_name() {
    let app = connected_app().await;
    let body = json!({
        "origin": { "latitude": 43.65, "longitude": -79.38 },
        "destination": { "placeName": "Union Station, Toronto", "coords": { "latitude": 43.645, "longitude": -79.38 } }
    });

    let (status, _, _) = send(&app, Method::POST, "/api/navigation/route", Some(body)).await;
    assert_eq!(status, StatusCode::OK);

    let (_, _, body) = send(&app, Method::GET, "/api/navigation/history", None).await;
    assert_eq!(body["history"].as_array().unwrap().len(), 1);
    assert_eq!(body["history"][0]["address"], "Union Station, Toronto");
}

#[tokio::test]
async fn route_validation_lists_issues() {
    let app = connected_app().await;

    let (status, _, body) = send(&app, Method::POST, "/api/navigation/route", Some(json!({}))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["message"], "Validation error");
    assert_eq!(body["code"], "InvalidInput");
    let paths: Vec<&Value> = body["details"].as_array().unwrap().iter().map(|issue| &issue["path"][0]).collect();
    assert_eq!(paths, vec![&json!("origin"), &json!("destination")]);

    let (status, _, _) = send(&app, Method::POST, "/api/navigation/route", Some(route_body("ab"))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn malformed_body_is_a_validation_error() {
    let app = connected_app().await;
    let body = json!({ "origin": { "latitude": "north" }, "destinationAddress": "350 Bay Street" });

    let (status, _, body) = send(&app, Method::POST, "/api/navigation/route", Some(body)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "InvalidInput");
}

#[tokio::test]
async fn provider_errors_map_to_statuses() {
    let app = connected_app().await;

    let (status, _, body) = send(&app, Method::POST, "/api/navigation/route", Some(route_body("Atlantis"))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Unable to geocode destination.");

    let body = json!({
        "origin": { "latitude": 43.65, "longitude": -79.38 },
        "destination": { "placeName": "Null Island", "coords": { "latitude": 0.0, "longitude": 0.0 } }
    });
    let (status, _, body) = send(&app, Method::POST, "/api/navigation/route", Some(body)).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["code"], "NoRoute");

    // Nothing was recorded for the failed requests.
    let (_, _, body) = send(&app, Method::GET, "/api/navigation/history", None).await;
    assert_eq!(body["history"], json!([]));
}

#[tokio::test]
async fn geocode_endpoint() {
    let app = connected_app().await;

    let (status, _, body) = send(&app, Method::GET, "/api/navigation/geocode?address=CN%20Tower", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["placeName"], "CN Tower, Ontario, Canada");
    assert_eq!(body["coords"]["latitude"], 43.6505);

    let (status, _, _) = send(&app, Method::GET, "/api/navigation/geocode?address=CN", None).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, _, _) = send(&app, Method::GET, "/api/navigation/geocode?address=Atlantis", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn history_limit_is_bounded() {
    let app = connected_app().await;

    for address in ["Union Station", "CN Tower", "Casa Loma"] {
        send(&app, Method::POST, "/api/navigation/route", Some(route_body(address))).await;
    }

    let (status, _, body) = send(&app, Method::GET, "/api/navigation/history?limit=2", None).await;
    assert_eq!(status, StatusCode::OK);
    let addresses: Vec<&str> = body["history"].as_array().unwrap().iter().map(|entry| entry["address"].as_str().unwrap()).collect();
    assert_eq!(addresses, vec!["Casa Loma", "CN Tower"]);

    let (status, _, _) = send(&app, Method::GET, "/api/navigation/history?limit=26", None).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (_, _, body) = send(&app, Method::DELETE, "/api/navigation/history", None).await;
    assert_eq!(body, json!({ "cleared": 3 }));
}

#[tokio::test]
async fn history_can_be_appended_directly() {
    let app = connected_app().await;
    let body = json!({
        "address": "Union Station",
        "destination": { "placeName": "Union Station, Toronto", "coords": { "latitude": 43.645, "longitude": -79.38 } }
    });

    let (status, _, body) = send(&app, Method::POST, "/api/navigation/history", Some(body)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["entry"]["address"], "Union Station");

    let (status, _, _) = send(&app, Method::POST, "/api/navigation/history", Some(json!({ "address": "" }))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn debug_log_inserts_a_trip() {
    let app = connected_app().await;

    let (status, _, body) = send(&app, Method::POST, "/api/navigation/debug-log", None).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["message"], "Debug trip inserted");

    let (_, _, body) = send(&app, Method::GET, "/api/navigation/history", None).await;
    assert_eq!(body["history"][0]["address"], "Debug Destination");
}

#[tokio::test]
async fn degraded_mode_still_routes() {
    let app = app_with(DataManager::disconnected(), Arc::new(StubMaps)).await;

    let (status, _, body) = send(&app, Method::POST, "/api/navigation/route", Some(route_body("350 Bay Street, Toronto"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["distance"], 5000.0);

    let (_, _, body) = send(&app, Method::GET, "/api/navigation/history", None).await;
    assert_eq!(body, json!({ "history": [] }));

    let (_, _, body) = send(&app, Method::DELETE, "/api/navigation/history", None).await;
    assert_eq!(body, json!({ "cleared": 0 }));
}

#[tokio::test]
async fn placeholder_key_names_the_misconfiguration() {
    let maps = Arc::new(MapboxGateway::new("http://127.0.0.1:9", "your_mapbox_token"));
    let app = app_with(DataManager::disconnected(), maps).await;

    let (status, _, body) = send(&app, Method::POST, "/api/navigation/route", Some(route_body("350 Bay Street, Toronto"))).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["code"], "Unauthorized");
    assert!(body["message"].as_str().unwrap().contains("MAPS_API_KEY"));
}
