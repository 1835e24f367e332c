use async_trait::async_trait;
use geo_types::{LineString, Point};
use navigation_lib::{
    coordinate::Coordinate,
    destination::Destination,
    error::NavError,
    gateway::MapsGateway,
    route::RouteMetrics,
};
use reqwest::{StatusCode, Url};
use serde::{de::DeserializeOwned, Deserialize};

use crate::config::{is_placeholder_key, ServerConfig};

pub const INVALID_KEY_MESSAGE: &str =
    "MAPS_API_KEY is missing or invalid. Update .env with a valid Mapbox access token (pk...).";

#[derive(Deserialize)]
struct GeocodingResponse {
    #[serde(default)]
    features: Vec<Feature>,
}

#[derive(Deserialize)]
struct Feature {
    place_name: String,
    center: [f64; 2],
}

#[derive(Deserialize)]
struct DirectionsResponse {
    #[serde(default)]
    routes: Vec<DirectionsRoute>,
}

#[derive(Deserialize)]
struct DirectionsRoute {
    distance: f64,
    duration: f64,
    geometry: Geometry,
}

#[derive(Deserialize)]
struct Geometry {
    coordinates: Vec<[f64; 2]>,
}

/// Geocoding and driving directions backed by the Mapbox web APIs.
#[derive(Clone)]
pub struct MapboxGateway {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl MapboxGateway {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }

    pub fn from_config(config: &ServerConfig) -> Self {
        Self::new(config.maps_base_url.clone(), config.maps_api_key.clone())
    }

    fn api_key(&self) -> Result<&str, NavError> {
        if is_placeholder_key(&self.api_key) {
            tracing::error!("Refusing to call the mapping provider: {INVALID_KEY_MESSAGE}");
            return Err(NavError::Unauthorized(INVALID_KEY_MESSAGE.into()));
        }
        Ok(self.api_key.trim())
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, NavError> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|err| NavError::Unexpected(format!("Invalid MAPS_BASE_URL {}: {err}", self.base_url)))?;

        url.path_segments_mut()
            .map_err(|_| NavError::Unexpected(format!("MAPS_BASE_URL cannot carry a path: {}", self.base_url)))?
            .pop_if_empty()
            .extend(segments);

        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url, query: &[(&str, &str)]) -> Result<T, NavError> {
        tracing::debug!("GET {}", url.path());

        // The access token rides in the query string, so errors are stripped of their URL.
        let response = self.client.get(url).query(query).send().await
            .map_err(|err| NavError::Unavailable(format!("Mapping provider unreachable: {}", err.without_url())))?;

        match response.status() {
            status if status.is_success() => {},
            status @ (StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) => {
                return Err(NavError::Unauthorized(format!(
                    "Mapping provider rejected MAPS_API_KEY ({status}). Update .env with a valid Mapbox access token (pk...)."
                )));
            },
            status => {
                return Err(NavError::Unavailable(format!("Mapping provider responded with {status}")));
            },
        }

        response.json::<T>().await
            .map_err(|err| NavError::Unexpected(format!("Unreadable mapping provider response: {}", err.without_url())))
    }
}

#[async_trait]
impl MapsGateway for MapboxGateway {
    async fn geocode(&self, address: &str) -> Result<Destination, NavError> {
        let api_key = self.api_key()?;
        let url = self.endpoint(&["geocoding", "v5", "mapbox.places", &format!("{address}.json")])?;

        let response: GeocodingResponse = self.get_json(url, &[("access_token", api_key), ("limit", "1")]).await?;

        let feature = response.features.into_iter().next()
            .ok_or_else(|| NavError::NotFound("Unable to geocode destination.".into()))?;

        Ok(Destination::new(feature.place_name, Coordinate::from_lon_lat(feature.center)))
    }

    async fn route(&self, origin: Coordinate, destination: Coordinate) -> Result<RouteMetrics, NavError> {
        let api_key = self.api_key()?;
        let (from, to) = (Point::from(origin), Point::from(destination));
        let coordinates = format!("{},{};{},{}", from.x(), from.y(), to.x(), to.y());
        let url = self.endpoint(&["directions", "v5", "mapbox", "driving", &coordinates])?;

        let response: DirectionsResponse = self.get_json(
            url,
            &[("access_token", api_key), ("geometries", "geojson"), ("overview", "full")],
        ).await?;

        let route = response.routes.into_iter().next()
            .ok_or_else(|| NavError::NoRoute("No route returned from mapping provider.".into()))?;

        Ok(RouteMetrics::from_line_string(
            route.distance,
            route.duration,
            LineString::from(route.geometry.coordinates),
        ))
    }
}
