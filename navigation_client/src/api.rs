use std::time::Duration;

use async_trait::async_trait;
use navigation_lib::{
    api::{
        AppendHistoryRequest, AppendHistoryResponse, ClearedResponse, ErrorBody, HealthResponse, HistoryResponse,
        MessageResponse, RouteRequest,
    },
    coordinate::Coordinate,
    destination::Destination,
    error::NavError,
    gateway::{HistoryStore, MapsGateway},
    history::HistoryEntry,
    route::{RouteMetrics, RouteResult},
};
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;

pub const REQUEST_TIMEOUT: Duration = Duration::from_millis(15_000);

/// The navigation backend over HTTP.
///
/// Doubles as the session's `MapsGateway` and `HistoryStore`, so a client
/// never talks to the mapping provider directly.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, NavError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| NavError::Unexpected(format!("Failed to build HTTP client: {err}")))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        tracing::debug!("{method} {}{path}", self.base_url);
        self.client.request(method, format!("{}{path}", self.base_url))
    }

    async fn make_request<ReturnType>(&self, request: RequestBuilder) -> Result<ReturnType, NavError>
    where
        ReturnType: DeserializeOwned,
    {
        let response = request.send().await.map_err(|err| {
            if err.is_timeout() {
                NavError::Unavailable("The navigation service took too long to respond.".into())
            } else {
                NavError::Unavailable(format!("Unable to reach the navigation service at {}.", self.base_url))
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let fallback = status_error(status);
            return Err(match response.json::<ErrorBody>().await {
                Ok(body) if body.code.is_some() => body.into_error(),
                _ => fallback,
            });
        }

        response
            .json::<ReturnType>()
            .await
            .map_err(|err| NavError::Unexpected(format!("Unreadable response from the navigation service: {err}")))
    }

    pub async fn health(&self) -> Result<HealthResponse, NavError> {
        self.make_request(self.request(Method::GET, "/health")).await
    }

    pub async fn request_route(&self, request: &RouteRequest) -> Result<RouteResult, NavError> {
        self.make_request(self.request(Method::POST, "/api/navigation/route").json(request))
            .await
    }

    pub async fn geocode_address(&self, address: &str) -> Result<Destination, NavError> {
        self.make_request(self.request(Method::GET, "/api/navigation/geocode").query(&[("address", address)]))
            .await
    }

    pub async fn history(&self, limit: u32) -> Result<Vec<HistoryEntry>, NavError> {
        let response: HistoryResponse = self
            .make_request(self.request(Method::GET, "/api/navigation/history").query(&[("limit", limit)]))
            .await?;
        Ok(response.history)
    }

    pub async fn append_history(&self, address: &str, destination: &Destination) -> Result<Option<HistoryEntry>, NavError> {
        let body = AppendHistoryRequest {
            address: Some(address.to_string()),
            destination: Some(destination.clone()),
        };
        let response: AppendHistoryResponse = self
            .make_request(self.request(Method::POST, "/api/navigation/history").json(&body))
            .await?;
        Ok(response.entry)
    }

    pub async fn clear_history(&self) -> Result<u64, NavError> {
        let response: ClearedResponse = self.make_request(self.request(Method::DELETE, "/api/navigation/history")).await?;
        Ok(response.cleared)
    }

    pub async fn debug_log(&self) -> Result<String, NavError> {
        let response: MessageResponse = self.make_request(self.request(Method::POST, "/api/navigation/debug-log")).await?;
        Ok(response.message)
    }
}

/// Used when an error response carries no readable body.
fn status_error(status: StatusCode) -> NavError {
    let message = format!("Navigation service answered {status}");
    match status {
        StatusCode::UNPROCESSABLE_ENTITY | StatusCode::BAD_REQUEST => NavError::InvalidInput {
            message,
            issues: Vec::new(),
        },
        StatusCode::NOT_FOUND => NavError::NotFound(message),
        StatusCode::BAD_GATEWAY => NavError::NoRoute(message),
        StatusCode::SERVICE_UNAVAILABLE | StatusCode::GATEWAY_TIMEOUT => NavError::Unavailable(message),
        _ => NavError::Unexpected(message),
    }
}

#[async_trait]
impl MapsGateway for ApiClient {
    async fn geocode(&self, address: &str) -> Result<Destination, NavError> {
        self.geocode_address(address).await
    }

    /// The backend only hands out whole routes, so the metrics are taken from one.
    /// The empty place name keeps the backend from recording a refresh in the history.
    async fn route(&self, origin: Coordinate, destination: Coordinate) -> Result<RouteMetrics, NavError> {
        let request = RouteRequest::by_coordinates(origin, Destination::new("", destination));
        let route = self.request_route(&request).await?;

        Ok(RouteMetrics::new(route.distance_meters, route.duration_seconds, route.polyline))
    }
}

#[async_trait]
impl HistoryStore for ApiClient {
    async fn append(&self, address: &str, destination: &Destination) -> Result<Option<HistoryEntry>, NavError> {
        self.append_history(address, destination).await
    }

    async fn list(&self, limit: u32) -> Result<Vec<HistoryEntry>, NavError> {
        self.history(limit).await
    }

    async fn clear(&self) -> Result<u64, NavError> {
        self.clear_history().await
    }
}
