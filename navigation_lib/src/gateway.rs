use async_trait::async_trait;

use crate::{
    coordinate::Coordinate,
    destination::Destination,
    error::NavError,
    history::HistoryEntry,
    route::RouteMetrics,
};

/// Geocoding and directions, delegated to a mapping provider.
/// Plain request/response: no streaming, no partial answers, no retries.
#[async_trait]
pub trait MapsGateway: Send + Sync {
    /// Fails with `NotFound` when the provider has no match.
    async fn geocode(&self, address: &str) -> Result<Destination, NavError>;

    /// Fails with `NoRoute` when the provider has no route.
    async fn route(&self, origin: Coordinate, destination: Coordinate) -> Result<RouteMetrics, NavError>;
}

/// Recent destinations, most recent first.
///
/// Implementations without a backing store behave as empty: `list` yields
/// nothing, `append` and `clear` succeed without effect.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    async fn append(&self, address: &str, destination: &Destination) -> Result<Option<HistoryEntry>, NavError>;

    async fn list(&self, limit: u32) -> Result<Vec<HistoryEntry>, NavError>;

    /// Returns how many entries were removed.
    async fn clear(&self) -> Result<u64, NavError>;
}
