use chrono::Utc;

use crate::{
    api::RouteTarget,
    coordinate::Coordinate,
    destination::Destination,
    error::NavError,
    gateway::MapsGateway,
    route::RouteResult,
};

pub async fn resolve_target(maps: &dyn MapsGateway, target: RouteTarget) -> Result<Destination, NavError> {
    match target {
        RouteTarget::ByCoordinates(destination) => Ok(destination),
        RouteTarget::ByAddress(address) => maps.geocode(&address).await,
    }
}

/// Asks for directions and stamps the answer with its destination and ETA.
pub async fn plan_route(maps: &dyn MapsGateway, origin: Coordinate, destination: Destination) -> Result<RouteResult, NavError> {
    let metrics = maps.route(origin, destination.coords).await?;
    RouteResult::from_metrics(destination, metrics, Utc::now())
}
