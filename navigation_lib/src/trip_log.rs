use serde::{Deserialize, Serialize};

use crate::{coordinate::Coordinate, destination::Destination, route::RouteResult};

/// Bookkeeping record written for every route handed out by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TripLog {
    pub origin: Coordinate,
    pub destination: Destination,
    pub distance_meters: i64,
    pub duration_seconds: i64,
}

impl TripLog {
    pub fn new(origin: Coordinate, destination: Destination, distance_meters: i64, duration_seconds: i64) -> Self {
        Self {
            origin,
            destination,
            distance_meters,
            duration_seconds,
        }
    }

    pub fn from_route(origin: Coordinate, route: &RouteResult) -> Self {
        Self::new(
            origin,
            route.destination.clone(),
            route.distance_meters.round() as i64,
            route.duration_seconds.round() as i64,
        )
    }

    /// Fixed sample used to check the database wiring end to end.
    pub fn debug_sample() -> Self {
        Self::new(
            Coordinate::new(43.6532, -79.3832),
            Destination::new("Debug Destination", Coordinate::new(43.7001, -79.4163)),
            12000,
            900,
        )
    }
}
