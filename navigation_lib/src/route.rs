use chrono::{DateTime, TimeDelta, Utc};
use geo_types::LineString;
use serde::{Deserialize, Serialize};

use crate::{
    coordinate::{lon_lat_polyline, Coordinate},
    destination::Destination,
    error::NavError,
};

/// What a directions call yields: a route without its destination attached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteMetrics {
    pub distance_meters: f64,
    pub duration_seconds: f64,
    pub polyline: Vec<Coordinate>,
}

impl RouteMetrics {
    pub fn new(distance_meters: f64, duration_seconds: f64, polyline: Vec<Coordinate>) -> Self {
        Self {
            distance_meters,
            duration_seconds,
            polyline,
        }
    }

    /// From provider geometry, where `x` is longitude.
    pub fn from_line_string(distance_meters: f64, duration_seconds: f64, line: LineString) -> Self {
        Self::new(distance_meters, duration_seconds, line.points().map(Coordinate::from).collect())
    }
}

/// A complete route answer. Each refresh replaces the previous one wholesale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteResult {
    pub destination: Destination,
    #[serde(rename = "distance")]
    pub distance_meters: f64,
    #[serde(rename = "duration")]
    pub duration_seconds: f64,
    pub eta: DateTime<Utc>,
    #[serde(with = "lon_lat_polyline")]
    pub polyline: Vec<Coordinate>,
}

impl RouteResult {
    /// Attaches the destination and stamps `eta = now + duration`.
    ///
    /// Rejects metrics that cannot describe a drivable route: negative or
    /// non-finite figures, or an empty geometry.
    pub fn from_metrics(destination: Destination, metrics: RouteMetrics, now: DateTime<Utc>) -> Result<Self, NavError> {
        let RouteMetrics {
            distance_meters,
            duration_seconds,
            polyline,
        } = metrics;

        if !distance_meters.is_finite() || distance_meters < 0.0 || !duration_seconds.is_finite() || duration_seconds < 0.0 {
            return Err(NavError::Unexpected(format!(
                "Provider returned invalid route metrics: distance={distance_meters}, duration={duration_seconds}"
            )));
        }
        if polyline.is_empty() {
            return Err(NavError::NoRoute("Route returned without geometry.".into()));
        }

        let eta = TimeDelta::try_milliseconds((duration_seconds * 1000.0).round() as i64)
            .and_then(|duration| now.checked_add_signed(duration))
            .ok_or_else(|| NavError::Unexpected(format!(
                "Provider returned invalid route metrics: duration={duration_seconds} overflows the ETA"
            )))?;

        Ok(Self {
            destination,
            distance_meters,
            duration_seconds,
            eta,
            polyline,
        })
    }

    /// Arrival is judged on the provider-reported remaining distance, not on
    /// geometric displacement to the destination.
    pub fn is_within(&self, threshold_meters: f64) -> bool {
        self.distance_meters <= threshold_meters
    }
}
