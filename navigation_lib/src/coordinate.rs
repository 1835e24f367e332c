use geo_types::Point;
use serde::{Deserialize, Serialize};

use crate::error::ValidationIssue;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Mapping providers speak `[longitude, latitude]`.
    pub fn from_lon_lat(pair: [f64; 2]) -> Self {
        Self::new(pair[1], pair[0])
    }

    pub fn to_lon_lat(self) -> [f64; 2] {
        [self.longitude, self.latitude]
    }

    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }

    /// Range check, reporting each bad axis under `path`.
    pub fn issues(&self, path: &[&str]) -> Vec<ValidationIssue> {
        let mut issues = Vec::new();

        if !self.latitude.is_finite() || !(-90.0..=90.0).contains(&self.latitude) {
            let mut field = path.to_vec();
            field.push("latitude");
            issues.push(ValidationIssue::new(&field, "Latitude must be between -90 and 90"));
        }
        if !self.longitude.is_finite() || !(-180.0..=180.0).contains(&self.longitude) {
            let mut field = path.to_vec();
            field.push("longitude");
            issues.push(ValidationIssue::new(&field, "Longitude must be between -180 and 180"));
        }

        issues
    }
}

impl From<Coordinate> for Point {
    fn from(value: Coordinate) -> Self {
        Point::new(value.longitude, value.latitude)
    }
}

impl From<Point> for Coordinate {
    fn from(value: Point) -> Self {
        Coordinate::new(value.y(), value.x())
    }
}

/// Serde adapter for polylines, which travel as `[[lon, lat], ...]`.
pub mod lon_lat_polyline {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    use super::Coordinate;

    pub fn serialize<S>(polyline: &[Coordinate], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let pairs: Vec<[f64; 2]> = polyline.iter().map(|coord| coord.to_lon_lat()).collect();
        pairs.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<Coordinate>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let pairs = Vec::<[f64; 2]>::deserialize(deserializer)?;
        Ok(pairs.into_iter().map(Coordinate::from_lon_lat).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_bounds_are_inclusive() {
        assert!(Coordinate::new(90.0, 180.0).is_valid());
        assert!(Coordinate::new(-90.0, -180.0).is_valid());
        assert!(!Coordinate::new(90.5, 0.0).is_valid());
        assert!(!Coordinate::new(0.0, -180.01).is_valid());
        assert!(!Coordinate::new(f64::NAN, 0.0).is_valid());
    }

    #[test]
    fn issues_name_the_bad_axis() {
        let issues = Coordinate::new(100.0, 10.0).issues(&["origin"]);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].path, vec!["origin".to_string(), "latitude".to_string()]);
    }

    #[test]
    fn point_uses_x_for_longitude() {
        let point: Point = Coordinate::new(43.65, -79.38).into();
        assert_eq!(point.x(), -79.38);
        assert_eq!(point.y(), 43.65);
        assert_eq!(Coordinate::from(point), Coordinate::new(43.65, -79.38));
    }
}
