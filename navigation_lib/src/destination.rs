use serde::{Deserialize, Serialize};

use crate::{coordinate::Coordinate, error::ValidationIssue};

/// A resolved place. Never mutated after geocoding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Destination {
    pub place_name: String,
    pub coords: Coordinate,
}

impl Destination {
    pub fn new(place_name: impl Into<String>, coords: Coordinate) -> Self {
        Self {
            place_name: place_name.into(),
            coords,
        }
    }

    pub fn issues(&self, path: &[&str]) -> Vec<ValidationIssue> {
        let mut coords_path = path.to_vec();
        coords_path.push("coords");
        self.coords.issues(&coords_path)
    }
}
