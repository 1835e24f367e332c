//! Request and response bodies of the navigation HTTP surface, and the
//! validation that turns raw requests into typed ones.

use serde::{Deserialize, Serialize};

use crate::{
    coordinate::Coordinate,
    destination::Destination,
    error::{NavError, ValidationIssue},
    history::{HistoryEntry, DEFAULT_HISTORY_LIMIT, MAX_HISTORY_LIMIT},
};

pub const MIN_ADDRESS_LENGTH: usize = 3;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteRequest {
    pub origin: Option<Coordinate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination: Option<Destination>,
}

/// Where a route should lead.
#[derive(Debug, Clone, PartialEq)]
pub enum RouteTarget {
    ByAddress(String),
    ByCoordinates(Destination),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValidRouteRequest {
    pub origin: Coordinate,
    pub target: RouteTarget,
    /// Text recorded in the address history for this request.
    pub history_address: String,
}

impl RouteRequest {
    pub fn by_coordinates(origin: Coordinate, destination: Destination) -> Self {
        Self {
            origin: Some(origin),
            destination_address: None,
            destination: Some(destination),
        }
    }

    pub fn validate(self) -> Result<ValidRouteRequest, NavError> {
        let mut issues = Vec::new();

        match &self.origin {
            Some(origin) => issues.extend(origin.issues(&["origin"])),
            None => issues.push(ValidationIssue::new(&["origin"], "Required")),
        }
        if let Some(address) = &self.destination_address {
            if address.chars().count() < MIN_ADDRESS_LENGTH {
                issues.push(min_length_issue("destinationAddress"));
            }
        }
        if let Some(destination) = &self.destination {
            issues.extend(destination.issues(&["destination"]));
        }
        if self.destination_address.is_none() && self.destination.is_none() {
            issues.push(ValidationIssue::new(&["destination"], "destinationAddress or destination is required"));
        }

        if !issues.is_empty() {
            return Err(NavError::from_issues(issues));
        }

        let origin = self
            .origin
            .ok_or_else(|| NavError::invalid_input(&["origin"], "Required"))?;

        // A resolved destination wins over an address; no geocoding needed.
        let (target, history_address) = match (self.destination, self.destination_address) {
            (Some(destination), address) => {
                let history_address = address.unwrap_or_else(|| destination.place_name.clone());
                (RouteTarget::ByCoordinates(destination), history_address)
            }
            (None, Some(address)) => (RouteTarget::ByAddress(address.clone()), address),
            (None, None) => {
                return Err(NavError::invalid_input(&["destination"], "destinationAddress or destination is required"))
            }
        };

        Ok(ValidRouteRequest {
            origin,
            target,
            history_address,
        })
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeocodeQuery {
    pub address: Option<String>,
}

impl GeocodeQuery {
    pub fn validate(self) -> Result<String, NavError> {
        match self.address {
            Some(address) if address.chars().count() >= MIN_ADDRESS_LENGTH => Ok(address),
            Some(_) => Err(NavError::from_issues(vec![min_length_issue("address")])),
            None => Err(NavError::invalid_input(&["address"], "Required")),
        }
    }
}

/// `limit` stays textual until validated so that junk yields a 422, not a rejection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<String>,
}

impl HistoryQuery {
    pub fn validate(self) -> Result<u32, NavError> {
        let Some(raw) = self.limit.filter(|raw| !raw.trim().is_empty()) else {
            return Ok(DEFAULT_HISTORY_LIMIT);
        };

        let limit = raw
            .trim()
            .parse::<u32>()
            .map_err(|_| NavError::invalid_input(&["limit"], "Expected a whole number"))?;

        if !(1..=MAX_HISTORY_LIMIT).contains(&limit) {
            return Err(NavError::invalid_input(
                &["limit"],
                format!("Number must be between 1 and {MAX_HISTORY_LIMIT}"),
            ));
        }

        Ok(limit)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppendHistoryRequest {
    pub address: Option<String>,
    pub destination: Option<Destination>,
}

impl AppendHistoryRequest {
    pub fn validate(self) -> Result<(String, Destination), NavError> {
        let mut issues = Vec::new();

        let address = self.address.unwrap_or_default();
        if address.trim().is_empty() {
            issues.push(ValidationIssue::new(&["address"], "Required"));
        }
        match &self.destination {
            Some(destination) => issues.extend(destination.issues(&["destination"])),
            None => issues.push(ValidationIssue::new(&["destination"], "Required")),
        }

        match self.destination {
            Some(destination) if issues.is_empty() => Ok((address, destination)),
            _ => Err(NavError::from_issues(issues)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryResponse {
    pub history: Vec<HistoryEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppendHistoryResponse {
    pub entry: Option<HistoryEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClearedResponse {
    pub cleared: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ErrorBody {
    /// Inverse of the server's error rendering.
    pub fn into_error(self) -> NavError {
        let issues = self
            .details
            .and_then(|details| serde_json::from_value::<Vec<ValidationIssue>>(details).ok())
            .unwrap_or_default();

        match self.code {
            Some(code) => NavError::from_code(&code, self.message, issues),
            None => NavError::Unexpected(self.message),
        }
    }
}

fn min_length_issue(field: &str) -> ValidationIssue {
    ValidationIssue::new(
        &[field],
        format!("String must contain at least {MIN_ADDRESS_LENGTH} character(s)"),
    )
}
