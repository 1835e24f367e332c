pub const ADDRESS_HISTORY_TABLE_NAME: &str = "address_history";
pub const ID: &str = "id";
pub const ADDRESS: &str = "address";
pub const DESTINATION: &str = "destination";
pub const CREATED_AT: &str = "created_at";

pub const TRIP_LOGS_TABLE_NAME: &str = "trip_logs";
// ID
pub const ORIGIN: &str = "origin";
// Destination
pub const DISTANCE_METERS: &str = "distance_meters";
pub const DURATION_SECONDS: &str = "duration_seconds";
// Created at
