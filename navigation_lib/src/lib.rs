pub mod api;
pub mod coordinate;
pub mod destination;
pub mod error;
pub mod gateway;
pub mod history;
pub mod planner;
pub mod route;
pub mod trip_log;
