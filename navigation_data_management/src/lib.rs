use navigation_lib::error::NavError;
use thiserror::Error;

pub mod database;
mod data_manager;

pub use data_manager::*;

#[derive(Debug, Error)]
pub enum DataManagerError {
    #[error("database error: {0}")]
    Database(String),
}

impl From<DataManagerError> for NavError {
    fn from(value: DataManagerError) -> Self {
        NavError::Unavailable(value.to_string())
    }
}
