use async_trait::async_trait;
use chrono::Utc;
use navigation_lib::{destination::Destination, error::NavError, gateway::HistoryStore, history::HistoryEntry, trip_log::TripLog};

use crate::{database::db::{NavigationDatabase, TripLogRecord}, DataManagerError};

/// The public interface for all navigation data management.
///
/// Without a database the manager runs degraded: reads come back empty and
/// writes are skipped. Side-effect writes never fail their caller.
#[derive(Clone)]
pub struct DataManager {
    pub(crate) database: Option<NavigationDatabase>,
}

impl DataManager {
    pub async fn start(database_url: Option<&str>) -> Result<Self, DataManagerError> {
        let Some(database_url) = database_url.filter(|url| !url.trim().is_empty()) else {
            tracing::warn!("DATABASE_URL is not set; address history and trip logs will be skipped");
            return Ok(Self::disconnected());
        };

        tracing::info!("Connecting to database at {database_url}");
        let database = NavigationDatabase::connect(database_url).await?;
        tracing::info!("Database connection established");

        Ok(Self::with_database(database))
    }

    pub fn with_database(database: NavigationDatabase) -> Self {
        DataManager {
            database: Some(database),
        }
    }

    pub fn disconnected() -> Self {
        DataManager {
            database: None,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.database.is_some()
    }

    /// Entries with a blank address are not recorded.
    pub async fn record_history(&self, address: &str, destination: &Destination) -> Option<HistoryEntry> {
        let database = self.database.as_ref()?;
        if address.trim().is_empty() {
            return None;
        }

        match database.insert_history_entry(address, destination, Utc::now()).await {
            Ok(entry) => {
                tracing::debug!("Recorded history entry {} for {}", entry.id, entry.address);
                Some(entry)
            },
            Err(err) => {
                tracing::error!("Failed to store address history entry: {err}");
                None
            },
        }
    }

    /// Falls back to recent trip logs while the history table is empty.
    pub async fn history(&self, limit: u32) -> Vec<HistoryEntry> {
        let Some(database) = &self.database else {
            return Vec::new();
        };

        let entries = match database.get_history(limit).await {
            Ok(entries) if !entries.is_empty() => return entries,
            Ok(_) => database.get_trip_log_history(limit).await,
            Err(err) => Err(err),
        };

        match entries {
            Ok(fallback) => {
                if !fallback.is_empty() {
                    tracing::debug!("Seeding history with {} entries from trip logs", fallback.len());
                }
                fallback
            },
            Err(err) => {
                tracing::error!("Failed to fetch address history: {err}");
                Vec::new()
            },
        }
    }

    pub async fn clear_history(&self) -> u64 {
        let Some(database) = &self.database else {
            return 0;
        };

        database.clear_history().await.unwrap_or_else(|err| {
            tracing::error!("Failed to clear address history: {err}");
            0
        })
    }

    pub async fn save_trip_log(&self, log: &TripLog) -> Option<String> {
        let Some(database) = &self.database else {
            tracing::warn!("Skipping trip log insert because the database is not connected");
            return None;
        };

        tracing::debug!("Inserting trip log with distance {} and duration {}", log.distance_meters, log.duration_seconds);
        database.insert_trip_log(log, Utc::now()).await
            .inspect_err(|err| tracing::error!("Failed to store trip log: {err}"))
            .ok()
    }

    /// Unlike `save_trip_log`, failures reach the caller.
    pub async fn log_debug_trip(&self) -> Result<Option<String>, DataManagerError> {
        let Some(database) = &self.database else {
            tracing::warn!("Skipping debug trip insert because the database is not connected");
            return Ok(None);
        };

        database.insert_trip_log(&TripLog::debug_sample(), Utc::now()).await.map(Some)
    }

    pub async fn trip_logs(&self, limit: u32) -> Result<Vec<TripLogRecord>, DataManagerError> {
        match &self.database {
            Some(database) => database.get_trip_logs(limit).await,
            None => Ok(Vec::new()),
        }
    }
}

#[async_trait]
impl HistoryStore for DataManager {
    async fn append(&self, address: &str, destination: &Destination) -> Result<Option<HistoryEntry>, NavError> {
        Ok(self.record_history(address, destination).await)
    }

    async fn list(&self, limit: u32) -> Result<Vec<HistoryEntry>, NavError> {
        Ok(self.history(limit).await)
    }

    async fn clear(&self) -> Result<u64, NavError> {
        Ok(self.clear_history().await)
    }
}
