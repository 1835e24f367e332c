use std::str::FromStr;

use chrono::{DateTime, Utc};
use const_format::concatcp;
use navigation_lib::{coordinate::Coordinate, destination::Destination, history::HistoryEntry, trip_log::TripLog};
use sqlx::{query, query_as, sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow}, Executor, Pool, Row, Sqlite};

use crate::DataManagerError;

use super::constants::*;

const FALLBACK_ADDRESS: &str = "Previous destination";

#[derive(Debug, Clone, PartialEq)]
pub struct TripLogRecord {
    pub id: String,
    pub log: TripLog,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct NavigationDatabase {
    pool: Pool<Sqlite>,
}

impl NavigationDatabase {
    pub async fn connect(database_url: &str) -> Result<Self, DataManagerError> {
        let options = SqliteConnectOptions::from_str(database_url)
            .map_err(|err| DataManagerError::Database(format!("Invalid database url {database_url}: {err}")))?
            .create_if_missing(true);

        // Every connection to an in-memory database is its own database, so keep exactly one alive.
        let in_memory = database_url.contains(":memory:");
        let pool = SqlitePoolOptions::new()
            .max_connections(if in_memory { 1 } else { 5 })
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options).await
            .map_err(|err| DataManagerError::Database(format!("Failed to connect to database: {err}")))?;

        let db = Self {
            pool
        };

        db.init().await?;

        Ok(db)
    }

    pub async fn init(&self) -> Result<(), DataManagerError> {
        self.pool.execute(concatcp!("
            CREATE TABLE IF NOT EXISTS ", ADDRESS_HISTORY_TABLE_NAME, "(",
                ID,          " TEXT PRIMARY KEY,",
                ADDRESS,     " TEXT NOT NULL,",
                DESTINATION, " TEXT NOT NULL,",
                CREATED_AT,  " TIMESTAMP NOT NULL);

            CREATE TABLE IF NOT EXISTS ", TRIP_LOGS_TABLE_NAME, "(",
                ID,               " TEXT PRIMARY KEY,",
                ORIGIN,           " TEXT NOT NULL,",
                DESTINATION,      " TEXT NOT NULL,",
                DISTANCE_METERS,  " INTEGER NOT NULL,",
                DURATION_SECONDS, " INTEGER NOT NULL,",
                CREATED_AT,       " TIMESTAMP NOT NULL
            )")).await
            .map_err(|err| DataManagerError::Database(format!("Failed to create tables: {err}")))
            .map(|_| ())
    }

    pub async fn insert_history_entry(&self, address: &str, destination: &Destination, created_at: DateTime<Utc>) -> Result<HistoryEntry, DataManagerError> {
        let id = uuid::Uuid::new_v4().to_string();

        query(concatcp!("
            INSERT INTO ", ADDRESS_HISTORY_TABLE_NAME, "(",
            ID, ", ", ADDRESS, ", ", DESTINATION, ", ", CREATED_AT, ")
            VALUES (?1, ?2, ?3, ?4)"))
                .bind(&id)
                .bind(address)
                .bind(to_json(destination)?)
                .bind(created_at)
                .execute(&self.pool).await
                .map_err(|err| DataManagerError::Database(format!("Failed to insert history entry: {err}")))?;

        Ok(HistoryEntry::new(id, address.to_string(), destination.clone(), created_at))
    }

    /// Newest first. Rows written within the same instant keep insertion order reversed.
    pub async fn get_history(&self, limit: u32) -> Result<Vec<HistoryEntry>, DataManagerError> {
        query_as::<_, HistoryEntry>(concatcp!(
            "SELECT ", ID, ", ", ADDRESS, ", ", DESTINATION, ", ", CREATED_AT,
            " FROM ", ADDRESS_HISTORY_TABLE_NAME,
            " ORDER BY ", CREATED_AT, " DESC, rowid DESC LIMIT ?1"))
            .bind(i64::from(limit))
            .fetch_all(&self.pool).await
            .map_err(|err| DataManagerError::Database(format!("Failed to get history: {err}")))
    }

    /// Recent trip destinations dressed up as history entries.
    pub async fn get_trip_log_history(&self, limit: u32) -> Result<Vec<HistoryEntry>, DataManagerError> {
        query(concatcp!(
            "SELECT ", ID, ", ", DESTINATION, ", ", CREATED_AT,
            " FROM ", TRIP_LOGS_TABLE_NAME,
            " ORDER BY ", CREATED_AT, " DESC, rowid DESC LIMIT ?1"))
            .bind(i64::from(limit))
            .fetch_all(&self.pool).await
            .map_err(|err| DataManagerError::Database(format!("Failed to get trip logs: {err}")))?
            .iter()
            .map(|row| -> Result<HistoryEntry, DataManagerError> {
                let destination: Destination = from_json(row, DESTINATION)?;
                let address = if destination.place_name.trim().is_empty() {
                    FALLBACK_ADDRESS.to_string()
                } else {
                    destination.place_name.clone()
                };

                Ok(HistoryEntry::new(get(row, ID)?, address, destination, get(row, CREATED_AT)?))
            })
            .collect()
    }

    pub async fn clear_history(&self) -> Result<u64, DataManagerError> {
        query(concatcp!("DELETE FROM ", ADDRESS_HISTORY_TABLE_NAME))
            .execute(&self.pool).await
            .map_err(|err| DataManagerError::Database(format!("Failed to clear history: {err}")))
            .map(|result| result.rows_affected())
    }

    pub async fn insert_trip_log(&self, log: &TripLog, created_at: DateTime<Utc>) -> Result<String, DataManagerError> {
        let id = uuid::Uuid::new_v4().to_string();

        query(concatcp!("
            INSERT INTO ", TRIP_LOGS_TABLE_NAME, "(",
            ID, ", ", ORIGIN, ", ", DESTINATION, ", ", DISTANCE_METERS, ", ", DURATION_SECONDS, ", ", CREATED_AT, ")
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)"))
                .bind(&id)
                .bind(to_json(&log.origin)?)
                .bind(to_json(&log.destination)?)
                .bind(log.distance_meters)
                .bind(log.duration_seconds)
                .bind(created_at)
                .execute(&self.pool).await
                .map_err(|err| DataManagerError::Database(format!("Failed to insert trip log: {err}")))?;

        Ok(id)
    }

    pub async fn get_trip_logs(&self, limit: u32) -> Result<Vec<TripLogRecord>, DataManagerError> {
        query(concatcp!("SELECT * FROM ", TRIP_LOGS_TABLE_NAME, " ORDER BY ", CREATED_AT, " DESC, rowid DESC LIMIT ?1"))
            .bind(i64::from(limit))
            .fetch_all(&self.pool).await
            .map_err(|err| DataManagerError::Database(format!("Failed to get trip logs: {err}")))?
            .iter()
            .map(|row| -> Result<TripLogRecord, DataManagerError> {
                let origin: Coordinate = from_json(row, ORIGIN)?;
                let destination: Destination = from_json(row, DESTINATION)?;

                Ok(TripLogRecord {
                    id: get(row, ID)?,
                    log: TripLog::new(origin, destination, get(row, DISTANCE_METERS)?, get(row, DURATION_SECONDS)?),
                    created_at: get(row, CREATED_AT)?,
                })
            })
            .collect()
    }
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, DataManagerError> {
    serde_json::to_string(value).map_err(|err| DataManagerError::Database(format!("Failed to encode column: {err}")))
}

fn from_json<T: serde::de::DeserializeOwned>(row: &SqliteRow, column: &str) -> Result<T, DataManagerError> {
    let text: String = get(row, column)?;
    serde_json::from_str(&text).map_err(|err| DataManagerError::Database(format!("Failed to decode {column}: {err}")))
}

fn get<'r, T>(row: &'r SqliteRow, column: &str) -> Result<T, DataManagerError>
where
    T: sqlx::Decode<'r, Sqlite> + sqlx::Type<Sqlite>,
{
    row.try_get(column).map_err(|err| DataManagerError::Database(format!("Failed to read {column}: {err}")))
}

#[cfg(test)]
mod tests {
    use chrono::TimeDelta;

    use super::*;

    fn destination(name: &str) -> Destination {
        Destination::new(name, Coordinate::new(43.65, -79.38))
    }

    async fn memory_db() -> NavigationDatabase {
        NavigationDatabase::connect("sqlite::memory:").await.unwrap()
    }

    #[tokio::test]
    async fn history_is_newest_first() {
        let db = memory_db().await;
        let t1 = Utc::now();
        let t2 = t1 + TimeDelta::seconds(1);
        let t3 = t2 + TimeDelta::seconds(1);

        // Inserted out of order on purpose.
        db.insert_history_entry("second", &destination("B"), t2).await.unwrap();
        db.insert_history_entry("third", &destination("C"), t3).await.unwrap();
        db.insert_history_entry("first", &destination("A"), t1).await.unwrap();

        let addresses: Vec<String> = db.get_history(10).await.unwrap().into_iter().map(|entry| entry.address).collect();
        assert_eq!(addresses, vec!["third", "second", "first"]);
    }

    #[tokio::test]
    async fn history_respects_limit() {
        let db = memory_db().await;
        for i in 0..5 {
            db.insert_history_entry(&format!("stop {i}"), &destination("X"), Utc::now()).await.unwrap();
        }

        assert_eq!(db.get_history(3).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn clear_reports_removed_rows() {
        let db = memory_db().await;
        db.insert_history_entry("a", &destination("A"), Utc::now()).await.unwrap();
        db.insert_history_entry("b", &destination("B"), Utc::now()).await.unwrap();

        assert_eq!(db.clear_history().await.unwrap(), 2);
        assert_eq!(db.clear_history().await.unwrap(), 0);
        assert!(db.get_history(10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn trip_logs_round_trip_and_feed_history_fallback() {
        let db = memory_db().await;
        let log = TripLog::new(Coordinate::new(43.65, -79.38), destination(""), 1200, 300);
        let id = db.insert_trip_log(&log, Utc::now()).await.unwrap();

        let records = db.get_trip_logs(5).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, id);
        assert_eq!(records[0].log, log);

        let fallback = db.get_trip_log_history(5).await.unwrap();
        assert_eq!(fallback[0].address, FALLBACK_ADDRESS);
        assert_eq!(fallback[0].id, id);
    }
}
