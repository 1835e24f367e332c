use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
#[cfg(feature = "sqlx")]
use sqlx::{prelude::*, sqlite::SqliteRow};

use crate::destination::Destination;

pub const DEFAULT_HISTORY_LIMIT: u32 = 8;
pub const MAX_HISTORY_LIMIT: u32 = 25;

/// A recently used destination. Entries are only ever appended, or wiped all at once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub id: String,
    pub address: String,
    pub destination: Destination,
    #[serde(alias = "created_at")]
    pub created_at: DateTime<Utc>,
}

impl HistoryEntry {
    pub fn new(id: String, address: String, destination: Destination, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            address,
            destination,
            created_at,
        }
    }

    /// What a list should show for this entry.
    pub fn label(&self) -> &str {
        if self.address.trim().is_empty() {
            &self.destination.place_name
        } else {
            &self.address
        }
    }
}

// The destination column holds JSON text.
#[cfg(feature = "sqlx")]
impl FromRow<'_, SqliteRow> for HistoryEntry {
    fn from_row(row: &SqliteRow) -> sqlx::Result<Self> {
        let destination: String = row.try_get("destination")?;
        let destination = serde_json::from_str::<Destination>(&destination).map_err(|err| sqlx::Error::ColumnDecode {
            index: "destination".into(),
            source: Box::new(err),
        })?;

        Ok(Self {
            id: row.try_get("id")?,
            address: row.try_get("address")?,
            destination,
            created_at: row.try_get("created_at")?,
        })
    }
}
