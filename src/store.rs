//! Append-only record store backed by SQLite
//!
//! Records are written exactly once per successful fetch and never updated
//! or deleted. Each insert is a single atomic statement, so concurrent
//! requests cannot corrupt the log. Reads are ordered newest-first.

use std::str::FromStr;

use anyhow::{Context, Result};
use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use tracing::{debug, info};

use crate::models::{NewRecord, PollutionRecord};

const SCHEMA: &str = "\
CREATE TABLE IF NOT EXISTS pollution_records (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    location TEXT NOT NULL,
    latitude REAL NOT NULL,
    longitude REAL NOT NULL,
    aqi INTEGER NOT NULL,
    pm25 REAL,
    pm10 REAL,
    no2 REAL,
    co REAL,
    o3 REAL,
    so2 REAL,
    category TEXT NOT NULL,
    location_source TEXT NOT NULL DEFAULT 'Unknown',
    accuracy REAL,
    timestamp TEXT NOT NULL
)";

/// Durable store of [`PollutionRecord`]s
#[derive(Clone)]
pub struct RecordStore {
    pool: SqlitePool,
}

impl RecordStore {
    /// Open (creating if necessary) the database at `database_url` and
    /// ensure the schema exists.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)
            .with_context(|| format!("Invalid database URL: {database_url}"))?
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .with_context(|| "Failed to open record database")?;

        let store = Self { pool };
        store.init_schema().await?;
        info!(database_url, "record store ready");
        Ok(store)
    }

    /// In-memory store for tests.
    ///
    /// Capped to a single connection: each SQLite `:memory:` connection is
    /// its own database, so a larger pool would scatter the records.
    pub async fn in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .with_context(|| "Invalid in-memory database URL")?;

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .with_context(|| "Failed to open in-memory database")?;

        let store = Self { pool };
        store.init_schema().await?;
        Ok(store)
    }

    async fn init_schema(&self) -> Result<()> {
        sqlx::query(SCHEMA)
            .execute(&self.pool)
            .await
            .with_context(|| "Failed to create pollution_records table")?;
        Ok(())
    }

    /// Append one record, returning its assigned identity.
    pub async fn insert(&self, record: &NewRecord) -> Result<i64> {
        let result = sqlx::query(
            "INSERT INTO pollution_records \
             (location, latitude, longitude, aqi, pm25, pm10, no2, co, o3, so2, \
              category, location_source, accuracy, timestamp) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&record.location)
        .bind(record.latitude)
        .bind(record.longitude)
        .bind(record.aqi)
        .bind(record.pm25)
        .bind(record.pm10)
        .bind(record.no2)
        .bind(record.co)
        .bind(record.o3)
        .bind(record.so2)
        .bind(&record.category)
        .bind(&record.location_source)
        .bind(record.accuracy)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .with_context(|| "Failed to insert pollution record")?;

        let id = result.last_insert_rowid();
        debug!(id, location = %record.location, "record persisted");
        Ok(id)
    }

    /// The `limit` most recent records, newest first.
    ///
    /// Ties on timestamp (second granularity) are broken by identity so the
    /// ordering stays stable across repeated reads.
    pub async fn recent(&self, limit: i64) -> Result<Vec<PollutionRecord>> {
        let records = sqlx::query_as::<_, PollutionRecord>(
            "SELECT * FROM pollution_records ORDER BY timestamp DESC, id DESC LIMIT ?",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .with_context(|| "Failed to query recent records")?;

        Ok(records)
    }

    /// Every record, newest first.
    pub async fn all(&self) -> Result<Vec<PollutionRecord>> {
        let records = sqlx::query_as::<_, PollutionRecord>(
            "SELECT * FROM pollution_records ORDER BY timestamp DESC, id DESC",
        )
        .fetch_all(&self.pool)
        .await
        .with_context(|| "Failed to query records")?;

        Ok(records)
    }
}
