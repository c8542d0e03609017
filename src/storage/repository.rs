use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sqlx::{Row, SqlitePool};

use crate::domain::{Booking, DailyItinerary, Expense};

use super::MIGRATION_001_INITIAL;

/// Storage key holding the itinerary document.
pub const ITINERARY_KEY: &str = "busango_itinerary";

/// Storage key holding the expense ledger document.
pub const EXPENSES_KEY: &str = "busango_expenses";

/// Storage key holding the bookings document.
pub const BOOKINGS_KEY: &str = "busango_bookings";

/// Version written into every stored document. Documents carrying any other
/// version are not trusted and are treated as absent.
pub const DOCUMENT_VERSION: u32 = 1;

#[derive(Serialize)]
struct DocumentRef<'a, T> {
    version: u32,
    data: &'a T,
}

#[derive(Deserialize)]
struct RawDocument {
    version: u32,
    data: serde_json::Value,
}

/// A raw stored value with its last write time.
#[derive(Debug, Clone)]
pub struct StoredEntry {
    pub key: String,
    pub value: String,
    pub updated_at: DateTime<Utc>,
}

/// Key/value store for trip documents, backed by SQLite.
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    /// Create a new repository with the given SQLite connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connect to a SQLite database at the given URL.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = SqlitePool::connect(database_url)
            .await
            .context("Failed to connect to database")?;
        Ok(Self::new(pool))
    }

    /// Run database migrations.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::query(MIGRATION_001_INITIAL)
            .execute(&self.pool)
            .await
            .context("Failed to run migration 001")?;
        Ok(())
    }

    /// Initialize a new database (connect + migrate).
    pub async fn init(database_url: &str) -> Result<Self> {
        let repo = Self::connect(database_url).await?;
        repo.migrate().await?;
        Ok(repo)
    }

    // ========================
    // Raw key/value access
    // ========================

    pub async fn get_raw(&self, key: &str) -> Result<Option<StoredEntry>> {
        let row = sqlx::query("SELECT key, value, updated_at FROM storage WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .with_context(|| format!("Failed to read key {}", key))?;

        row.map(|row| Self::row_to_entry(&row)).transpose()
    }

    /// Insert or replace the value stored under `key`.
    pub async fn put_raw(&self, key: &str, value: &str) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO storage (key, value, updated_at)
            VALUES (?, ?, ?)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await
        .with_context(|| format!("Failed to write key {}", key))?;
        Ok(())
    }

    fn row_to_entry(row: &sqlx::sqlite::SqliteRow) -> Result<StoredEntry> {
        let updated_at_str: String = row.get("updated_at");
        Ok(StoredEntry {
            key: row.get("key"),
            value: row.get("value"),
            updated_at: DateTime::parse_from_rfc3339(&updated_at_str)
                .context("Invalid updated_at timestamp")?
                .with_timezone(&Utc),
        })
    }

    // ========================
    // Versioned documents
    // ========================

    /// Load the document under `key`.
    ///
    /// Returns `Ok(None)` when nothing is stored, and also when the stored value
    /// is corrupt or carries an unknown version: bad state is reported and then
    /// ignored so the caller falls back to defaults. Only database failures are
    /// returned as errors.
    pub async fn load_document<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let Some(entry) = self.get_raw(key).await? else {
            return Ok(None);
        };

        let raw: RawDocument = match serde_json::from_str(&entry.value) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(key, error = %e, "Stored document is corrupt, ignoring it");
                return Ok(None);
            }
        };

        if raw.version != DOCUMENT_VERSION {
            tracing::warn!(
                key,
                version = raw.version,
                expected = DOCUMENT_VERSION,
                "Stored document has an unsupported version, ignoring it"
            );
            return Ok(None);
        }

        match serde_json::from_value(raw.data) {
            Ok(data) => Ok(Some(data)),
            Err(e) => {
                tracing::warn!(key, error = %e, "Stored document does not match the expected shape, ignoring it");
                Ok(None)
            }
        }
    }

    /// Store `data` under `key` as a versioned document.
    pub async fn save_document<T: Serialize>(&self, key: &str, data: &T) -> Result<()> {
        let document = DocumentRef {
            version: DOCUMENT_VERSION,
            data,
        };
        let json = serde_json::to_string(&document)
            .with_context(|| format!("Failed to serialize document {}", key))?;
        self.put_raw(key, &json).await?;
        tracing::debug!(key, bytes = json.len(), "Saved document");
        Ok(())
    }

    // ========================
    // Typed documents
    // ========================

    pub async fn load_expenses(&self) -> Result<Option<Vec<Expense>>> {
        self.load_document(EXPENSES_KEY).await
    }

    pub async fn save_expenses(&self, expenses: &[Expense]) -> Result<()> {
        self.save_document(EXPENSES_KEY, &expenses).await
    }

    pub async fn load_itinerary(&self) -> Result<Option<Vec<DailyItinerary>>> {
        self.load_document(ITINERARY_KEY).await
    }

    pub async fn save_itinerary(&self, days: &[DailyItinerary]) -> Result<()> {
        self.save_document(ITINERARY_KEY, &days).await
    }

    pub async fn load_bookings(&self) -> Result<Option<Vec<Booking>>> {
        self.load_document(BOOKINGS_KEY).await
    }

    pub async fn save_bookings(&self, bookings: &[Booking]) -> Result<()> {
        self.save_document(BOOKINGS_KEY, &bookings).await
    }
}
