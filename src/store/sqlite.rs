//! SQLite record store over a sqlx connection pool.

use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use tracing::info;

use super::RecordStore;
use crate::error::StoreError;
use crate::models::{Record, RecordFields, RecordId};

const RECORDS_SCHEMA: &str = "CREATE TABLE IF NOT EXISTS records (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    first_name TEXT NOT NULL,
    last_name TEXT NOT NULL,
    company_name TEXT NOT NULL,
    address TEXT NOT NULL,
    city TEXT NOT NULL,
    county TEXT NOT NULL,
    postal TEXT NOT NULL,
    phone TEXT NOT NULL,
    email TEXT NOT NULL,
    web TEXT NOT NULL
)";

const SELECT_COLUMNS: &str = "SELECT id, first_name, last_name, company_name, address, city, \
     county, postal, phone, email, web FROM records";

type RecordRow = (
    i64,
    String,
    String,
    String,
    String,
    String,
    String,
    String,
    String,
    String,
    String,
);

fn row_to_record(row: RecordRow) -> Record {
    let (id, first_name, last_name, company_name, address, city, county, postal, phone, email, web) =
        row;
    Record::new(
        id,
        RecordFields {
            first_name,
            last_name,
            company_name,
            address,
            city,
            county,
            postal,
            phone,
            email,
            web,
        },
    )
}

/// SQLite-backed [`RecordStore`].
pub struct SqlRecordStore {
    pool: Pool<Sqlite>,
}

impl SqlRecordStore {
    /// Opens (creating if needed) the database at `url` and ensures the
    /// `records` table exists.
    ///
    /// `sqlite::memory:` works for tests; each pooled connection would get its
    /// own empty database, so such URLs are pinned to a single connection.
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self, StoreError> {
        let in_memory = url.contains(":memory:") || url.contains("mode=memory");
        let opts = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .journal_mode(if in_memory {
                SqliteJournalMode::Memory
            } else {
                SqliteJournalMode::Wal
            })
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .max_connections(if in_memory { 1 } else { max_connections.max(1) })
            .idle_timeout(None::<Duration>)
            .max_lifetime(None::<Duration>)
            .connect_with(opts)
            .await?;

        let store = Self { pool };
        store.ensure_schema().await?;
        info!(url, "record store ready");
        Ok(store)
    }

    async fn ensure_schema(&self) -> Result<(), StoreError> {
        sqlx::query(RECORDS_SCHEMA).execute(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl RecordStore for SqlRecordStore {
    async fn create(&self, fields: &RecordFields) -> Result<Record, StoreError> {
        let result = sqlx::query(
            "INSERT INTO records (first_name, last_name, company_name, address, city, county, \
             postal, phone, email, web) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&fields.first_name)
        .bind(&fields.last_name)
        .bind(&fields.company_name)
        .bind(&fields.address)
        .bind(&fields.city)
        .bind(&fields.county)
        .bind(&fields.postal)
        .bind(&fields.phone)
        .bind(&fields.email)
        .bind(&fields.web)
        .execute(&self.pool)
        .await?;

        Ok(Record::new(result.last_insert_rowid(), fields.clone()))
    }

    async fn get(&self, id: RecordId) -> Result<Option<Record>, StoreError> {
        let row: Option<RecordRow> = sqlx::query_as(&format!("{SELECT_COLUMNS} WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(row_to_record))
    }

    async fn update(
        &self,
        id: RecordId,
        fields: &RecordFields,
    ) -> Result<Option<Record>, StoreError> {
        let result = sqlx::query(
            "UPDATE records SET first_name = ?, last_name = ?, company_name = ?, address = ?, \
             city = ?, county = ?, postal = ?, phone = ?, email = ?, web = ? WHERE id = ?",
        )
        .bind(&fields.first_name)
        .bind(&fields.last_name)
        .bind(&fields.company_name)
        .bind(&fields.address)
        .bind(&fields.city)
        .bind(&fields.county)
        .bind(&fields.postal)
        .bind(&fields.phone)
        .bind(&fields.email)
        .bind(&fields.web)
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        Ok(Some(Record::new(id, fields.clone())))
    }

    async fn delete(&self, id: RecordId) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM records WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list(&self) -> Result<Vec<Record>, StoreError> {
        let rows: Vec<RecordRow> = sqlx::query_as(&format!("{SELECT_COLUMNS} ORDER BY id"))
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(row_to_record).collect())
    }
}
