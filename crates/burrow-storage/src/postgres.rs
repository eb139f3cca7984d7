use async_trait::async_trait;
use burrow_core::error::{Result, StorageError};
use burrow_core::{LinkId, LinkRecord, LinkStore, ReadLinkStore, ShortCode};
use sqlx::migrate::Migrator;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Row};
use tracing::{debug, trace};

/// Embedded schema migrations for the `links` table.
pub static MIGRATOR: Migrator = sqlx::migrate!();

/// PostgreSQL implementation of the link store contract.
///
/// Each method is a single statement. Id allocation reads `MAX(id) + 1` and is
/// not reserved, so two writers may compute the same id; the primary key and
/// the unique constraint on `short_url` reject the second insert with
/// [`StorageError::Conflict`]. There is no unique constraint on
/// `original_url`, so concurrent shortening of the same URL can store it twice.
#[derive(Debug, Clone)]
pub struct PostgresLinkStore {
    pool: PgPool,
}

impl PostgresLinkStore {
    /// Creates a store from an existing PostgreSQL connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Creates a store by opening a pool configured with `options`.
    pub async fn connect_with(options: PgPoolOptions, database_url: &str) -> Result<Self> {
        let pool = options
            .connect(database_url)
            .await
            .map_err(map_sqlx_error)?;
        Ok(Self::new(pool))
    }

    /// Applies pending schema migrations.
    pub async fn migrate(&self) -> Result<()> {
        MIGRATOR
            .run(&self.pool)
            .await
            .map_err(|e| StorageError::Query(format!("migration failed: {e}")))?;
        debug!("links schema is up to date");
        Ok(())
    }

    /// Closes every pooled connection.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

fn parse_id(raw: i64) -> Result<LinkId> {
    LinkId::from_i64(raw)
        .ok_or_else(|| StorageError::InvalidData(format!("invalid link id '{raw}'")))
}

fn parse_code(raw: String) -> Result<ShortCode> {
    ShortCode::new(raw).map_err(|e| StorageError::InvalidData(e.to_string()))
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .is_some_and(sqlx::error::DatabaseError::is_unique_violation)
}

fn map_sqlx_error(err: sqlx::Error) -> StorageError {
    let message = err.to_string();

    match err {
        sqlx::Error::PoolTimedOut => StorageError::Timeout(message),
        sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed
        | sqlx::Error::Io(_)
        | sqlx::Error::Tls(_) => StorageError::Unavailable(message),
        sqlx::Error::ColumnIndexOutOfBounds { .. }
        | sqlx::Error::ColumnNotFound(_)
        | sqlx::Error::ColumnDecode { .. }
        | sqlx::Error::TypeNotFound { .. }
        | sqlx::Error::Decode(_)
        | sqlx::Error::RowNotFound => StorageError::InvalidData(message),
        _ => StorageError::Query(message),
    }
}

#[async_trait]
impl ReadLinkStore for PostgresLinkStore {
    async fn lookup(&self, code: &ShortCode) -> Result<Option<String>> {
        let url = sqlx::query_scalar::<_, String>(
            r#"
            SELECT original_url
            FROM links
            WHERE short_url = $1
            "#,
        )
        .bind(code.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        trace!(code = %code, found = url.is_some(), "looked up short code");
        Ok(url)
    }
}

#[async_trait]
impl LinkStore for PostgresLinkStore {
    async fn next_id(&self) -> Result<LinkId> {
        let next = sqlx::query_scalar::<_, i64>("SELECT COALESCE(MAX(id), 0) + 1 FROM links")
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        parse_id(next)
    }

    async fn check_duplicate(&self, original_url: &str) -> Result<Option<LinkRecord>> {
        let row = sqlx::query(
            r#"
            SELECT id, short_url
            FROM links
            WHERE original_url = $1
            ORDER BY id
            LIMIT 1
            "#,
        )
        .bind(original_url)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        let Some(row) = row else {
            trace!(url = %original_url, "no duplicate found");
            return Ok(None);
        };

        let id: i64 = row.try_get("id").map_err(map_sqlx_error)?;
        let code: String = row.try_get("short_url").map_err(map_sqlx_error)?;

        Ok(Some(LinkRecord {
            id: parse_id(id)?,
            code: parse_code(code)?,
            original_url: original_url.to_owned(),
        }))
    }

    async fn insert(&self, record: &LinkRecord) -> Result<()> {
        let id = record.id.to_i64().ok_or_else(|| {
            StorageError::InvalidData(format!("link id {} exceeds BIGINT range", record.id))
        })?;

        let result = sqlx::query(
            r#"
            INSERT INTO links (id, short_url, original_url)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(id)
        .bind(record.code.as_str())
        .bind(record.original_url.as_str())
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => {
                debug!(id = %record.id, code = %record.code, "link stored");
                Ok(())
            }
            Err(err) if is_unique_violation(&err) => {
                Err(StorageError::Conflict(record.code.to_string()))
            }
            Err(err) => Err(map_sqlx_error(err)),
        }
    }
}
