//! [`StudentStore`]: keyed reads and writes over the `estudiantes` table.

use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use thiserror::Error;
use tracing::debug;

const CREATE_TABLE: &str = "CREATE TABLE IF NOT EXISTS estudiantes (
    ci TEXT PRIMARY KEY,
    pin_encrypted TEXT NOT NULL,
    inscripcion INTEGER DEFAULT 0,
    tipo INTEGER DEFAULT 0,
    carrera TEXT DEFAULT ''
)";

/// Columns added after the first release, applied in order on startup.
const CACHE_COLUMNS: &[&str] = &[
    "ALTER TABLE estudiantes ADD COLUMN inscripcion INTEGER DEFAULT 0",
    "ALTER TABLE estudiantes ADD COLUMN tipo INTEGER DEFAULT 0",
    "ALTER TABLE estudiantes ADD COLUMN carrera TEXT DEFAULT ''",
];

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Errors produced by the store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No row exists for the CI.
    #[error("CI {0} no registrado")]
    NotRegistered(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Enrollment metadata cached from an earlier query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedEnrollment {
    /// Portal enrollment id (`inscripcion`); always `> 0`.
    pub enrollment_id: i64,
    /// Portal enrollment-system code (`tipo`).
    pub enrollment_type: i64,
    /// Program name shown to the student.
    pub program: String,
}

/// Handle to the student table.
///
/// Cheap to clone; clones share one connection pool.
#[derive(Clone, Debug)]
pub struct StudentStore {
    pool: SqlitePool,
}

impl StudentStore {
    /// Open (creating if needed) the database file at `path` and initialise
    /// the schema.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] if the file cannot be opened or the
    /// schema cannot be created.
    pub async fn open(path: &str) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(BUSY_TIMEOUT);
        let pool = SqlitePoolOptions::new().connect_with(options).await?;
        Self::with_pool(pool).await
    }

    /// Private in-memory database. Useful for testing.
    #[cfg(test)]
    pub async fn in_memory() -> Result<Self, StoreError> {
        // Every connection to `:memory:` is a separate database, so the pool
        // must hold exactly one connection for its whole life.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await?;
        Self::with_pool(pool).await
    }

    /// Wrap an existing pool and initialise the schema.
    pub async fn with_pool(pool: SqlitePool) -> Result<Self, StoreError> {
        let store = Self { pool };
        store.init().await?;
        Ok(store)
    }

    /// Create the table if absent and add any cache columns it lacks.
    ///
    /// Idempotent.
    pub async fn init(&self) -> Result<(), StoreError> {
        sqlx::query(CREATE_TABLE).execute(&self.pool).await?;

        for stmt in CACHE_COLUMNS {
            if let Err(e) = sqlx::query(stmt).execute(&self.pool).await {
                if e.to_string().contains("duplicate column") {
                    continue;
                }
                return Err(e.into());
            }
            debug!(statement = *stmt, "upgraded student table");
        }
        Ok(())
    }

    /// Store the encrypted PIN for `ci`, creating the row if needed.
    ///
    /// An existing row keeps its cached enrollment; a new row starts uncached.
    pub async fn upsert(&self, ci: &str, encrypted_pin: &str) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO estudiantes (ci, pin_encrypted) VALUES (?, ?)
             ON CONFLICT(ci) DO UPDATE SET pin_encrypted = excluded.pin_encrypted",
        )
        .bind(ci)
        .bind(encrypted_pin)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Fetch the encrypted PIN for `ci`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotRegistered`] if there is no row for `ci`.
    pub async fn encrypted_pin(&self, ci: &str) -> Result<String, StoreError> {
        sqlx::query_scalar::<_, String>("SELECT pin_encrypted FROM estudiantes WHERE ci = ?")
            .bind(ci)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::NotRegistered(ci.to_owned()))
    }

    /// Return the cached enrollment for `ci`, or `None` if nothing has been
    /// cached yet (or the CI is unknown).
    pub async fn cached_enrollment(&self, ci: &str) -> Result<Option<CachedEnrollment>, StoreError> {
        let row = sqlx::query_as::<_, (i64, i64, Option<String>)>(
            "SELECT inscripcion, tipo, carrera FROM estudiantes WHERE ci = ? AND inscripcion > 0",
        )
        .bind(ci)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|(enrollment_id, enrollment_type, program)| CachedEnrollment {
            enrollment_id,
            enrollment_type,
            program: program.unwrap_or_default(),
        }))
    }

    /// Record enrollment metadata for `ci`. A no-op for unknown CIs.
    pub async fn set_cached_enrollment(
        &self,
        ci: &str,
        enrollment: &CachedEnrollment,
    ) -> Result<(), StoreError> {
        sqlx::query("UPDATE estudiantes SET inscripcion = ?, tipo = ?, carrera = ? WHERE ci = ?")
            .bind(enrollment.enrollment_id)
            .bind(enrollment.enrollment_type)
            .bind(&enrollment.program)
            .bind(ci)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Number of registered students.
    pub async fn count(&self) -> Result<i64, StoreError> {
        let n = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM estudiantes")
            .fetch_one(&self.pool)
            .await?;
        Ok(n)
    }

    /// Close the pool, waiting for checked-out connections to be returned.
    /// Later calls on any clone fail with [`StoreError::Database`].
    pub async fn close(&self) {
        self.pool.close().await;
    }
}
