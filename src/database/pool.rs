//! Database Connection Pool using sqlx

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::time::Duration;
use tracing::{info, warn};

use crate::config::DatabaseConfig;
use crate::database::profiles::ProfileRepository;
use crate::database::ratings::RatingRepository;
use crate::database::StoreError;

#[derive(Clone)]
pub struct DatabasePool {
    pool: SqlitePool,
    ratings: RatingRepository,
    profiles: ProfileRepository,
}

impl DatabasePool {
    /// Open the store lazily. Nothing touches the file until the first query,
    /// so a missing file surfaces per request as [`StoreError::Unavailable`].
    pub fn open(config: &DatabaseConfig) -> Self {
        let options = SqliteConnectOptions::new()
            .filename(&config.path)
            .read_only(config.read_only)
            .create_if_missing(false);

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
            .connect_lazy_with(options);

        info!(
            path = %config.path.display(),
            read_only = config.read_only,
            "Configured SQLite store"
        );

        Self::from_pool(pool)
    }

    pub fn from_pool(pool: SqlitePool) -> Self {
        let ratings = RatingRepository::new(pool.clone());
        let profiles = ProfileRepository::new(pool.clone());

        Self {
            pool,
            ratings,
            profiles,
        }
    }

    /// Round-trip to the store; used at startup to warn early
    pub async fn check_connection(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::query("Failed to reach store", e))?;
        Ok(())
    }

    /// Create the three tables if missing. Development and tests only: the
    /// production store is owned by the ingestion pipeline.
    pub async fn init_schema(&self) -> Result<(), StoreError> {
        info!("Initializing database schema...");

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS transactions (
                id        INTEGER PRIMARY KEY,
                sender    TEXT    NOT NULL,
                receiver  TEXT    NOT NULL,
                timestamp INTEGER NOT NULL,
                is_valid  INTEGER NOT NULL DEFAULT 0
            )
        "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::query("Failed to create transactions table", e))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS ratings (
                id      INTEGER PRIMARY KEY,
                tx_id   INTEGER NOT NULL REFERENCES transactions(id),
                rating  INTEGER NOT NULL,
                type    TEXT,
                comment TEXT,
                link    TEXT
            )
        "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::query("Failed to create ratings table", e))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS profiles (
                id       INTEGER PRIMARY KEY AUTOINCREMENT,
                address  TEXT NOT NULL,
                nickname TEXT,
                bio      TEXT,
                avatar   TEXT,
                skills   TEXT,
                location TEXT,
                links    TEXT
            )
        "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::query("Failed to create profiles table", e))?;

        for statement in [
            "CREATE INDEX IF NOT EXISTS idx_tx_receiver ON transactions(receiver, is_valid)",
            "CREATE INDEX IF NOT EXISTS idx_tx_sender ON transactions(sender, is_valid)",
            "CREATE INDEX IF NOT EXISTS idx_ratings_tx ON ratings(tx_id)",
            "CREATE INDEX IF NOT EXISTS idx_profiles_address ON profiles(address, id)",
        ] {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(|e| StoreError::query("Failed to create index", e))?;
        }

        info!("Database schema initialized");
        Ok(())
    }

    pub fn ratings(&self) -> &RatingRepository {
        &self.ratings
    }

    pub fn profiles(&self) -> &ProfileRepository {
        &self.profiles
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn close(&self) {
        if self.pool.is_closed() {
            warn!("Store pool already closed");
            return;
        }
        self.pool.close().await;
    }
}
