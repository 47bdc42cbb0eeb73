//! Rating Repository - read-only lookups over `ratings` joined to `transactions`
//!
//! Only valid transactions count, and rows outside the 1..=5 rating range
//! are ignored everywhere so every endpoint sees the same multiset.

use serde::Serialize;
use sqlx::Row;
use sqlx::sqlite::{SqlitePool, SqliteRow};

use super::StoreError;
use crate::reputation::{MAX_RATING, MIN_RATING, RankCandidate, RatingAggregate};

/// A rating received by an address
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceivedRating {
    pub rating: u8,
    pub kind: Option<String>,
}

/// One rating row with the other party of its transaction
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReviewRow {
    pub rating: u8,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub comment: Option<String>,
    pub link: Option<String>,
    /// Sender for received reviews, receiver for given ones
    pub counterpart: String,
    pub timestamp: i64,
}

/// Which side of the transaction the queried address is on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Received,
    Given,
}

/// Global counters over valid ratings
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RatingTotals {
    pub rated_addresses: u64,
    pub total_ratings: u64,
    pub avg_rating: Option<f64>,
}

#[derive(Clone)]
pub struct RatingRepository {
    pool: SqlitePool,
}

impl RatingRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// All valid ratings where `address` is the receiver
    pub async fn received_ratings(
        &self,
        address: &str,
    ) -> Result<Vec<ReceivedRating>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT r.rating, r.type
            FROM ratings r
            JOIN transactions t ON r.tx_id = t.id
            WHERE t.receiver = ? AND t.is_valid = 1
              AND r.rating BETWEEN ? AND ?
        "#,
        )
        .bind(address)
        .bind(MIN_RATING as i64)
        .bind(MAX_RATING as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StoreError::query("Failed to get received ratings", e))?;

        rows.iter()
            .map(|row| -> Result<ReceivedRating, sqlx::Error> {
                Ok(ReceivedRating {
                    rating: rating_column(row)?,
                    kind: row.try_get("type")?,
                })
            })
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| StoreError::query("Failed to read rating row", e))
    }

    /// Number of valid ratings `address` authored as sender
    pub async fn ratings_given(&self, address: &str) -> Result<u64, StoreError> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(r.id)
            FROM ratings r
            JOIN transactions t ON r.tx_id = t.id
            WHERE t.sender = ? AND t.is_valid = 1
              AND r.rating BETWEEN ? AND ?
        "#,
        )
        .bind(address)
        .bind(MIN_RATING as i64)
        .bind(MAX_RATING as i64)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| StoreError::query("Failed to count given ratings", e))?;

        Ok(count.max(0) as u64)
    }

    /// Latest reviews on one side of `address`, newest transaction first
    pub async fn reviews(
        &self,
        address: &str,
        direction: Direction,
        limit: usize,
    ) -> Result<Vec<ReviewRow>, StoreError> {
        // Column names are fixed strings, never user input
        let (own_column, counterpart_column) = match direction {
            Direction::Received => ("receiver", "sender"),
            Direction::Given => ("sender", "receiver"),
        };

        let sql = format!(
            r#"
            SELECT r.rating, r.type, r.comment, r.link, t.{counterpart} AS counterpart, t.timestamp
            FROM ratings r
            JOIN transactions t ON r.tx_id = t.id
            WHERE t.{own} = ? AND t.is_valid = 1
              AND r.rating BETWEEN ? AND ?
            ORDER BY t.timestamp DESC, r.id DESC
            LIMIT ?
        "#,
            counterpart = counterpart_column,
            own = own_column,
        );

        let rows = sqlx::query(&sql)
            .bind(address)
            .bind(MIN_RATING as i64)
            .bind(MAX_RATING as i64)
            .bind(i64::try_from(limit).unwrap_or(i64::MAX))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StoreError::query("Failed to get reviews", e))?;

        rows.iter()
            .map(|row| -> Result<ReviewRow, sqlx::Error> {
                Ok(ReviewRow {
                    rating: rating_column(row)?,
                    kind: row.try_get("type")?,
                    comment: row.try_get("comment")?,
                    link: row.try_get("link")?,
                    counterpart: row.try_get("counterpart")?,
                    timestamp: row.try_get("timestamp")?,
                })
            })
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| StoreError::query("Failed to read review row", e))
    }

    /// Stage one of the ranking: receivers with at least one valid rating,
    /// ordered by `(avg desc, count desc)`. `None` fetches every receiver.
    pub async fn top_candidates(
        &self,
        limit: Option<usize>,
    ) -> Result<Vec<RankCandidate>, StoreError> {
        // SQLite treats a negative LIMIT as unbounded
        let limit = limit
            .map(|l| i64::try_from(l).unwrap_or(i64::MAX))
            .unwrap_or(-1);

        let rows = sqlx::query(
            r#"
            SELECT t.receiver AS address,
                   COUNT(r.id)   AS total_ratings,
                   SUM(r.rating) AS rating_sum,
                   MIN(r.rating) AS min_rating,
                   MAX(r.rating) AS max_rating
            FROM ratings r
            JOIN transactions t ON r.tx_id = t.id
            WHERE t.is_valid = 1
              AND r.rating BETWEEN ? AND ?
            GROUP BY t.receiver
            HAVING COUNT(r.id) >= 1
            ORDER BY AVG(r.rating) DESC, COUNT(r.id) DESC, t.receiver ASC
            LIMIT ?
        "#,
        )
        .bind(MIN_RATING as i64)
        .bind(MAX_RATING as i64)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StoreError::query("Failed to get top candidates", e))?;

        rows.iter()
            .map(|row| -> Result<RankCandidate, sqlx::Error> {
                let count: i64 = row.try_get("total_ratings")?;
                let sum: i64 = row.try_get("rating_sum")?;
                let min: i64 = row.try_get("min_rating")?;
                let max: i64 = row.try_get("max_rating")?;
                Ok(RankCandidate {
                    address: row.try_get("address")?,
                    aggregate: RatingAggregate {
                        count: count.max(0) as u64,
                        sum: sum.max(0) as u64,
                        min: Some(clamp_rating(min)),
                        max: Some(clamp_rating(max)),
                    },
                })
            })
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| StoreError::query("Failed to read top candidate row", e))
    }

    /// Rated-address count, rating count and mean over all valid ratings
    pub async fn totals(&self) -> Result<RatingTotals, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT COUNT(DISTINCT t.receiver) AS rated_addresses,
                   COUNT(r.id)                AS total_ratings,
                   AVG(r.rating)              AS avg_rating
            FROM ratings r
            JOIN transactions t ON r.tx_id = t.id
            WHERE t.is_valid = 1
              AND r.rating BETWEEN ? AND ?
        "#,
        )
        .bind(MIN_RATING as i64)
        .bind(MAX_RATING as i64)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| StoreError::query("Failed to get rating totals", e))?;

        let read = |row: &SqliteRow| -> Result<RatingTotals, sqlx::Error> {
            let rated_addresses: i64 = row.try_get("rated_addresses")?;
            let total_ratings: i64 = row.try_get("total_ratings")?;
            Ok(RatingTotals {
                rated_addresses: rated_addresses.max(0) as u64,
                total_ratings: total_ratings.max(0) as u64,
                avg_rating: row.try_get("avg_rating")?,
            })
        };

        read(&row).map_err(|e| StoreError::query("Failed to read rating totals", e))
    }
}

fn clamp_rating(value: i64) -> u8 {
    value.clamp(MIN_RATING as i64, MAX_RATING as i64) as u8
}

fn rating_column(row: &SqliteRow) -> Result<u8, sqlx::Error> {
    row.try_get("rating").map(clamp_rating)
}
