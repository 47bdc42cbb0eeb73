//! Profile Repository - current profile lookups
//!
//! Profiles are append-only history. The current profile for an address is
//! the row with the highest id.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use sqlx::sqlite::{Sqlite, SqlitePool, SqliteRow};
use sqlx::{QueryBuilder, Row};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::debug;

use super::StoreError;

/// Public profile attached to an address
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub nickname: Option<String>,
    pub bio: Option<String>,
    pub avatar: Option<String>,
    #[serde(default, deserialize_with = "deserialize_skills")]
    pub skills: Vec<String>,
    pub location: Option<String>,
    #[serde(default, deserialize_with = "deserialize_links")]
    pub links: BTreeMap<String, String>,
}

/// `skills` / `links` as they come off a row or a payload: either already
/// structured, or a JSON document stored as text.
///
/// Parse failures resolve to an empty sequence or mapping. This is display
/// data and never fails a request.
#[derive(Debug, Clone, PartialEq)]
pub enum ProfileField {
    Structured(Value),
    Encoded(String),
    Missing,
}

impl ProfileField {
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Null => ProfileField::Missing,
            Value::String(text) => ProfileField::Encoded(text),
            other => ProfileField::Structured(other),
        }
    }

    pub fn from_text(text: Option<String>) -> Self {
        match text {
            Some(text) if !text.trim().is_empty() => ProfileField::Encoded(text),
            _ => ProfileField::Missing,
        }
    }

    fn resolve(self) -> Value {
        match self {
            ProfileField::Structured(value) => value,
            ProfileField::Encoded(text) => serde_json::from_str(&text).unwrap_or_else(|e| {
                debug!(error = %e, "Unparsable profile field, treating as empty");
                Value::Null
            }),
            ProfileField::Missing => Value::Null,
        }
    }

    /// Ordered skill list; non-string entries are dropped
    pub fn into_skills(self) -> Vec<String> {
        match self.resolve() {
            Value::Array(items) => items
                .into_iter()
                .filter_map(|item| match item {
                    Value::String(skill) => Some(skill),
                    _ => None,
                })
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Platform name -> URL; non-string values are dropped
    pub fn into_links(self) -> BTreeMap<String, String> {
        match self.resolve() {
            Value::Object(map) => map
                .into_iter()
                .filter_map(|(platform, url)| match url {
                    Value::String(url) => Some((platform, url)),
                    _ => None,
                })
                .collect(),
            _ => BTreeMap::new(),
        }
    }
}

fn deserialize_skills<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?.unwrap_or(Value::Null);
    Ok(ProfileField::from_value(value).into_skills())
}

fn deserialize_links<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<BTreeMap<String, String>, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?.unwrap_or(Value::Null);
    Ok(ProfileField::from_value(value).into_links())
}

#[derive(Clone)]
pub struct ProfileRepository {
    pool: SqlitePool,
}

impl ProfileRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Most recently inserted profile for an address
    pub async fn current_profile(&self, address: &str) -> Result<Option<Profile>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT address, nickname, bio, avatar, skills, location, links
            FROM profiles
            WHERE address = ?
            ORDER BY id DESC
            LIMIT 1
        "#,
        )
        .bind(address)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StoreError::query("Failed to get profile", e))?;

        Ok(row.as_ref().map(profile_from_row))
    }

    /// Current profiles for many addresses in one round-trip. Addresses
    /// without a profile are absent from the map.
    pub async fn current_profiles(
        &self,
        addresses: &[String],
    ) -> Result<HashMap<String, Profile>, StoreError> {
        let unique: BTreeSet<&str> = addresses.iter().map(String::as_str).collect();
        if unique.is_empty() {
            return Ok(HashMap::new());
        }

        let mut builder = QueryBuilder::<Sqlite>::new(
            "SELECT address, nickname, bio, avatar, skills, location, links \
             FROM profiles \
             WHERE id IN (SELECT MAX(id) FROM profiles WHERE address IN (",
        );
        let mut separated = builder.separated(", ");
        for address in &unique {
            separated.push_bind(*address);
        }
        separated.push_unseparated(") GROUP BY address)");

        let rows = builder
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StoreError::query("Failed to get profiles", e))?;

        Ok(rows
            .iter()
            .map(|row| (row.get::<String, _>("address"), profile_from_row(row)))
            .collect())
    }

    /// Distinct addresses that have at least one profile row
    pub async fn count_profiled_addresses(&self) -> Result<u64, StoreError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(DISTINCT address) FROM profiles")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| StoreError::query("Failed to count profiles", e))?;

        Ok(count.max(0) as u64)
    }
}

fn text_column(row: &SqliteRow, column: &str) -> Option<String> {
    row.try_get::<Option<String>, _>(column).ok().flatten()
}

fn profile_from_row(row: &SqliteRow) -> Profile {
    Profile {
        nickname: text_column(row, "nickname"),
        bio: text_column(row, "bio"),
        avatar: text_column(row, "avatar"),
        skills: ProfileField::from_text(text_column(row, "skills")).into_skills(),
        location: text_column(row, "location"),
        links: ProfileField::from_text(text_column(row, "links")).into_links(),
    }
}
