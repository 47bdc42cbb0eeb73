//! The five read operations
//!
//! Every operation is stateless: normalize the address, run the store
//! lookups (concurrently where independent), fold through the calculator
//! and shape the payload.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info};

use super::error::QueryError;
use super::params::{MAX_LIMIT, MIN_LIMIT};
use crate::address::{self, RawAddress};
use crate::database::{DatabasePool, Direction, Profile, ReviewRow};
use crate::reputation::{
    RankedScore, RankingMode, ReputationSummary, breakdown_by_type, rank, round2, summarize,
};

/// Protocol name reported by health
pub const PROTOCOL: &str = "repOWR";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthData {
    pub status: String,
    pub message: String,
    pub version: String,
    pub protocol: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReputationData {
    /// Canonical form of the queried address
    pub address: String,
    pub reputation: ReputationSummary,
    /// Received rating count per rating type
    #[serde(default)]
    pub by_type: BTreeMap<String, u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<Profile>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReceivedReview {
    pub rating: u8,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub comment: Option<String>,
    pub link: Option<String>,
    pub sender: String,
    pub timestamp: i64,
    pub sender_name: Option<String>,
    pub sender_avatar: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GivenReview {
    pub rating: u8,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub comment: Option<String>,
    pub link: Option<String>,
    pub receiver: String,
    pub timestamp: i64,
    pub receiver_name: Option<String>,
    pub receiver_avatar: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewsData {
    pub address: String,
    pub received: Vec<ReceivedReview>,
    pub given: Vec<GivenReview>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopEntry {
    pub address: String,
    pub reputation: RankedScore,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<Profile>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatsData {
    /// Distinct addresses with at least one received valid rating
    pub total_users: u64,
    pub total_ratings: u64,
    /// Distinct addresses with a profile
    pub total_profiles: u64,
    pub avg_rating: f64,
}

#[derive(Clone)]
pub struct QueryService {
    db: DatabasePool,
    ranking: RankingMode,
}

impl QueryService {
    pub fn new(db: DatabasePool, ranking: RankingMode) -> Self {
        Self { db, ranking }
    }

    pub fn ranking_mode(&self) -> RankingMode {
        self.ranking
    }

    /// Static liveness payload; never touches the store
    pub fn health(&self) -> HealthData {
        HealthData {
            status: "ok".to_string(),
            message: "API is running".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            protocol: PROTOCOL.to_string(),
        }
    }

    /// Summary, rating-type breakdown and current profile of one address
    pub async fn reputation(&self, address: &str) -> Result<ReputationData, QueryError> {
        let address = require_address(address)?.to_string();

        let ratings = self.db.ratings();
        let (received, ratings_given, profile) = tokio::try_join!(
            ratings.received_ratings(&address),
            ratings.ratings_given(&address),
            self.db.profiles().current_profile(&address),
        )?;

        let values: Vec<u8> = received.iter().map(|r| r.rating).collect();
        let reputation = summarize(&values, ratings_given);
        let by_type = breakdown_by_type(received.iter().map(|r| r.kind.as_deref()));

        debug!(
            address = %address,
            total_ratings = reputation.total_ratings,
            final_score = reputation.final_score,
            "Computed reputation"
        );

        Ok(ReputationData {
            address,
            reputation,
            by_type,
            profile,
        })
    }

    /// Latest received and given reviews, each enriched with the other
    /// party's current nickname and avatar
    pub async fn reviews(&self, address: &str, limit: usize) -> Result<ReviewsData, QueryError> {
        let address = require_address(address)?.to_string();
        let limit = limit.clamp(MIN_LIMIT, MAX_LIMIT);

        let ratings = self.db.ratings();
        let (received, given) = tokio::try_join!(
            ratings.reviews(&address, Direction::Received, limit),
            ratings.reviews(&address, Direction::Given, limit),
        )?;

        let counterparts: Vec<String> = received
            .iter()
            .chain(given.iter())
            .map(|row| row.counterpart.clone())
            .collect();
        let profiles = self.db.profiles().current_profiles(&counterparts).await?;

        let received = received
            .into_iter()
            .map(|row| {
                let (name, avatar) = display_fields(&profiles, &row.counterpart);
                let ReviewRow {
                    rating,
                    kind,
                    comment,
                    link,
                    counterpart,
                    timestamp,
                } = row;
                ReceivedReview {
                    rating,
                    kind,
                    comment,
                    link,
                    sender: counterpart,
                    timestamp,
                    sender_name: name,
                    sender_avatar: avatar,
                }
            })
            .collect();

        let given = given
            .into_iter()
            .map(|row| {
                let (name, avatar) = display_fields(&profiles, &row.counterpart);
                let ReviewRow {
                    rating,
                    kind,
                    comment,
                    link,
                    counterpart,
                    timestamp,
                } = row;
                GivenReview {
                    rating,
                    kind,
                    comment,
                    link,
                    receiver: counterpart,
                    timestamp,
                    receiver_name: name,
                    receiver_avatar: avatar,
                }
            })
            .collect();

        Ok(ReviewsData {
            address,
            received,
            given,
        })
    }

    /// Addresses ranked by final score. See [`RankingMode`] for the
    /// page-boundary caveat of the approximate mode.
    pub async fn top(&self, limit: usize) -> Result<Vec<TopEntry>, QueryError> {
        let limit = limit.clamp(MIN_LIMIT, MAX_LIMIT);

        let candidates = self
            .db
            .ratings()
            .top_candidates(self.ranking.candidate_limit(limit))
            .await?;
        let candidate_count = candidates.len();
        let ranked = rank(candidates, limit);

        let addresses: Vec<String> = ranked.iter().map(|r| r.address.clone()).collect();
        let mut profiles = self.db.profiles().current_profiles(&addresses).await?;

        info!(
            mode = %self.ranking,
            candidates = candidate_count,
            returned = ranked.len(),
            "Ranked top addresses"
        );

        Ok(ranked
            .into_iter()
            .map(|entry| TopEntry {
                profile: profiles.remove(&entry.address),
                address: entry.address,
                reputation: entry.score,
            })
            .collect())
    }

    /// Global counters over valid ratings and profiles
    pub async fn stats(&self) -> Result<StatsData, QueryError> {
        let (totals, total_profiles) = tokio::try_join!(
            self.db.ratings().totals(),
            self.db.profiles().count_profiled_addresses(),
        )?;

        Ok(StatsData {
            total_users: totals.rated_addresses,
            total_ratings: totals.total_ratings,
            total_profiles,
            avg_rating: totals.avg_rating.map(round2).unwrap_or(0.0),
        })
    }
}

fn require_address(address: &str) -> Result<RawAddress, QueryError> {
    if address.trim().is_empty() {
        return Err(QueryError::AddressRequired);
    }
    Ok(address::normalize(address)?)
}

fn display_fields(
    profiles: &HashMap<String, Profile>,
    address: &str,
) -> (Option<String>, Option<String>) {
    match profiles.get(address) {
        Some(profile) => (profile.nickname.clone(), profile.avatar.clone()),
        None => (None, None),
    }
}
