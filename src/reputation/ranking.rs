//! Top-N ranking by final score
//!
//! The ranking key is a nonlinear function of aggregated columns, so the
//! store cannot order by it directly. Ranking runs in two stages:
//!
//! 1. the store returns receivers ordered by `(avg_rating desc,
//!    total_ratings desc)`;
//! 2. each candidate is scored and the page is re-sorted by `final_score`.
//!
//! In [`RankingMode::Approximate`] stage one is truncated to `limit` before
//! scoring. When average-rating ties straddle the page boundary a receiver
//! with a higher final score can be left out. [`RankingMode::Exact`] scores
//! every qualifying receiver before truncating.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::score::{RatingAggregate, final_score, round2};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RankingMode {
    /// Truncate stage one at `limit`
    #[default]
    Approximate,
    /// Score every qualifying receiver, then truncate
    Exact,
}

impl RankingMode {
    /// Row limit to request from the store for stage one
    pub fn candidate_limit(&self, limit: usize) -> Option<usize> {
        match self {
            RankingMode::Approximate => Some(limit),
            RankingMode::Exact => None,
        }
    }
}

impl FromStr for RankingMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "approximate" | "approx" => Ok(RankingMode::Approximate),
            "exact" => Ok(RankingMode::Exact),
            other => Err(format!("Unknown ranking mode: {}", other)),
        }
    }
}

impl fmt::Display for RankingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RankingMode::Approximate => write!(f, "approximate"),
            RankingMode::Exact => write!(f, "exact"),
        }
    }
}

/// Stage-one row: a receiver with at least one valid rating
#[derive(Debug, Clone, PartialEq)]
pub struct RankCandidate {
    pub address: String,
    pub aggregate: RatingAggregate,
}

/// Score fields exposed by the ranking
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedScore {
    pub final_score: f64,
    pub avg_rating: f64,
    pub total_ratings: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RankedAddress {
    pub address: String,
    pub score: RankedScore,
}

/// Stage two: score candidates, stable-sort by final score descending and
/// keep `limit`. Equal scores keep their stage-one order.
pub fn rank(candidates: Vec<RankCandidate>, limit: usize) -> Vec<RankedAddress> {
    let mut ranked: Vec<RankedAddress> = candidates
        .into_iter()
        .map(|candidate| {
            let avg_rating = candidate.aggregate.mean().map(round2).unwrap_or(0.0);
            RankedAddress {
                address: candidate.address,
                score: RankedScore {
                    final_score: final_score(avg_rating, candidate.aggregate.count),
                    avg_rating,
                    total_ratings: candidate.aggregate.count,
                },
            }
        })
        .collect();

    ranked.sort_by(|a, b| b.score.final_score.total_cmp(&a.score.final_score));
    ranked.truncate(limit);
    ranked
}
