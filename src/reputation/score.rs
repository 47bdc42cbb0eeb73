//! Reputation Summary
//!
//! A raw average rewards one 5-star rating as much as a hundred of them.
//! The final score weights the average by `ln(total + 1)`, so accumulated
//! ratings outrank a single lucky one while volume alone has diminishing
//! returns.
//!
//! ```text
//! avg_rating  = round(mean(ratings), 2)
//! final_score = round(avg_rating * ln(total_ratings + 1), 2)
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Lowest rating a peer can give
pub const MIN_RATING: u8 = 1;
/// Highest rating a peer can give
pub const MAX_RATING: u8 = 5;

/// Rating type used when a row carries none
pub const DEFAULT_RATING_TYPE: &str = "general";

/// Count/sum/min/max fold over a multiset of ratings.
///
/// Both the single-address lookup and the ranking path go through this, so
/// they agree on every number.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RatingAggregate {
    pub count: u64,
    pub sum: u64,
    pub min: Option<u8>,
    pub max: Option<u8>,
}

impl RatingAggregate {
    pub fn from_ratings(ratings: &[u8]) -> Self {
        let mut aggregate = Self::default();
        for &rating in ratings {
            aggregate.push(rating);
        }
        aggregate
    }

    pub fn push(&mut self, rating: u8) {
        self.count += 1;
        self.sum += rating as u64;
        self.min = Some(self.min.map_or(rating, |m| m.min(rating)));
        self.max = Some(self.max.map_or(rating, |m| m.max(rating)));
    }

    pub fn mean(&self) -> Option<f64> {
        (self.count > 0).then(|| self.sum as f64 / self.count as f64)
    }
}

/// Derived per request, never persisted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReputationSummary {
    pub final_score: f64,
    pub avg_rating: f64,
    pub total_ratings: u64,
    /// Ratings this address authored on valid transactions
    pub ratings_given: u64,
    pub min_rating: Option<u8>,
    pub max_rating: Option<u8>,
}

impl ReputationSummary {
    pub fn from_aggregate(aggregate: &RatingAggregate, ratings_given: u64) -> Self {
        let avg_rating = aggregate.mean().map(round2).unwrap_or(0.0);

        Self {
            final_score: final_score(avg_rating, aggregate.count),
            avg_rating,
            total_ratings: aggregate.count,
            ratings_given,
            min_rating: aggregate.min,
            max_rating: aggregate.max,
        }
    }
}

/// Fold received ratings into a summary. Pure: only sum, count, min and max
/// of the multiset matter, so ordering has no effect.
pub fn summarize(received: &[u8], ratings_given: u64) -> ReputationSummary {
    ReputationSummary::from_aggregate(&RatingAggregate::from_ratings(received), ratings_given)
}

/// `avg_rating * ln(total_ratings + 1)`, rounded to 2 places. Zero when there
/// are no ratings.
pub fn final_score(avg_rating: f64, total_ratings: u64) -> f64 {
    if total_ratings == 0 {
        return 0.0;
    }
    round2(avg_rating * ((total_ratings + 1) as f64).ln())
}

/// Round half away from zero to 2 decimal places
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Count of received ratings per rating type
pub fn breakdown_by_type<'a, I>(types: I) -> BTreeMap<String, u64>
where
    I: IntoIterator<Item = Option<&'a str>>,
{
    let mut breakdown = BTreeMap::new();
    for kind in types {
        let kind = kind
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .unwrap_or(DEFAULT_RATING_TYPE);
        *breakdown.entry(kind.to_string()).or_insert(0) += 1;
    }
    breakdown
}

pub fn is_valid_rating(rating: i64) -> bool {
    (MIN_RATING as i64..=MAX_RATING as i64).contains(&rating)
}
