//! Reputation calculation
//!
//! Turns valid received ratings into a score that rewards both quality and
//! volume.
//!
//! ## Score Model
//!
//! ```text
//! avg_rating  = round2(mean(ratings))
//! final_score = round2(avg_rating * ln(total_ratings + 1))
//! ```
//!
//! - No ratings means a zero score
//! - Ratings outside 1..=5 never reach the calculator
//! - Ranking sorts by final score, ties keep the store's order

mod ranking;
mod score;

pub use ranking::{RankCandidate, RankedAddress, RankedScore, RankingMode, rank};
pub use score::{
    DEFAULT_RATING_TYPE, MAX_RATING, MIN_RATING, RatingAggregate, ReputationSummary,
    breakdown_by_type, final_score, is_valid_rating, round2, summarize,
};
