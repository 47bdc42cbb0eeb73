//! Display model for one address

use chrono::DateTime;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::query::{ReputationData, ReviewsData};

/// Name shown when the address has no profile
pub const UNKNOWN_NAME: &str = "Unknown";

/// Avatar glyph shown when the profile has none
pub const PLACEHOLDER_AVATAR: &str = "👤";

/// Received reviews shown on a card
const MAX_REVIEWS: usize = 3;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReviewLine {
    pub stars: String,
    /// `dd.mm.yyyy`, UTC
    pub date: String,
    pub comment: Option<String>,
    pub sender_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReputationCard {
    pub address: String,
    pub short_address: String,
    pub name: String,
    pub bio: Option<String>,
    pub avatar: String,
    pub has_avatar: bool,
    pub final_score: f64,
    pub avg_rating: f64,
    pub total_ratings: u64,
    pub stars: String,
    pub skills: Vec<String>,
    pub links: BTreeMap<String, String>,
    pub reviews: Vec<ReviewLine>,
}

impl ReputationCard {
    pub fn build(data: ReputationData, reviews: Option<ReviewsData>) -> Self {
        let profile = data.profile.unwrap_or_default();
        let avatar = profile.avatar.filter(|a| !a.is_empty());

        let reviews = reviews
            .map(|r| {
                r.received
                    .into_iter()
                    .take(MAX_REVIEWS)
                    .map(|review| ReviewLine {
                        stars: render_stars(review.rating as f64),
                        date: format_date(review.timestamp),
                        comment: review.comment.filter(|c| !c.is_empty()),
                        sender_name: review.sender_name,
                    })
                    .collect()
            })
            .unwrap_or_default();

        Self {
            short_address: short_address(&data.address),
            address: data.address,
            name: profile
                .nickname
                .filter(|n| !n.is_empty())
                .unwrap_or_else(|| UNKNOWN_NAME.to_string()),
            bio: profile.bio.filter(|b| !b.is_empty()),
            has_avatar: avatar.is_some(),
            avatar: avatar.unwrap_or_else(|| PLACEHOLDER_AVATAR.to_string()),
            final_score: data.reputation.final_score,
            avg_rating: data.reputation.avg_rating,
            total_ratings: data.reputation.total_ratings,
            stars: render_stars(data.reputation.avg_rating),
            skills: profile.skills,
            links: profile.links,
            reviews,
        }
    }
}

/// Five glyphs, the first `round(rating)` filled
pub fn render_stars(rating: f64) -> String {
    let full = rating.round().clamp(0.0, 5.0) as usize;
    (1..=5).map(|i| if i <= full { '★' } else { '☆' }).collect()
}

/// First 6 and last 4 characters of anything longer than 12
pub fn short_address(address: &str) -> String {
    let chars: Vec<char> = address.chars().collect();
    if chars.len() <= 12 {
        return address.to_string();
    }
    let head: String = chars[..6].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}...{tail}")
}

fn format_date(timestamp: i64) -> String {
    DateTime::from_timestamp(timestamp, 0)
        .map(|dt| dt.format("%d.%m.%Y").to_string())
        .unwrap_or_default()
}
