//! Widget-side consumer of the query API
//!
//! Fetches a reputation card for one address the way the embeddable widget
//! does: normalize locally, request `reputation` and `reviews` in parallel,
//! and fold both payloads into a display model. Rendering to HTML is left
//! to the embedding page.

mod card;
mod http;

pub use card::{
    PLACEHOLDER_AVATAR, ReputationCard, ReviewLine, UNKNOWN_NAME, render_stars, short_address,
};
pub use http::ReputationClient;

use std::time::Duration;
use thiserror::Error;

use crate::address::AddressError;

/// Public API endpoint used by the hosted widget
pub const DEFAULT_API_URL: &str = "https://repowr.tech/api/index.php";

/// Address shown when the embed does not name one
pub const DEFAULT_ADDRESS: &str = "UQATKnigdlBIuU3FJ57VSh4Aqxel9oLbQ4hBzIZ6YzWkbZys";

/// Client settings, supplied at construction time
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Query API entry point
    pub api_url: String,
    /// Address loaded when none is given
    pub default_address: String,
    /// Per-request budget; an expired request is abandoned, not retried
    pub timeout: Duration,
    /// Also fetch the latest reviews
    pub show_reviews: bool,
    pub review_limit: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            default_address: DEFAULT_ADDRESS.to_string(),
            timeout: Duration::from_secs(10),
            show_reviews: true,
            review_limit: 3,
        }
    }
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request timed out")]
    Timeout,

    #[error("server error: {0}")]
    Status(u16),

    /// `success: false` answer from the API
    #[error("{0}")]
    Api(String),

    #[error("transport error: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("invalid address: {0}")]
    InvalidAddress(#[from] AddressError),

    #[error("invalid API URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ClientError::Timeout
        } else {
            ClientError::Transport(err)
        }
    }
}
