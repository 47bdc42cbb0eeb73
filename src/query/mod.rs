//! Query Service
//!
//! Read operations behind the HTTP API:
//!
//! | endpoint     | params             | store access                        |
//! |--------------|--------------------|-------------------------------------|
//! | `health`     | -                  | none                                |
//! | `reputation` | `address`          | received ratings, given count, profile |
//! | `reviews`    | `address`, `limit` | received + given rows, profiles     |
//! | `top`        | `limit`            | ranked receivers, profiles          |
//! | `stats`      | -                  | global counters                     |

mod error;
mod params;
mod service;

pub use error::QueryError;
pub use params::{DEFAULT_LIMIT, Endpoint, MAX_LIMIT, MIN_LIMIT, clamp_limit, parse_limit};
pub use service::{
    GivenReview, HealthData, PROTOCOL, QueryService, ReceivedReview, ReputationData, ReviewsData,
    StatsData, TopEntry,
};
