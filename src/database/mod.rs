//! SQLite Store Module
//!
//! Read access to the ingestion pipeline's store: transactions, ratings
//! and profile snapshots.

mod error;
pub mod pool;
pub mod profiles;
pub mod ratings;

pub use error::StoreError;
pub use pool::DatabasePool;
pub use profiles::{Profile, ProfileField, ProfileRepository};
pub use ratings::{Direction, RatingRepository, RatingTotals, ReceivedRating, ReviewRow};
