//! repOWR Reputation API
//!
//! Read-only reputation service for TON addresses. Peer ratings tied to
//! validated transactions are folded into a volume-weighted score and served
//! over a single query endpoint.
//!
//! ## Module Structure
//!
//! ```text
//! src/
//! ├── lib.rs         - Crate root with re-exports
//! ├── main.rs        - Server entrypoint
//! ├── config.rs      - Configuration management
//! ├── address/       - Address codec
//! │   ├── raw.rs      - Canonical `workchain:hash` form
//! │   └── friendly.rs - URL-safe base64 form (flag, checksum)
//! ├── reputation/    - Score calculation
//! │   ├── score.rs    - Aggregate, summary, final score
//! │   └── ranking.rs  - Two-stage top-N ranking
//! ├── database/      - SQLite store (read-only)
//! │   ├── pool.rs     - Lazy pool, dev schema
//! │   ├── ratings.rs  - Rating lookups
//! │   └── profiles.rs - Current profile lookups
//! ├── query/         - The five read operations
//! ├── api/           - HTTP API
//! │   ├── query.rs      - `?endpoint=` dispatch
//! │   ├── response.rs   - JSON envelope
//! │   └── middleware.rs - CORS, security headers, request logging
//! └── client/        - Widget-side API consumer
//! ```

pub mod address;
pub mod api;
pub mod client;
pub mod config;
pub mod database;
pub mod query;
pub mod reputation;

// Re-export main types for convenience
pub use address::{AddressError, FriendlyAddress, RawAddress, normalize};
pub use config::ApiConfig;
pub use database::{DatabasePool, Profile, StoreError};
pub use query::{Endpoint, QueryError, QueryService};
pub use reputation::{RankingMode, ReputationSummary, final_score, summarize};

// Re-export API types
pub use api::{ApiResponse, QueryApiState, build_app};

// Re-export client types
pub use client::{ClientConfig, ClientError, ReputationCard, ReputationClient};
