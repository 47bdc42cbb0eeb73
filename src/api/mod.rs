//! HTTP API for the reputation service
//!
//! Provides:
//! - Query API (health, reputation, reviews, top, stats)
//! - JSON response envelope
//! - Middleware (CORS, security headers, request logging)

pub mod middleware;
pub mod query;
pub mod response;

use axum::{Router, middleware as axum_middleware};
use tower_http::trace::TraceLayer;

use crate::config::ApiConfig;
use crate::query::QueryService;

pub use middleware::{
    RequestLogState, cors_layer, logging_middleware, sanitize_for_log,
    security_headers_middleware,
};
pub use query::{ApiParams, QueryApiState, create_router as create_query_router};
pub use response::{ApiResponse, respond};

/// Full application router with every layer applied
pub fn build_app(service: QueryService, config: &ApiConfig) -> Router {
    create_query_router(QueryApiState { service })
        // Layers run bottom-up: trace, CORS, headers, logging
        .layer(axum_middleware::from_fn_with_state(
            RequestLogState::from(&config.logging),
            logging_middleware,
        ))
        .layer(axum_middleware::from_fn(security_headers_middleware))
        .layer(cors_layer(&config.cors))
        .layer(TraceLayer::new_for_http())
}
