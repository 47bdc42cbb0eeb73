//! Query API
//!
//! Single GET entry point dispatching on the `endpoint` query parameter:
//!   GET /?endpoint=health
//!   GET /?endpoint=reputation&address=UQ...
//!   GET /?endpoint=reviews&address=0:...&limit=3
//!   GET /?endpoint=top&limit=10
//!   GET /?endpoint=stats
//!
//! The same handler is mounted at `/api` and `/api/index.php` so existing
//! widget embeds keep working.

use axum::{
    Router,
    extract::{Query, State, rejection::QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use serde::Deserialize;
use tracing::debug;

use super::response::{ApiResponse, respond};
use crate::query::{Endpoint, QueryService, parse_limit};

#[derive(Clone)]
pub struct QueryApiState {
    pub service: QueryService,
}

#[derive(Debug, Default, Deserialize)]
pub struct ApiParams {
    pub endpoint: Option<String>,
    pub address: Option<String>,
    /// Kept as text: parsed leniently, never rejected
    pub limit: Option<String>,
}

pub async fn handle_query(
    State(state): State<QueryApiState>,
    params: Result<Query<ApiParams>, QueryRejection>,
) -> Response {
    let Query(params) = match params {
        Ok(params) => params,
        Err(rejection) => {
            debug!(error = %rejection, "Rejected query string");
            return (
                StatusCode::BAD_REQUEST,
                ApiResponse::<()>::error("Invalid query string"),
            )
                .into_response();
        }
    };

    let endpoint = match Endpoint::select(params.endpoint.as_deref()) {
        Ok(endpoint) => endpoint,
        Err(name) => {
            debug!(endpoint = %name, "Unknown endpoint requested");
            return ApiResponse::<()>::unknown_endpoint().into_response();
        }
    };

    let address = params.address.as_deref().unwrap_or_default();
    let limit = parse_limit(params.limit.as_deref());
    let service = &state.service;

    match endpoint {
        Endpoint::Health => ApiResponse::ok(service.health()).into_response(),
        Endpoint::Reputation => respond(service.reputation(address).await),
        Endpoint::Reviews => respond(service.reviews(address, limit).await),
        Endpoint::Top => respond(service.top(limit).await),
        Endpoint::Stats => respond(service.stats().await),
    }
}

/// Bare preflight: success, no body
pub async fn preflight() -> StatusCode {
    StatusCode::OK
}

pub fn create_router(state: QueryApiState) -> Router {
    Router::new()
        .route("/", get(handle_query).options(preflight))
        .route("/api", get(handle_query).options(preflight))
        .route("/api/index.php", get(handle_query).options(preflight))
        .with_state(state)
}
