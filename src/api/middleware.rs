//! Middleware for the reputation API
//!
//! Provides:
//! - Response security headers
//! - Request logging with client IP sanitization
//! - Open CORS for third-party embeds

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{HeaderMap, HeaderValue, Method, header},
    middleware::Next,
    response::Response,
};
use std::net::SocketAddr;
use std::time::{Duration, Instant};
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info, warn};
use url::form_urlencoded;

use crate::config::{CorsConfig, LoggingConfig};

/// State for the request logging middleware
#[derive(Debug, Clone)]
pub struct RequestLogState {
    pub log_requests: bool,
    pub sanitize_logs: bool,
}

impl From<&LoggingConfig> for RequestLogState {
    fn from(config: &LoggingConfig) -> Self {
        Self {
            log_requests: config.log_requests,
            sanitize_logs: config.sanitize_logs,
        }
    }
}

/// Any origin, read methods, `Content-Type` request header
pub fn cors_layer(config: &CorsConfig) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
        .max_age(Duration::from_secs(config.max_age_secs))
}

/// Extract client IP from request, handling proxies
fn get_client_ip(headers: &HeaderMap, addr: Option<&SocketAddr>) -> String {
    // Check X-Forwarded-For header (from reverse proxy)
    if let Some(forwarded) = headers.get("x-forwarded-for")
        && let Ok(value) = forwarded.to_str()
        && let Some(ip) = value.split(',').next()
    {
        return ip.trim().to_string();
    }

    if let Some(real_ip) = headers.get("x-real-ip")
        && let Ok(ip) = real_ip.to_str()
    {
        return ip.trim().to_string();
    }

    addr.map(|a| a.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Sanitize value for logging (mask the middle)
pub fn sanitize_for_log(value: &str) -> String {
    if value.len() <= 8 {
        return "*".repeat(value.len());
    }
    format!("{}...{}", &value[..4], &value[value.len() - 4..])
}

/// Decoded `endpoint` query value for log lines; absent or empty means health
fn endpoint_from_query(query: Option<&str>) -> String {
    query
        .and_then(|q| {
            form_urlencoded::parse(q.as_bytes())
                .find(|(key, _)| key == "endpoint")
                .map(|(_, value)| value.trim().to_string())
        })
        .filter(|endpoint| !endpoint.is_empty())
        .unwrap_or_else(|| "health".to_string())
}

/// Security headers middleware
pub async fn security_headers_middleware(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();

    // Prevent MIME type sniffing
    headers.insert(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    );

    // JSON only, never framed
    headers.insert(header::X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));

    headers.insert(
        header::REFERRER_POLICY,
        HeaderValue::from_static("strict-origin-when-cross-origin"),
    );

    // Scores are computed per request
    headers.insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static("no-store, no-cache, must-revalidate"),
    );

    // Remove server identification
    headers.remove(header::SERVER);

    response
}

/// Request logging middleware with sanitization
pub async fn logging_middleware(
    State(state): State<RequestLogState>,
    request: Request,
    next: Next,
) -> Response {
    if !state.log_requests {
        return next.run(request).await;
    }

    let start = Instant::now();
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let endpoint = endpoint_from_query(request.uri().query());
    let connect_info = request.extensions().get::<ConnectInfo<SocketAddr>>();
    let client_ip = get_client_ip(request.headers(), connect_info.map(|c| &c.0));

    let log_ip = if state.sanitize_logs {
        sanitize_for_log(&client_ip)
    } else {
        client_ip
    };

    let response = next.run(request).await;
    let duration = start.elapsed();
    let status = response.status();

    // Log based on status code
    if status.is_server_error() {
        error!(
            method = %method,
            path = %path,
            endpoint = %endpoint,
            status = %status.as_u16(),
            duration_ms = %duration.as_millis(),
            client_ip = %log_ip,
            "Request failed"
        );
    } else if status.is_client_error() {
        warn!(
            method = %method,
            path = %path,
            endpoint = %endpoint,
            status = %status.as_u16(),
            duration_ms = %duration.as_millis(),
            client_ip = %log_ip,
            "Client error"
        );
    } else {
        info!(
            method = %method,
            path = %path,
            endpoint = %endpoint,
            status = %status.as_u16(),
            duration_ms = %duration.as_millis(),
            client_ip = %log_ip,
            "Request completed"
        );
    }

    response
}
