//! JSON envelope: `{success, data?, error?, available?}`

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use crate::query::{Endpoint, QueryError};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Only set on the unknown-endpoint response
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub available: Option<Vec<String>>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            available: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
            available: None,
        }
    }

    /// Informational answer for an unrecognized endpoint name
    pub fn unknown_endpoint() -> Self {
        Self {
            available: Some(Endpoint::names().into_iter().map(String::from).collect()),
            ..Self::error("Unknown endpoint")
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

impl QueryError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            QueryError::AddressRequired | QueryError::Decode(_) => StatusCode::BAD_REQUEST,
            QueryError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            QueryError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for QueryError {
    fn into_response(self) -> Response {
        (self.status_code(), ApiResponse::<()>::error(self.to_string())).into_response()
    }
}

/// Wrap an operation result in the envelope
pub fn respond<T: Serialize>(result: Result<T, QueryError>) -> Response {
    match result {
        Ok(data) => (StatusCode::OK, ApiResponse::ok(data)).into_response(),
        Err(err) => err.into_response(),
    }
}
