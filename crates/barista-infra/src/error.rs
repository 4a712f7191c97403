//! HTTP error response body
//!
//! `IntoResponse` lives in barista-api next to the request context it needs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Body returned for every failed request
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, request_id: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            request_id: request_id.into(),
            timestamp: Utc::now(),
        }
    }
}
