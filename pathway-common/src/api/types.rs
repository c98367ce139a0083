//! Shared API request/response types
//!
//! Used by pathway-api handlers and by the pathway-import HTTP client, so both
//! sides agree on the wire format.

use crate::models::Assessment;
use serde::{Deserialize, Serialize};
use serde_json::Value;

// ========================================
// Accounts
// ========================================

/// Body of `POST /api/auth/signup` and `POST /api/auth/login`
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// Successful login
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    pub user_id: String,
}

/// Plain `{ "message": .. }` response
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

// ========================================
// Question Import
// ========================================

/// Body of `POST /api/assessments/:slug/import`
///
/// `questions` stays loosely typed: each entry is normalized server-side, and a
/// missing or non-array value is reported as a 400 rather than a parse failure.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ImportQuestionsRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(default)]
    pub questions: Option<Value>,
}

/// Successful import
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ImportQuestionsResponse {
    pub message: String,
    pub assessment: Assessment,
}

// ========================================
// Error Response Types
// ========================================

/// Error body returned by every failing endpoint
///
/// # Examples
///
/// ```
/// use pathway_common::api::types::ErrorResponse;
///
/// let body: ErrorResponse = serde_json::from_str(r#"{"error":"Assessment not found"}"#).unwrap();
/// assert_eq!(body.error, "Assessment not found");
/// ```
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}
