//! Account credentials and bearer-token sessions
//!
//! # Architecture
//!
//! - Passwords are stored as argon2 PHC strings (salt embedded)
//! - Session tokens are 32 random bytes, hex encoded, handed to the client once
//! - Only the SHA-256 digest of a token is persisted (`sessions.token_hash`)
//! - Session lifetime comes from the `session_timeout_seconds` setting
//!
//! This module contains ONLY pure functions and database operations.
//! No HTTP framework dependencies; the axum middleware lives in pathway-api.

use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use sha2::{Digest, Sha256};
use sqlx::SqlitePool;

use crate::db::get_setting;

/// Settings key holding the session lifetime in seconds
pub const SESSION_TIMEOUT_SETTING: &str = "session_timeout_seconds";

/// Default session lifetime when the setting is missing or unparsable (30 days)
pub const DEFAULT_SESSION_TIMEOUT_SECONDS: i64 = 2_592_000;

// ========================================
// Error Types
// ========================================

/// Authentication error types
#[derive(Debug, Clone)]
pub enum ApiAuthError {
    /// Authorization header absent or not a bearer token
    MissingToken,

    /// Token unknown or expired
    InvalidToken,

    /// E-mail / password pair does not match
    InvalidCredentials,

    /// Password hashing failed
    Hashing(String),

    /// Database error loading or storing session data
    DatabaseError(String),
}

impl std::fmt::Display for ApiAuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiAuthError::MissingToken => write!(f, "Missing bearer token"),
            ApiAuthError::InvalidToken => write!(f, "Invalid or expired token"),
            ApiAuthError::InvalidCredentials => write!(f, "Invalid email or password"),
            ApiAuthError::Hashing(err) => write!(f, "Password hashing failed: {}", err),
            ApiAuthError::DatabaseError(err) => write!(f, "Database error: {}", err),
        }
    }
}

impl std::error::Error for ApiAuthError {}

impl From<sqlx::Error> for ApiAuthError {
    fn from(e: sqlx::Error) -> Self {
        ApiAuthError::DatabaseError(e.to_string())
    }
}

// ========================================
// Password Hashing
// ========================================

/// Hash a password into an argon2 PHC string
pub fn hash_password(password: &str) -> Result<String, ApiAuthError> {
    let salt_bytes: [u8; 16] = rand::thread_rng().gen();
    let salt =
        SaltString::encode_b64(&salt_bytes).map_err(|e| ApiAuthError::Hashing(e.to_string()))?;

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| ApiAuthError::Hashing(e.to_string()))
}

/// Check a password against a stored PHC string
///
/// A malformed stored hash never verifies.
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    match PasswordHash::new(stored_hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

// ========================================
// Session Tokens
// ========================================

/// Generate a fresh session token (64 hex characters)
pub fn generate_token() -> String {
    let bytes: [u8; 32] = rand::thread_rng().gen();
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

/// SHA-256 digest of a token as 64 hex characters
///
/// # Examples
///
/// ```
/// use pathway_common::api::auth::hash_token;
///
/// let digest = hash_token("abc");
/// assert_eq!(digest.len(), 64);
/// assert_eq!(digest, hash_token("abc"));
/// ```
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Extract the token from an `Authorization` header value
pub fn parse_bearer(header_value: &str) -> Option<&str> {
    let (scheme, token) = header_value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

// ========================================
// Session Persistence
// ========================================

/// Load session lifetime from the `settings` table
pub async fn load_session_timeout(db: &SqlitePool) -> Result<Duration, ApiAuthError> {
    let value = get_setting(db, SESSION_TIMEOUT_SETTING)
        .await
        .map_err(|e| ApiAuthError::DatabaseError(e.to_string()))?;

    let seconds = value
        .and_then(|v| v.trim().parse::<i64>().ok())
        .filter(|s| *s > 0)
        .unwrap_or(DEFAULT_SESSION_TIMEOUT_SECONDS);

    Ok(Duration::seconds(seconds))
}

/// Create a session for `user_id`, returning the plain token
pub async fn create_session(db: &SqlitePool, user_id: &str) -> Result<String, ApiAuthError> {
    let token = generate_token();
    let now = Utc::now();
    let expires_at = now + load_session_timeout(db).await?;

    sqlx::query(
        "INSERT INTO sessions (token_hash, user_guid, created_at, expires_at) VALUES (?, ?, ?, ?)",
    )
    .bind(hash_token(&token))
    .bind(user_id)
    .bind(now)
    .bind(expires_at)
    .execute(db)
    .await?;

    Ok(token)
}

/// Resolve a token to its user id
///
/// Expired sessions are removed on sight and reported as `InvalidToken`.
pub async fn resolve_session(db: &SqlitePool, token: &str) -> Result<String, ApiAuthError> {
    let token_hash = hash_token(token);

    let row: Option<(String, DateTime<Utc>)> =
        sqlx::query_as("SELECT user_guid, expires_at FROM sessions WHERE token_hash = ?")
            .bind(&token_hash)
            .fetch_optional(db)
            .await?;

    match row {
        Some((user_id, expires_at)) if expires_at > Utc::now() => Ok(user_id),
        Some(_) => {
            sqlx::query("DELETE FROM sessions WHERE token_hash = ?")
                .bind(&token_hash)
                .execute(db)
                .await?;
            Err(ApiAuthError::InvalidToken)
        }
        None => Err(ApiAuthError::InvalidToken),
    }
}

// ========================================
// Tests
// ========================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_roundtrip() {
        let hash = hash_password("hunter2").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("hunter2", &hash));
        assert!(!verify_password("hunter3", &hash));
    }

    #[test]
    fn test_same_password_different_salt() {
        let a = hash_password("same").unwrap();
        let b = hash_password("same").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_malformed_hash_never_verifies() {
        assert!(!verify_password("anything", ""));
        assert!(!verify_password("anything", "not-a-phc-string"));
    }

    #[test]
    fn test_generate_token_format() {
        let token = generate_token();
        assert_eq!(token.len(), 64);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(token, generate_token());
    }

    #[test]
    fn test_hash_token_is_stable_hex() {
        let digest = hash_token("token");
        assert_eq!(digest.len(), 64);
        assert!(digest.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(digest, hash_token("other"));
    }

    #[test]
    fn test_parse_bearer() {
        assert_eq!(parse_bearer("Bearer abc123"), Some("abc123"));
        assert_eq!(parse_bearer("bearer   abc123 "), Some("abc123"));
        assert_eq!(parse_bearer("Basic abc123"), None);
        assert_eq!(parse_bearer("Bearer "), None);
        assert_eq!(parse_bearer("abc123"), None);
    }
}
