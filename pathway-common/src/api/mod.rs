//! API module for shared HTTP API functionality
//!
//! Provides authentication primitives and wire types used by both the
//! pathway-api service and the pathway-import client.
//!
//! # Design Principle
//!
//! This module contains ONLY:
//! - Pure functions (no HTTP framework dependencies)
//! - Database operations (via sqlx)
//! - Shared types
//!
//! pathway-api wraps these with axum middleware and extractors.

pub mod auth;
pub mod types;

pub use auth::{
    create_session, hash_password, hash_token, parse_bearer, resolve_session, verify_password,
    ApiAuthError,
};
pub use types::{
    Credentials, ErrorResponse, ImportQuestionsRequest, ImportQuestionsResponse, LoginResponse,
    MessageResponse,
};
