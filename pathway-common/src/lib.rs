//! # Pathway Common Library
//!
//! Shared code for the Pathway services including:
//! - Domain models (assessments, questions, leads)
//! - Upsert-by-id question merging
//! - API request/response types and auth primitives
//! - Configuration loading
//! - Database schema initialization

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod merge;
pub mod models;
pub mod slug;

pub use error::{Error, Result};
pub use merge::merge_questions;
pub use models::{Assessment, AssessmentImportBatch, Lead, LeadStatus, Question, QuestionType};
