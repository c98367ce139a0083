//! HTTP API handlers for pathway-api

pub mod accounts;
pub mod analytics;
pub mod assessments;
pub mod auth;
pub mod form;
pub mod health;
pub mod import;
pub mod leads;

pub use accounts::{login, signup};
pub use analytics::get_analytics;
pub use assessments::{
    create_assessment, delete_assessment, duplicate_assessment, get_assessment,
    list_assessments, update_assessment,
};
pub use auth::{auth_middleware, AuthUser};
pub use health::health_routes;
pub use import::import_questions;
pub use leads::{export_leads, list_leads, submit_lead, update_lead_status};
