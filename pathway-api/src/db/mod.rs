//! Database access layer for pathway-api
//!
//! Schema creation lives in `pathway_common::db`; this layer holds the
//! queries the handlers run.

pub mod assessments;
pub mod leads;
pub mod users;
