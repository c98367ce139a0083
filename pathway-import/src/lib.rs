//! pathway-import: bulk question import from CSV
//!
//! CSV text flows through [`csv::parse_csv`], [`normalize::normalize_table`]
//! and [`group::group_by_assessment`], then each assessment's batch is handed
//! to a [`submit::QuestionImporter`] one at a time.

pub mod client;
pub mod csv;
pub mod error;
pub mod group;
pub mod headers;
pub mod normalize;
pub mod submit;

pub use client::HttpImporter;
pub use error::{ImportError, ImportResult};
pub use submit::{run_import, ImportSummary, QuestionImporter};
