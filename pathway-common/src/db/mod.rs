//! Database schema and settings access

pub mod init;

pub use init::{get_setting, init_database, init_schema};
