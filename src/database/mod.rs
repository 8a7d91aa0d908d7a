//! Local database layer
//!
//! Handles SQLite storage for anonymous complaints:
//! - Schema creation and migrations
//! - CRUD and filtered queries over the complaint table
//! - Store properties (identity and schema version)

pub mod models;
pub mod schema;
pub mod connection;
pub mod migrations;
pub mod queries;

pub use connection::Database;
pub use models::*;
