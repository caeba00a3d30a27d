//! Data layer module
//!
//! Handles all data persistence:
//! - SQLite database operations (writes and simple reads)
//! - View builder (cross-collection read-model queries)

mod database;
mod models;
mod views;

pub use database::Database;
pub use models::*;
pub use views::*;

#[cfg(test)]
mod database_test;
