//! Data layer module
//!
//! Handles all data persistence:
//! - SQLite database operations
//! - Transactional write paths (unit of work)

mod database;
mod models;
mod unit_of_work;

pub use database::Database;
pub use models::*;
pub use unit_of_work::{PostWrites, UnitOfWork, write_post_with_tags};

#[cfg(test)]
mod database_test;
