//! Data layer module
//!
//! Handles all data persistence:
//! - SQLite schema (embedded migrations)
//! - Typed row models
//! - CRUD operations per table

mod database;
mod models;

pub use database::Database;
pub use models::*;

#[cfg(test)]
mod database_test;
