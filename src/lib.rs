//! InsipiraHub store - the relational storage layer for a social platform
//!
//! The substantive artifact here is the schema: accounts, an append-only
//! archive of deleted accounts, posts, comments, likes, follow edges, and
//! verification/reset tokens, declared in `migrations/` and enforced by
//! SQLite. The Rust surface is deliberately thin: typed row models and
//! per-table CRUD in [`data`], nothing resembling business logic.
//!
//! Constraint semantics the schema guarantees (and tests pin down):
//!
//! - `username` and `email` are unique per account; `security_pin` is
//!   unique only among rows whose pin has not been soft-deleted.
//! - Comments and likes cascade with their post; tokens and reset tokens
//!   cascade with their account.
//! - Posts, comments, likes and follow edges do NOT cascade with their
//!   account; deleting an account that still owns any of them is rejected.
//! - Follow edges are unique per `(follower_id, following_id)` pair.
//!
//! # Modules
//!
//! - `data`: schema, models, and database operations
//! - `config`: configuration management
//! - `error`: error types

pub mod config;
pub mod data;
pub mod error;
