//! Data models
//!
//! Rust structs mirroring the database tables, one row type per table plus
//! `New*` insert payloads for the columns callers actually supply. Columns
//! with database-side defaults (ids, timestamps, flags) are absent from the
//! insert payloads and filled in by the engine.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// Accounts
// =============================================================================

/// A registered account row.
///
/// `password` holds whatever hash the application stored; this crate never
/// interprets it. `security_pin` is unique only among rows where
/// `pin_deleted_at` is NULL.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Account {
    pub id: i64,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub username: String,
    pub password: String,
    pub country: Option<String>,
    /// Birth date parts, stored exactly as the original schema does
    pub day: Option<i64>,
    pub month: Option<i64>,
    pub year: Option<i64>,
    pub user_verified: bool,
    pub security_pin: String,
    /// Soft-delete marker for the pin; NULL means the pin is active
    pub pin_deleted_at: Option<DateTime<Utc>>,
    pub role: String,
    /// Two-factor flag, 'T' or 'F'
    pub tfa: String,
    /// Pending two-factor login token, if any
    pub auth_token: Option<String>,
    /// Timestamp paired with `auth_token`
    pub ttmp: Option<DateTime<Utc>>,
    pub profile_picture: Option<String>,
    pub registration_date: DateTime<Utc>,
}

/// Columns supplied when registering an account.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub username: String,
    pub password: String,
    pub country: Option<String>,
    pub day: Option<i64>,
    pub month: Option<i64>,
    pub year: Option<i64>,
    pub security_pin: String,
}

/// An archived account row.
///
/// Append-only; deliberately carries no reference back to `accounts`.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct DeletedAccount {
    pub id: i64,
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub country: Option<String>,
    pub day: Option<i64>,
    pub month: Option<i64>,
    pub year: Option<i64>,
    pub deleted_date: NaiveDate,
    pub deletion_reason: Option<String>,
}

// =============================================================================
// Posts
// =============================================================================

/// A post row.
///
/// `user_id` is nullable and carries no cascade: deleting the owning
/// account is rejected by the engine while posts still reference it.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Post {
    pub id: i64,
    pub user_id: Option<i64>,
    /// Denormalized author fields
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub title: String,
    pub content: String,
    pub display_style: Option<String>,
    pub category: Option<String>,
    pub created_at: DateTime<Utc>,
    pub is_edited: bool,
    pub edited_at: Option<DateTime<Utc>>,
}

/// Columns supplied when creating a post.
#[derive(Debug, Clone)]
pub struct NewPost {
    pub user_id: Option<i64>,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub title: String,
    pub content: String,
    pub display_style: Option<String>,
    pub category: Option<String>,
}

// =============================================================================
// Comments
// =============================================================================

/// A comment row; cascade-deleted with its post.
///
/// `username`, `email` and `post_title` are denormalized copies taken at
/// write time and never updated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Comment {
    pub id: i64,
    pub post_id: i64,
    pub user_id: Option<i64>,
    pub username: Option<String>,
    pub email: Option<String>,
    pub content: String,
    pub post_title: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Columns supplied when adding a comment.
#[derive(Debug, Clone)]
pub struct NewComment {
    pub post_id: i64,
    pub user_id: Option<i64>,
    pub username: Option<String>,
    pub email: Option<String>,
    pub content: String,
    pub post_title: Option<String>,
}

// =============================================================================
// Likes
// =============================================================================

/// A reaction row; cascade-deleted with its post.
///
/// `like_status` distinguishes like (true) from dislike (false); a post
/// with no row from a given account has no reaction at all.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Like {
    pub id: i64,
    pub post_id: i64,
    pub user_id: Option<i64>,
    pub like_status: bool,
    pub post_title: Option<String>,
    pub username: Option<String>,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Followers
// =============================================================================

/// A directed follow edge between two accounts.
///
/// The `(follower_id, following_id)` pair is unique. Nothing prevents a
/// self-follow; the original schema leaves that gap open and so does this
/// one.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Follower {
    pub id: i64,
    pub follower_id: i64,
    pub following_id: i64,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Verification / reset tokens
// =============================================================================

/// An email-verification token row; cascade-deleted with its account.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct VerificationToken {
    pub id: i64,
    pub account_id: i64,
    pub username: Option<String>,
    pub email: Option<String>,
    pub verification_token: String,
    pub verification_sent_time: Option<DateTime<Utc>>,
    pub verification_token_expiration: DateTime<Utc>,
}

/// A password-reset token row; cascade-deleted with its account.
///
/// `command_output` is an operational artifact inherited from the original
/// schema, stored and returned verbatim.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ResetToken {
    pub id: i64,
    pub account_id: i64,
    pub username: Option<String>,
    pub email: Option<String>,
    pub reset_password_token: String,
    pub reset_password_token_expiration: DateTime<Utc>,
    pub command_output: Option<String>,
}

/// Columns supplied when issuing a reset token.
#[derive(Debug, Clone)]
pub struct NewResetToken {
    pub account_id: i64,
    pub username: Option<String>,
    pub email: Option<String>,
    pub reset_password_token: String,
    pub reset_password_token_expiration: DateTime<Utc>,
    pub command_output: Option<String>,
}
