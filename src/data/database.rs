//! SQLite database operations
//!
//! All database access goes through this module. Every operation is a thin
//! wrapper over a single SQL statement (or one transaction); constraint
//! enforcement is left entirely to the engine and surfaces as
//! `AppError::Database`.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::path::Path;

use super::models::*;
use crate::error::AppError;

/// Database connection pool wrapper.
pub struct Database {
    pool: Pool<Sqlite>,
}

impl Database {
    /// Connect to the SQLite database at `path`.
    ///
    /// Creates the database file if it doesn't exist and runs pending
    /// migrations automatically. Foreign-key enforcement is switched on for
    /// every connection; without it SQLite ignores the declared cascade and
    /// restrict semantics.
    ///
    /// # Errors
    /// Returns error if connection or migration fails
    pub async fn connect(path: &Path) -> Result<Self, AppError> {
        Self::connect_with_pool_size(path, 5).await
    }

    /// Connect with an explicit pool size (from `database.max_connections`).
    pub async fn connect_with_pool_size(
        path: &Path,
        max_connections: u32,
    ) -> Result<Self, AppError> {
        // Create parent directory if it doesn't exist
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| AppError::Database(sqlx::Error::Io(e)))?;
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await?;

        // Run migrations
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| {
                tracing::error!("Migration failed: {}", e);
                AppError::Internal(anyhow::anyhow!("Migration failed: {}", e))
            })?;

        tracing::info!("Database connected and migrated successfully");

        Ok(Self { pool })
    }

    // =========================================================================
    // Accounts
    // =========================================================================

    /// Insert a new account and return its id.
    ///
    /// `user_verified`, `role`, `tfa` and `registration_date` take their
    /// database defaults (false, 'user', 'F', CURRENT_TIMESTAMP). Duplicate
    /// usernames, emails, or active security pins fail with a uniqueness
    /// violation.
    pub async fn insert_account(&self, account: &NewAccount) -> Result<i64, AppError> {
        let result = sqlx::query(
            r#"
            INSERT INTO accounts (
                email, first_name, last_name, username, password,
                country, day, month, year, security_pin
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&account.email)
        .bind(&account.first_name)
        .bind(&account.last_name)
        .bind(&account.username)
        .bind(&account.password)
        .bind(&account.country)
        .bind(account.day)
        .bind(account.month)
        .bind(account.year)
        .bind(&account.security_pin)
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_rowid();
        tracing::info!(account_id = id, "Account created");
        Ok(id)
    }

    /// Get an account by id.
    pub async fn get_account(&self, id: i64) -> Result<Option<Account>, AppError> {
        let account = sqlx::query_as::<_, Account>("SELECT * FROM accounts WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(account)
    }

    /// Get an account by username.
    pub async fn get_account_by_username(
        &self,
        username: &str,
    ) -> Result<Option<Account>, AppError> {
        let account = sqlx::query_as::<_, Account>("SELECT * FROM accounts WHERE username = ?")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;

        Ok(account)
    }

    /// Get an account by email.
    pub async fn get_account_by_email(&self, email: &str) -> Result<Option<Account>, AppError> {
        let account = sqlx::query_as::<_, Account>("SELECT * FROM accounts WHERE email = ?")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        Ok(account)
    }

    /// Replace the stored password hash.
    ///
    /// # Returns
    /// `true` if updated, `false` if no matching account row exists.
    pub async fn update_password(&self, account_id: i64, password: &str) -> Result<bool, AppError> {
        let result = sqlx::query("UPDATE accounts SET password = ? WHERE id = ?")
            .bind(password)
            .bind(account_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Mark an account's email as verified (or unverified).
    pub async fn set_user_verified(
        &self,
        account_id: i64,
        verified: bool,
    ) -> Result<bool, AppError> {
        let result = sqlx::query("UPDATE accounts SET user_verified = ? WHERE id = ?")
            .bind(verified)
            .bind(account_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Set the two-factor flag, 'T' or 'F'.
    pub async fn set_tfa(&self, account_id: i64, tfa: &str) -> Result<bool, AppError> {
        if tfa != "T" && tfa != "F" {
            return Err(AppError::Validation(format!(
                "tfa flag must be \"T\" or \"F\", got {tfa:?}"
            )));
        }

        let result = sqlx::query("UPDATE accounts SET tfa = ? WHERE id = ?")
            .bind(tfa)
            .bind(account_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Store a pending two-factor login token and its timestamp.
    pub async fn set_auth_token(
        &self,
        account_id: i64,
        token: &str,
        issued_at: DateTime<Utc>,
    ) -> Result<bool, AppError> {
        let result = sqlx::query("UPDATE accounts SET auth_token = ?, ttmp = ? WHERE id = ?")
            .bind(token)
            .bind(issued_at)
            .bind(account_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Clear any pending two-factor login token.
    pub async fn clear_auth_token(&self, account_id: i64) -> Result<bool, AppError> {
        let result =
            sqlx::query("UPDATE accounts SET auth_token = NULL, ttmp = NULL WHERE id = ?")
                .bind(account_id)
                .execute(&self.pool)
                .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Update the profile picture path.
    pub async fn update_profile_picture(
        &self,
        account_id: i64,
        profile_picture: Option<&str>,
    ) -> Result<bool, AppError> {
        let result = sqlx::query("UPDATE accounts SET profile_picture = ? WHERE id = ?")
            .bind(profile_picture)
            .bind(account_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Check whether a security pin is in use by any account whose pin has
    /// not been soft-deleted.
    pub async fn is_security_pin_active(&self, security_pin: &str) -> Result<bool, AppError> {
        let row: Option<i64> = sqlx::query_scalar(
            "SELECT 1 FROM accounts WHERE security_pin = ? AND pin_deleted_at IS NULL",
        )
        .bind(security_pin)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.is_some())
    }

    /// Soft-delete an account's security pin.
    ///
    /// Sets `pin_deleted_at`, which frees the pin's uniqueness slot while
    /// keeping the row (and the pin value) for history.
    pub async fn retire_security_pin(
        &self,
        account_id: i64,
        deleted_at: DateTime<Utc>,
    ) -> Result<bool, AppError> {
        let result = sqlx::query("UPDATE accounts SET pin_deleted_at = ? WHERE id = ?")
            .bind(deleted_at)
            .bind(account_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Archive an account into `deleted_accounts`, then delete it.
    ///
    /// Single transaction: the copy and the delete commit together or not at
    /// all. Tokens and reset tokens cascade with the delete; posts, comments,
    /// likes and follow edges do NOT, so the delete is rejected with a
    /// foreign-key violation while any of those still reference the account.
    /// The caller decides what to do about dependents first.
    pub async fn archive_account(
        &self,
        account_id: i64,
        deleted_date: NaiveDate,
        deletion_reason: Option<&str>,
    ) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        let copied = sqlx::query(
            r#"
            INSERT INTO deleted_accounts (
                email, username, first_name, last_name,
                country, day, month, year, deleted_date, deletion_reason
            )
            SELECT email, username, first_name, last_name,
                   country, day, month, year, ?, ?
            FROM accounts WHERE id = ?
            "#,
        )
        .bind(deleted_date)
        .bind(deletion_reason)
        .bind(account_id)
        .execute(&mut *tx)
        .await?;

        if copied.rows_affected() != 1 {
            return Err(AppError::NotFound);
        }

        sqlx::query("DELETE FROM accounts WHERE id = ?")
            .bind(account_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::info!(account_id, "Account archived and deleted");
        Ok(())
    }

    /// List archived accounts, newest first.
    pub async fn list_deleted_accounts(&self) -> Result<Vec<DeletedAccount>, AppError> {
        let rows = sqlx::query_as::<_, DeletedAccount>(
            "SELECT * FROM deleted_accounts ORDER BY id DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Count archived accounts.
    pub async fn count_deleted_accounts(&self) -> Result<i64, AppError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM deleted_accounts")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    // =========================================================================
    // Posts
    // =========================================================================

    /// Insert a new post and return its id.
    pub async fn insert_post(&self, post: &NewPost) -> Result<i64, AppError> {
        let result = sqlx::query(
            r#"
            INSERT INTO posts (
                user_id, email, first_name, last_name,
                title, content, display_style, category
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(post.user_id)
        .bind(&post.email)
        .bind(&post.first_name)
        .bind(&post.last_name)
        .bind(&post.title)
        .bind(&post.content)
        .bind(&post.display_style)
        .bind(&post.category)
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// Get a post by id.
    pub async fn get_post(&self, id: i64) -> Result<Option<Post>, AppError> {
        let post = sqlx::query_as::<_, Post>("SELECT * FROM posts WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(post)
    }

    /// List an account's posts, newest first.
    pub async fn list_posts_by_account(
        &self,
        user_id: i64,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Post>, AppError> {
        let posts = sqlx::query_as::<_, Post>(
            "SELECT * FROM posts WHERE user_id = ? ORDER BY created_at DESC LIMIT ? OFFSET ?",
        )
        .bind(user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(posts)
    }

    /// Count an account's posts.
    pub async fn count_posts_by_account(&self, user_id: i64) -> Result<i64, AppError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM posts WHERE user_id = ?")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    /// Replace a post's title and content, marking it edited.
    pub async fn edit_post(
        &self,
        post_id: i64,
        title: &str,
        content: &str,
        edited_at: DateTime<Utc>,
    ) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE posts
            SET content = ?, title = ?, edited_at = ?, is_edited = TRUE
            WHERE id = ?
            "#,
        )
        .bind(content)
        .bind(title)
        .bind(edited_at)
        .bind(post_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Delete a post. Its comments and likes cascade with it.
    pub async fn delete_post(&self, post_id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM posts WHERE id = ?")
            .bind(post_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() == 1)
    }

    // =========================================================================
    // Comments
    // =========================================================================

    /// Insert a comment and return its id.
    ///
    /// `username`, `email` and `post_title` are denormalized copies the
    /// caller captured at write time; the schema never back-fills them.
    pub async fn insert_comment(&self, comment: &NewComment) -> Result<i64, AppError> {
        let result = sqlx::query(
            r#"
            INSERT INTO comments (post_id, user_id, username, email, content, post_title)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(comment.post_id)
        .bind(comment.user_id)
        .bind(&comment.username)
        .bind(&comment.email)
        .bind(&comment.content)
        .bind(&comment.post_title)
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// List a post's comments, oldest first.
    pub async fn list_comments_for_post(&self, post_id: i64) -> Result<Vec<Comment>, AppError> {
        let comments = sqlx::query_as::<_, Comment>(
            "SELECT * FROM comments WHERE post_id = ? ORDER BY created_at ASC, id ASC",
        )
        .bind(post_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(comments)
    }

    /// Delete a single comment.
    pub async fn delete_comment(&self, comment_id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM comments WHERE id = ?")
            .bind(comment_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() == 1)
    }

    // =========================================================================
    // Likes
    // =========================================================================

    /// Get an account's reaction to a post, if any.
    pub async fn get_like(&self, post_id: i64, user_id: i64) -> Result<Option<Like>, AppError> {
        let like =
            sqlx::query_as::<_, Like>("SELECT * FROM likes WHERE post_id = ? AND user_id = ?")
                .bind(post_id)
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(like)
    }

    /// Record a reaction, updating the existing row if one exists.
    ///
    /// The denormalized `post_title` and `username` are refreshed on update,
    /// matching how the original application writes this table.
    pub async fn set_like(
        &self,
        post_id: i64,
        user_id: i64,
        like_status: bool,
        post_title: Option<&str>,
        username: Option<&str>,
    ) -> Result<i64, AppError> {
        if let Some(existing) = self.get_like(post_id, user_id).await? {
            sqlx::query(
                "UPDATE likes SET like_status = ?, post_title = ?, username = ? WHERE id = ?",
            )
            .bind(like_status)
            .bind(post_title)
            .bind(username)
            .bind(existing.id)
            .execute(&self.pool)
            .await?;

            return Ok(existing.id);
        }

        let result = sqlx::query(
            r#"
            INSERT INTO likes (post_id, user_id, like_status, post_title, username)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(post_id)
        .bind(user_id)
        .bind(like_status)
        .bind(post_title)
        .bind(username)
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// Count likes on a post (`like_status = TRUE` only).
    pub async fn count_likes(&self, post_id: i64) -> Result<i64, AppError> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(id) FROM likes WHERE post_id = ? AND like_status = TRUE",
        )
        .bind(post_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    /// Count dislikes on a post.
    pub async fn count_dislikes(&self, post_id: i64) -> Result<i64, AppError> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(id) FROM likes WHERE post_id = ? AND like_status = FALSE",
        )
        .bind(post_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    // =========================================================================
    // Followers
    // =========================================================================

    /// Insert a follow edge and return its id.
    ///
    /// A duplicate `(follower_id, following_id)` pair fails with a
    /// uniqueness violation.
    pub async fn follow(&self, follower_id: i64, following_id: i64) -> Result<i64, AppError> {
        let result =
            sqlx::query("INSERT INTO followers (follower_id, following_id) VALUES (?, ?)")
                .bind(follower_id)
                .bind(following_id)
                .execute(&self.pool)
                .await?;

        Ok(result.last_insert_rowid())
    }

    /// Remove a follow edge.
    pub async fn unfollow(&self, follower_id: i64, following_id: i64) -> Result<bool, AppError> {
        let result =
            sqlx::query("DELETE FROM followers WHERE follower_id = ? AND following_id = ?")
                .bind(follower_id)
                .bind(following_id)
                .execute(&self.pool)
                .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Check whether one account follows another.
    pub async fn is_following(&self, follower_id: i64, following_id: i64) -> Result<bool, AppError> {
        let row: Option<i64> = sqlx::query_scalar(
            "SELECT 1 FROM followers WHERE follower_id = ? AND following_id = ?",
        )
        .bind(follower_id)
        .bind(following_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.is_some())
    }

    /// Number of accounts following `user_id`.
    pub async fn follower_count(&self, user_id: i64) -> Result<i64, AppError> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM followers WHERE following_id = ?")
                .bind(user_id)
                .fetch_one(&self.pool)
                .await?;

        Ok(count)
    }

    /// Number of accounts `user_id` follows.
    pub async fn following_count(&self, user_id: i64) -> Result<i64, AppError> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM followers WHERE follower_id = ?")
                .bind(user_id)
                .fetch_one(&self.pool)
                .await?;

        Ok(count)
    }

    // =========================================================================
    // Verification tokens
    // =========================================================================

    /// Store a verification token for an account.
    ///
    /// Updates the account's existing token row if one exists, otherwise
    /// inserts one. Returns `true` if a new row was inserted.
    pub async fn upsert_verification_token(
        &self,
        token: &VerificationToken,
    ) -> Result<bool, AppError> {
        let updated = sqlx::query(
            r#"
            UPDATE tokens
            SET username = ?, email = ?, verification_token = ?,
                verification_sent_time = ?, verification_token_expiration = ?
            WHERE account_id = ?
            "#,
        )
        .bind(&token.username)
        .bind(&token.email)
        .bind(&token.verification_token)
        .bind(token.verification_sent_time)
        .bind(token.verification_token_expiration)
        .bind(token.account_id)
        .execute(&self.pool)
        .await?;

        if updated.rows_affected() > 0 {
            return Ok(false);
        }

        sqlx::query(
            r#"
            INSERT INTO tokens (
                account_id, username, email, verification_token,
                verification_sent_time, verification_token_expiration
            ) VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(token.account_id)
        .bind(&token.username)
        .bind(&token.email)
        .bind(&token.verification_token)
        .bind(token.verification_sent_time)
        .bind(token.verification_token_expiration)
        .execute(&self.pool)
        .await?;

        Ok(true)
    }

    /// Look up a token row by its verification token value.
    pub async fn get_token_by_verification_token(
        &self,
        verification_token: &str,
    ) -> Result<Option<VerificationToken>, AppError> {
        let token = sqlx::query_as::<_, VerificationToken>(
            "SELECT * FROM tokens WHERE verification_token = ?",
        )
        .bind(verification_token)
        .fetch_optional(&self.pool)
        .await?;

        Ok(token)
    }

    /// Delete all verification tokens belonging to an account.
    pub async fn delete_tokens_for_account(&self, account_id: i64) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM tokens WHERE account_id = ?")
            .bind(account_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    /// Delete verification tokens that expired before `now`.
    ///
    /// # Returns
    /// Number of rows removed.
    pub async fn purge_expired_tokens(&self, now: DateTime<Utc>) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM tokens WHERE verification_token_expiration < ?")
            .bind(now)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() > 0 {
            tracing::debug!(purged = result.rows_affected(), "Expired tokens removed");
        }
        Ok(result.rows_affected())
    }

    // =========================================================================
    // Reset tokens
    // =========================================================================

    /// Insert a password-reset token and return its id.
    pub async fn insert_reset_token(&self, token: &NewResetToken) -> Result<i64, AppError> {
        let result = sqlx::query(
            r#"
            INSERT INTO reset_tokens (
                account_id, username, email, reset_password_token,
                reset_password_token_expiration, command_output
            ) VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(token.account_id)
        .bind(&token.username)
        .bind(&token.email)
        .bind(&token.reset_password_token)
        .bind(token.reset_password_token_expiration)
        .bind(&token.command_output)
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// Look up a reset token row by its token value.
    pub async fn get_reset_token(
        &self,
        reset_password_token: &str,
    ) -> Result<Option<ResetToken>, AppError> {
        let token = sqlx::query_as::<_, ResetToken>(
            "SELECT * FROM reset_tokens WHERE reset_password_token = ?",
        )
        .bind(reset_password_token)
        .fetch_optional(&self.pool)
        .await?;

        Ok(token)
    }

    /// Delete a reset token by its token value.
    pub async fn delete_reset_token(&self, reset_password_token: &str) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM reset_tokens WHERE reset_password_token = ?")
            .bind(reset_password_token)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Delete reset tokens that expired before `now`.
    pub async fn purge_expired_reset_tokens(&self, now: DateTime<Utc>) -> Result<u64, AppError> {
        let result =
            sqlx::query("DELETE FROM reset_tokens WHERE reset_password_token_expiration < ?")
                .bind(now)
                .execute(&self.pool)
                .await?;

        Ok(result.rows_affected())
    }

    // =========================================================================
    // Maintenance
    // =========================================================================

    /// Row counts per table, used by the migration binary's startup report.
    pub async fn table_counts(&self) -> Result<Vec<(&'static str, i64)>, AppError> {
        let tables = [
            "accounts",
            "deleted_accounts",
            "posts",
            "comments",
            "likes",
            "followers",
            "tokens",
            "reset_tokens",
        ];

        let mut counts = Vec::with_capacity(tables.len());
        for table in tables {
            let count: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
                .fetch_one(&self.pool)
                .await?;
            counts.push((table, count));
        }

        Ok(counts)
    }
}
