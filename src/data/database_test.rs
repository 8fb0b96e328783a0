//! Database tests

use super::*;
use chrono::{Duration, Utc};
use tempfile::TempDir;

/// Helper to create a test database
async fn create_test_db() -> (Database, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("test.db");
    let db = Database::connect(&db_path).await.unwrap();
    (db, temp_dir)
}

fn new_account(username: &str, email: &str, pin: &str) -> NewAccount {
    NewAccount {
        email: email.to_string(),
        first_name: "Test".to_string(),
        last_name: "User".to_string(),
        username: username.to_string(),
        password: "pbkdf2:sha256$notarealhash".to_string(),
        country: Some("Kenya".to_string()),
        day: Some(12),
        month: Some(4),
        year: Some(1990),
        security_pin: pin.to_string(),
    }
}

fn new_post(user_id: i64, title: &str) -> NewPost {
    NewPost {
        user_id: Some(user_id),
        email: Some("author@example.com".to_string()),
        first_name: Some("Test".to_string()),
        last_name: Some("User".to_string()),
        title: title.to_string(),
        content: "Some content".to_string(),
        display_style: Some("default".to_string()),
        category: Some("general".to_string()),
    }
}

#[tokio::test]
async fn test_database_connection() {
    let (_db, _temp_dir) = create_test_db().await;
    // Connection successful if we get here without panicking
}

#[tokio::test]
async fn test_account_insert_and_get() {
    let (db, _temp_dir) = create_test_db().await;

    let id = db
        .insert_account(&new_account("alice", "alice@example.com", "1111"))
        .await
        .unwrap();

    let account = db.get_account(id).await.unwrap().unwrap();
    assert_eq!(account.username, "alice");
    assert_eq!(account.email, "alice@example.com");

    // Database-side defaults
    assert_eq!(account.role, "user");
    assert_eq!(account.tfa, "F");
    assert!(!account.user_verified);
    assert!(account.pin_deleted_at.is_none());
    assert!(account.auth_token.is_none());

    let by_username = db.get_account_by_username("alice").await.unwrap().unwrap();
    assert_eq!(by_username.id, id);
    let by_email = db
        .get_account_by_email("alice@example.com")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(by_email.id, id);

    assert!(db.get_account(id + 1).await.unwrap().is_none());
}

#[tokio::test]
async fn test_account_field_updates() {
    let (db, _temp_dir) = create_test_db().await;

    let id = db
        .insert_account(&new_account("bob", "bob@example.com", "2222"))
        .await
        .unwrap();

    assert!(db.update_password(id, "newhash").await.unwrap());
    assert!(db.set_user_verified(id, true).await.unwrap());
    assert!(db.set_tfa(id, "T").await.unwrap());
    assert!(db
        .update_profile_picture(id, Some("uploads/bob.png"))
        .await
        .unwrap());
    assert!(db.set_auth_token(id, "123456", Utc::now()).await.unwrap());

    let account = db.get_account(id).await.unwrap().unwrap();
    assert_eq!(account.password, "newhash");
    assert!(account.user_verified);
    assert_eq!(account.tfa, "T");
    assert_eq!(account.profile_picture.as_deref(), Some("uploads/bob.png"));
    assert_eq!(account.auth_token.as_deref(), Some("123456"));
    assert!(account.ttmp.is_some());

    assert!(db.clear_auth_token(id).await.unwrap());
    let account = db.get_account(id).await.unwrap().unwrap();
    assert!(account.auth_token.is_none());
    assert!(account.ttmp.is_none());

    // Updates against a missing row report false, not an error
    assert!(!db.update_password(id + 1, "x").await.unwrap());
}

#[tokio::test]
async fn test_set_tfa_rejects_bad_flag() {
    let (db, _temp_dir) = create_test_db().await;

    let id = db
        .insert_account(&new_account("carol", "carol@example.com", "3333"))
        .await
        .unwrap();

    let error = db.set_tfa(id, "yes").await.unwrap_err();
    assert!(matches!(error, crate::error::AppError::Validation(_)));
}

#[tokio::test]
async fn test_security_pin_soft_delete() {
    let (db, _temp_dir) = create_test_db().await;

    let id = db
        .insert_account(&new_account("dave", "dave@example.com", "4444"))
        .await
        .unwrap();

    assert!(db.is_security_pin_active("4444").await.unwrap());
    assert!(db.retire_security_pin(id, Utc::now()).await.unwrap());
    assert!(!db.is_security_pin_active("4444").await.unwrap());

    // The retired pin's slot is free again
    db.insert_account(&new_account("erin", "erin@example.com", "4444"))
        .await
        .unwrap();
    assert!(db.is_security_pin_active("4444").await.unwrap());
}

#[tokio::test]
async fn test_archive_account() {
    let (db, _temp_dir) = create_test_db().await;

    let id = db
        .insert_account(&new_account("frank", "frank@example.com", "5555"))
        .await
        .unwrap();

    db.archive_account(id, Utc::now().date_naive(), Some("left the platform"))
        .await
        .unwrap();

    assert!(db.get_account(id).await.unwrap().is_none());
    assert_eq!(db.count_deleted_accounts().await.unwrap(), 1);

    let archived = db.list_deleted_accounts().await.unwrap();
    assert_eq!(archived[0].username, "frank");
    assert_eq!(archived[0].email, "frank@example.com");
    assert_eq!(
        archived[0].deletion_reason.as_deref(),
        Some("left the platform")
    );
}

#[tokio::test]
async fn test_archive_missing_account_is_not_found() {
    let (db, _temp_dir) = create_test_db().await;

    let error = db
        .archive_account(42, Utc::now().date_naive(), None)
        .await
        .unwrap_err();
    assert!(matches!(error, crate::error::AppError::NotFound));
    assert_eq!(db.count_deleted_accounts().await.unwrap(), 0);
}

#[tokio::test]
async fn test_post_crud() {
    let (db, _temp_dir) = create_test_db().await;

    let user_id = db
        .insert_account(&new_account("grace", "grace@example.com", "6666"))
        .await
        .unwrap();

    let post_id = db.insert_post(&new_post(user_id, "First post")).await.unwrap();

    let post = db.get_post(post_id).await.unwrap().unwrap();
    assert_eq!(post.title, "First post");
    assert_eq!(post.user_id, Some(user_id));
    assert!(!post.is_edited);
    assert!(post.edited_at.is_none());

    assert!(db
        .edit_post(post_id, "First post (edited)", "New content", Utc::now())
        .await
        .unwrap());
    let post = db.get_post(post_id).await.unwrap().unwrap();
    assert_eq!(post.title, "First post (edited)");
    assert_eq!(post.content, "New content");
    assert!(post.is_edited);
    assert!(post.edited_at.is_some());

    db.insert_post(&new_post(user_id, "Second post")).await.unwrap();
    assert_eq!(db.count_posts_by_account(user_id).await.unwrap(), 2);
    let page = db.list_posts_by_account(user_id, 1, 0).await.unwrap();
    assert_eq!(page.len(), 1);
    let rest = db.list_posts_by_account(user_id, 10, 1).await.unwrap();
    assert_eq!(rest.len(), 1);

    assert!(db.delete_post(post_id).await.unwrap());
    assert!(db.get_post(post_id).await.unwrap().is_none());
    assert_eq!(db.count_posts_by_account(user_id).await.unwrap(), 1);
}

#[tokio::test]
async fn test_comment_crud() {
    let (db, _temp_dir) = create_test_db().await;

    let user_id = db
        .insert_account(&new_account("heidi", "heidi@example.com", "7777"))
        .await
        .unwrap();
    let post_id = db.insert_post(&new_post(user_id, "A post")).await.unwrap();

    let comment_id = db
        .insert_comment(&NewComment {
            post_id,
            user_id: Some(user_id),
            username: Some("heidi".to_string()),
            email: Some("heidi@example.com".to_string()),
            content: "Nice post".to_string(),
            post_title: Some("A post".to_string()),
        })
        .await
        .unwrap();

    let comments = db.list_comments_for_post(post_id).await.unwrap();
    assert_eq!(comments.len(), 1);
    assert_eq!(comments[0].content, "Nice post");
    assert_eq!(comments[0].username.as_deref(), Some("heidi"));
    assert_eq!(comments[0].post_title.as_deref(), Some("A post"));

    assert!(db.delete_comment(comment_id).await.unwrap());
    assert!(db.list_comments_for_post(post_id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_like_upsert_and_counts() {
    let (db, _temp_dir) = create_test_db().await;

    let user_id = db
        .insert_account(&new_account("ivan", "ivan@example.com", "8888"))
        .await
        .unwrap();
    let post_id = db.insert_post(&new_post(user_id, "Likeable")).await.unwrap();

    let like_id = db
        .set_like(post_id, user_id, true, Some("Likeable"), Some("ivan"))
        .await
        .unwrap();
    assert_eq!(db.count_likes(post_id).await.unwrap(), 1);
    assert_eq!(db.count_dislikes(post_id).await.unwrap(), 0);

    // Flipping the reaction updates the same row
    let same_id = db
        .set_like(post_id, user_id, false, Some("Likeable"), Some("ivan"))
        .await
        .unwrap();
    assert_eq!(like_id, same_id);
    assert_eq!(db.count_likes(post_id).await.unwrap(), 0);
    assert_eq!(db.count_dislikes(post_id).await.unwrap(), 1);

    let like = db.get_like(post_id, user_id).await.unwrap().unwrap();
    assert!(!like.like_status);
}

#[tokio::test]
async fn test_follow_operations() {
    let (db, _temp_dir) = create_test_db().await;

    let alice = db
        .insert_account(&new_account("alice", "alice@example.com", "1010"))
        .await
        .unwrap();
    let bob = db
        .insert_account(&new_account("bob", "bob@example.com", "2020"))
        .await
        .unwrap();

    db.follow(alice, bob).await.unwrap();
    assert!(db.is_following(alice, bob).await.unwrap());
    assert!(!db.is_following(bob, alice).await.unwrap());
    assert_eq!(db.follower_count(bob).await.unwrap(), 1);
    assert_eq!(db.following_count(alice).await.unwrap(), 1);

    assert!(db.unfollow(alice, bob).await.unwrap());
    assert!(!db.is_following(alice, bob).await.unwrap());
    assert_eq!(db.follower_count(bob).await.unwrap(), 0);
}

#[tokio::test]
async fn test_verification_token_upsert_and_purge() {
    let (db, _temp_dir) = create_test_db().await;

    let account_id = db
        .insert_account(&new_account("judy", "judy@example.com", "3030"))
        .await
        .unwrap();

    let token = VerificationToken {
        id: 0,
        account_id,
        username: Some("judy".to_string()),
        email: Some("judy@example.com".to_string()),
        verification_token: "tok-one".to_string(),
        verification_sent_time: Some(Utc::now()),
        verification_token_expiration: Utc::now() + Duration::hours(24),
    };
    assert!(db.upsert_verification_token(&token).await.unwrap());

    // Re-issuing replaces the account's row instead of adding one
    let reissued = VerificationToken {
        verification_token: "tok-two".to_string(),
        ..token.clone()
    };
    assert!(!db.upsert_verification_token(&reissued).await.unwrap());
    assert!(db
        .get_token_by_verification_token("tok-one")
        .await
        .unwrap()
        .is_none());
    let fetched = db
        .get_token_by_verification_token("tok-two")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(fetched.account_id, account_id);

    // Not yet expired
    assert_eq!(db.purge_expired_tokens(Utc::now()).await.unwrap(), 0);
    assert_eq!(
        db.purge_expired_tokens(Utc::now() + Duration::hours(48))
            .await
            .unwrap(),
        1
    );

    assert!(db.upsert_verification_token(&token).await.unwrap());
    assert_eq!(db.delete_tokens_for_account(account_id).await.unwrap(), 1);
}

#[tokio::test]
async fn test_reset_token_lifecycle() {
    let (db, _temp_dir) = create_test_db().await;

    let account_id = db
        .insert_account(&new_account("mallory", "mallory@example.com", "4040"))
        .await
        .unwrap();

    db.insert_reset_token(&NewResetToken {
        account_id,
        username: Some("mallory".to_string()),
        email: Some("mallory@example.com".to_string()),
        reset_password_token: "reset-abc".to_string(),
        reset_password_token_expiration: Utc::now() + Duration::hours(1),
        command_output: None,
    })
    .await
    .unwrap();

    let token = db.get_reset_token("reset-abc").await.unwrap().unwrap();
    assert_eq!(token.account_id, account_id);
    assert!(token.command_output.is_none());

    assert!(db.delete_reset_token("reset-abc").await.unwrap());
    assert!(db.get_reset_token("reset-abc").await.unwrap().is_none());

    db.insert_reset_token(&NewResetToken {
        account_id,
        username: None,
        email: None,
        reset_password_token: "reset-expired".to_string(),
        reset_password_token_expiration: Utc::now() - Duration::hours(1),
        command_output: Some("mail queued".to_string()),
    })
    .await
    .unwrap();
    assert_eq!(db.purge_expired_reset_tokens(Utc::now()).await.unwrap(), 1);
}

#[tokio::test]
async fn test_not_null_violation_is_classified() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("test.db");
    let _db = Database::connect(&db_path).await.unwrap();

    // The CRUD surface never passes NULL into a NOT NULL column, so drive
    // the engine directly to provoke the third constraint error class.
    let pool = sqlx::SqlitePool::connect(&format!("sqlite:{}", db_path.display()))
        .await
        .unwrap();
    let error: crate::error::AppError =
        sqlx::query("INSERT INTO posts (title, content) VALUES (NULL, 'body')")
            .execute(&pool)
            .await
            .unwrap_err()
            .into();

    assert!(error.is_not_null_violation());
    assert!(!error.is_unique_violation());
    assert!(!error.is_foreign_key_violation());
}

#[tokio::test]
async fn test_table_counts() {
    let (db, _temp_dir) = create_test_db().await;

    let user_id = db
        .insert_account(&new_account("nina", "nina@example.com", "5050"))
        .await
        .unwrap();
    db.insert_post(&new_post(user_id, "Counted")).await.unwrap();

    let counts = db.table_counts().await.unwrap();
    assert_eq!(counts.len(), 8);
    assert!(counts.contains(&("accounts", 1)));
    assert!(counts.contains(&("posts", 1)));
    assert!(counts.contains(&("likes", 0)));
}
