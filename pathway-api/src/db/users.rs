//! User accounts

use chrono::Utc;
use pathway_common::Result;
use sqlx::SqlitePool;
use uuid::Uuid;

/// Stored credentials of one account
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserRecord {
    pub guid: String,
    pub email: String,
    pub password_hash: String,
}

/// Look up an account by e-mail (case-insensitive)
pub async fn find_by_email(pool: &SqlitePool, email: &str) -> Result<Option<UserRecord>> {
    let user = sqlx::query_as::<_, UserRecord>(
        "SELECT guid, email, password_hash FROM users WHERE email = ?",
    )
    .bind(email)
    .fetch_optional(pool)
    .await?;

    Ok(user)
}

/// Insert an account, returning its guid.
///
/// `Ok(None)` when the e-mail is already registered.
pub async fn create(pool: &SqlitePool, email: &str, password_hash: &str) -> Result<Option<String>> {
    let guid = Uuid::new_v4().to_string();
    let now = Utc::now();

    let result = sqlx::query(
        r#"
        INSERT OR IGNORE INTO users (guid, email, password_hash, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(&guid)
    .bind(email)
    .bind(password_hash)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;

    Ok((result.rows_affected() == 1).then_some(guid))
}
