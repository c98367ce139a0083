//! Assessment documents
//!
//! Each row holds the whole [`Assessment`] as JSON in `document`; `guid`,
//! `user_guid` and `slug` are copies kept for lookups and the unique slug
//! constraint.

use pathway_common::models::Assessment;
use pathway_common::Result;
use sqlx::{Executor, Sqlite, SqlitePool};

fn decode(document: &str) -> Result<Assessment> {
    Ok(serde_json::from_str(document)?)
}

/// All assessments owned by `user_id`, newest first
pub async fn list_for_user(pool: &SqlitePool, user_id: &str) -> Result<Vec<Assessment>> {
    let documents: Vec<String> = sqlx::query_scalar(
        "SELECT document FROM assessments WHERE user_guid = ? ORDER BY created_at DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    documents.iter().map(|d| decode(d)).collect()
}

pub async fn find_by_slug(pool: &SqlitePool, slug: &str) -> Result<Option<Assessment>> {
    let document: Option<String> =
        sqlx::query_scalar("SELECT document FROM assessments WHERE slug = ?")
            .bind(slug)
            .fetch_optional(pool)
            .await?;

    document.as_deref().map(decode).transpose()
}

pub async fn find_by_id(pool: &SqlitePool, id: &str) -> Result<Option<Assessment>> {
    let document: Option<String> =
        sqlx::query_scalar("SELECT document FROM assessments WHERE guid = ?")
            .bind(id)
            .fetch_optional(pool)
            .await?;

    document.as_deref().map(decode).transpose()
}

/// Whether `slug` is used by an assessment other than `except_id`
pub async fn slug_taken(pool: &SqlitePool, slug: &str, except_id: Option<&str>) -> Result<bool> {
    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM assessments WHERE slug = ? AND guid != ?")
            .bind(slug)
            .bind(except_id.unwrap_or(""))
            .fetch_one(pool)
            .await?;

    Ok(count > 0)
}

pub async fn insert<'e, E>(executor: E, assessment: &Assessment) -> Result<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        r#"
        INSERT INTO assessments (guid, user_guid, slug, document, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&assessment.id)
    .bind(&assessment.user_id)
    .bind(&assessment.slug)
    .bind(serde_json::to_string(assessment)?)
    .bind(assessment.created_at)
    .bind(assessment.updated_at)
    .execute(executor)
    .await?;

    Ok(())
}

/// Overwrite the stored document; the last writer wins
pub async fn save(pool: &SqlitePool, assessment: &Assessment) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE assessments
        SET slug = ?, document = ?, updated_at = ?
        WHERE guid = ?
        "#,
    )
    .bind(&assessment.slug)
    .bind(serde_json::to_string(assessment)?)
    .bind(assessment.updated_at)
    .bind(&assessment.id)
    .execute(pool)
    .await?;

    Ok(())
}

/// Delete one assessment (its leads cascade); returns whether a row went away
pub async fn delete(pool: &SqlitePool, id: &str) -> Result<bool> {
    let result = sqlx::query("DELETE FROM assessments WHERE guid = ?")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use pathway_common::db::init_schema;
    use pathway_common::models::{Audience, Question, QuestionType};
    use sqlx::sqlite::SqlitePoolOptions;

    async fn setup() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        init_schema(&pool).await.unwrap();
        sqlx::query("INSERT INTO users (guid, email, password_hash) VALUES ('u1', 'a@b.c', 'x')")
            .execute(&pool)
            .await
            .unwrap();
        pool
    }

    fn assessment(id: &str, slug: &str) -> Assessment {
        let now = Utc::now();
        Assessment {
            id: id.to_string(),
            user_id: "u1".to_string(),
            slug: slug.to_string(),
            title: "Title".to_string(),
            description: String::new(),
            audience: Audience::Business,
            tags: vec!["t".to_string()],
            questions: vec![Question {
                id: 1,
                kind: QuestionType::YesNo,
                question: "Ready?".to_string(),
                voice_script: String::new(),
                options: vec![],
                audio: None,
            }],
            booking_link: None,
            welcome_message: String::new(),
            keep_going_message: String::new(),
            congratulation_message: String::new(),
            contact_message: String::new(),
            image: None,
            welcome_message_audio: None,
            keep_going_message_audio: None,
            congratulation_message_audio: None,
            contact_message_audio: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_insert_and_lookup() {
        let pool = setup().await;
        let a = assessment("a1", "intro");
        insert(&pool, &a).await.unwrap();

        assert_eq!(find_by_slug(&pool, "intro").await.unwrap(), Some(a.clone()));
        assert_eq!(find_by_id(&pool, "a1").await.unwrap(), Some(a));
        assert_eq!(find_by_slug(&pool, "other").await.unwrap(), None);
        assert_eq!(list_for_user(&pool, "u1").await.unwrap().len(), 1);
        assert!(list_for_user(&pool, "u2").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_slug_taken_excludes_self() {
        let pool = setup().await;
        insert(&pool, &assessment("a1", "intro")).await.unwrap();

        assert!(slug_taken(&pool, "intro", None).await.unwrap());
        assert!(!slug_taken(&pool, "intro", Some("a1")).await.unwrap());
        assert!(!slug_taken(&pool, "free", None).await.unwrap());
    }

    #[tokio::test]
    async fn test_save_updates_slug_column() {
        let pool = setup().await;
        let mut a = assessment("a1", "intro");
        insert(&pool, &a).await.unwrap();

        a.slug = "renamed".to_string();
        a.title = "New".to_string();
        save(&pool, &a).await.unwrap();

        assert_eq!(find_by_slug(&pool, "intro").await.unwrap(), None);
        assert_eq!(find_by_slug(&pool, "renamed").await.unwrap().unwrap().title, "New");
    }

    #[tokio::test]
    async fn test_delete() {
        let pool = setup().await;
        insert(&pool, &assessment("a1", "intro")).await.unwrap();

        assert!(delete(&pool, "a1").await.unwrap());
        assert!(!delete(&pool, "a1").await.unwrap());
    }
}
