//! Leads captured at the end of an assessment

use chrono::{DateTime, Utc};
use pathway_common::models::{Audience, Lead, LeadStatus};
use pathway_common::Result;
use sqlx::SqlitePool;

/// Lead row joined with the owning assessment's title and audience
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct LeadRecord {
    pub guid: String,
    pub assessment_guid: String,
    pub assessment_title: Option<String>,
    pub audience: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub score: i64,
    pub status: String,
    pub source: Option<String>,
    pub answers: String,
    pub completed_at: DateTime<Utc>,
}

impl LeadRecord {
    pub fn audience(&self) -> Audience {
        match self.audience.as_deref() {
            Some("business") => Audience::Business,
            _ => Audience::Individual,
        }
    }

    pub fn into_lead(self) -> Lead {
        Lead {
            status: LeadStatus::parse(&self.status).unwrap_or_default(),
            answers: serde_json::from_str(&self.answers).unwrap_or(serde_json::Value::Null),
            id: self.guid,
            assessment_id: self.assessment_guid,
            assessment_title: self.assessment_title,
            first_name: self.first_name,
            last_name: self.last_name,
            email: self.email,
            phone: self.phone,
            score: self.score,
            source: self.source,
            completed_at: self.completed_at,
        }
    }
}

/// Filters of the lead list; `None` means no filter
#[derive(Debug, Clone, Default)]
pub struct LeadFilter {
    /// Case-insensitive substring of first name, last name or e-mail
    pub search: Option<String>,
    pub status: Option<LeadStatus>,
}

const SELECT_LEADS: &str = r#"
    SELECT l.guid, l.assessment_guid,
           json_extract(a.document, '$.title') AS assessment_title,
           json_extract(a.document, '$.audience') AS audience,
           l.first_name, l.last_name, l.email, l.phone, l.score, l.status,
           l.source, l.answers, l.completed_at
    FROM leads l
    JOIN assessments a ON a.guid = l.assessment_guid
"#;

pub async fn insert(pool: &SqlitePool, lead: &Lead) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO leads (guid, assessment_guid, first_name, last_name, email, phone,
                           score, status, source, answers, completed_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&lead.id)
    .bind(&lead.assessment_id)
    .bind(&lead.first_name)
    .bind(&lead.last_name)
    .bind(&lead.email)
    .bind(&lead.phone)
    .bind(lead.score)
    .bind(lead.status.as_str())
    .bind(&lead.source)
    .bind(serde_json::to_string(&lead.answers)?)
    .bind(lead.completed_at)
    .execute(pool)
    .await?;

    Ok(())
}

/// Leads of every assessment owned by `user_id`, most recent first
pub async fn list_for_user(
    pool: &SqlitePool,
    user_id: &str,
    filter: &LeadFilter,
) -> Result<Vec<LeadRecord>> {
    let search = filter
        .search
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| format!("%{}%", escape_like(s)));

    let sql = format!(
        r#"{}
        WHERE a.user_guid = ?1
          AND (?2 IS NULL
               OR l.first_name LIKE ?2 ESCAPE '\'
               OR l.last_name LIKE ?2 ESCAPE '\'
               OR l.email LIKE ?2 ESCAPE '\')
          AND (?3 IS NULL OR l.status = ?3)
        ORDER BY l.completed_at DESC
        "#,
        SELECT_LEADS
    );

    let records = sqlx::query_as::<_, LeadRecord>(&sql)
        .bind(user_id)
        .bind(search)
        .bind(filter.status.map(|s| s.as_str()))
        .fetch_all(pool)
        .await?;

    Ok(records)
}

pub async fn find_by_id(pool: &SqlitePool, id: &str) -> Result<Option<LeadRecord>> {
    let sql = format!("{} WHERE l.guid = ?", SELECT_LEADS);
    let record = sqlx::query_as::<_, LeadRecord>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;

    Ok(record)
}

/// Owner of the assessment a lead belongs to
pub async fn owner_of(pool: &SqlitePool, lead_id: &str) -> Result<Option<String>> {
    let owner: Option<String> = sqlx::query_scalar(
        r#"
        SELECT a.user_guid FROM leads l
        JOIN assessments a ON a.guid = l.assessment_guid
        WHERE l.guid = ?
        "#,
    )
    .bind(lead_id)
    .fetch_optional(pool)
    .await?;

    Ok(owner)
}

pub async fn update_status(pool: &SqlitePool, id: &str, status: LeadStatus) -> Result<()> {
    sqlx::query("UPDATE leads SET status = ? WHERE guid = ?")
        .bind(status.as_str())
        .bind(id)
        .execute(pool)
        .await?;

    Ok(())
}

/// Escape LIKE wildcards so user input matches literally
fn escape_like(s: &str) -> String {
    let mut escaped = String::with_capacity(s.len());
    for c in s.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use pathway_common::db::init_schema;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn setup() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        init_schema(&pool).await.unwrap();

        for (user, assessment, title) in [("u1", "a1", "Career"), ("u2", "a2", "Health")] {
            sqlx::query("INSERT INTO users (guid, email, password_hash) VALUES (?, ?, 'x')")
                .bind(user)
                .bind(format!("{}@example.com", user))
                .execute(&pool)
                .await
                .unwrap();
            sqlx::query(
                "INSERT INTO assessments (guid, user_guid, slug, document, created_at, updated_at)
                 VALUES (?, ?, ?, ?, '2024-01-01', '2024-01-01')",
            )
            .bind(assessment)
            .bind(user)
            .bind(assessment)
            .bind(serde_json::json!({"title": title, "audience": "business"}).to_string())
            .execute(&pool)
            .await
            .unwrap();
        }
        pool
    }

    fn lead(id: &str, assessment: &str, first: &str, email: &str) -> Lead {
        Lead {
            id: id.to_string(),
            assessment_id: assessment.to_string(),
            assessment_title: None,
            first_name: first.to_string(),
            last_name: "Smith".to_string(),
            email: email.to_string(),
            phone: None,
            score: 70,
            status: LeadStatus::New,
            source: Some("facebook".to_string()),
            answers: serde_json::json!({"1": "Yes"}),
            completed_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_list_scoped_to_owner_with_title() {
        let pool = setup().await;
        insert(&pool, &lead("l1", "a1", "Ann", "ann@x.com")).await.unwrap();
        insert(&pool, &lead("l2", "a2", "Bob", "bob@x.com")).await.unwrap();

        let records = list_for_user(&pool, "u1", &LeadFilter::default()).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].assessment_title.as_deref(), Some("Career"));
        assert_eq!(records[0].audience(), Audience::Business);

        let lead = records[0].clone().into_lead();
        assert_eq!(lead.answers["1"], "Yes");
        assert_eq!(lead.source.as_deref(), Some("facebook"));
    }

    #[tokio::test]
    async fn test_search_and_status_filters() {
        let pool = setup().await;
        insert(&pool, &lead("l1", "a1", "Ann", "ann@x.com")).await.unwrap();
        insert(&pool, &lead("l2", "a1", "Carl", "carl@y.com")).await.unwrap();
        update_status(&pool, "l2", LeadStatus::Qualified).await.unwrap();

        let search = |s: &str| LeadFilter {
            search: Some(s.to_string()),
            status: None,
        };
        assert_eq!(list_for_user(&pool, "u1", &search("ANN")).await.unwrap().len(), 1);
        assert_eq!(list_for_user(&pool, "u1", &search("smith")).await.unwrap().len(), 2);
        assert_eq!(list_for_user(&pool, "u1", &search("y.com")).await.unwrap().len(), 1);
        assert_eq!(list_for_user(&pool, "u1", &search("%")).await.unwrap().len(), 0);

        let qualified = LeadFilter {
            search: None,
            status: Some(LeadStatus::Qualified),
        };
        let records = list_for_user(&pool, "u1", &qualified).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].guid, "l2");
    }

    #[tokio::test]
    async fn test_owner_of() {
        let pool = setup().await;
        insert(&pool, &lead("l1", "a2", "Ann", "ann@x.com")).await.unwrap();

        assert_eq!(owner_of(&pool, "l1").await.unwrap().as_deref(), Some("u2"));
        assert_eq!(owner_of(&pool, "nope").await.unwrap(), None);
        assert!(find_by_id(&pool, "l1").await.unwrap().is_some());
    }

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("50%_a\\b"), "50\\%\\_a\\\\b");
    }
}
