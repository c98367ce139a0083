//! Lead capture, listing and export

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Extension, Json,
};
use chrono::Utc;
use pathway_common::models::{Lead, LeadStatus};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use super::auth::AuthUser;
use crate::db::leads::{self, LeadFilter, LeadRecord};
use crate::db::assessments;
use crate::error::{ApiError, ApiResult};
use crate::AppState;

/// Body of `POST /api/leads`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitLeadRequest {
    pub assessment_slug: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    pub phone: Option<String>,
    #[serde(default)]
    pub score: f64,
    pub source: Option<String>,
    #[serde(default)]
    pub answers: serde_json::Value,
}

#[derive(Debug, Default, Deserialize)]
pub struct LeadQuery {
    pub search: Option<String>,
    pub status: Option<String>,
}

impl LeadQuery {
    fn filter(self) -> ApiResult<LeadFilter> {
        let status = match self.status.as_deref().map(str::trim) {
            None | Some("") | Some("all") => None,
            Some(raw) => Some(parse_status(raw)?),
        };
        Ok(LeadFilter {
            search: self.search,
            status,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct StatusUpdate {
    pub status: String,
}

fn parse_status(raw: &str) -> ApiResult<LeadStatus> {
    LeadStatus::parse(raw).ok_or_else(|| ApiError::BadRequest(format!("Invalid status: {}", raw)))
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// Scores are whole points within 0..=100
fn clamp_score(score: f64) -> i64 {
    if score.is_nan() {
        return 0;
    }
    score.round().clamp(0.0, 100.0) as i64
}

/// POST /api/leads (public)
pub async fn submit_lead(
    State(state): State<AppState>,
    payload: Result<Json<SubmitLeadRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Lead>)> {
    let Json(request) = payload?;

    let assessment = assessments::find_by_slug(&state.db, request.assessment_slug.trim())
        .await?
        .ok_or_else(ApiError::assessment_not_found)?;

    let first_name = request.first_name.trim();
    let last_name = request.last_name.trim();
    let email = request.email.trim();
    if first_name.is_empty() || last_name.is_empty() || email.is_empty() {
        return Err(ApiError::BadRequest(
            "First name, last name and email are required".to_string(),
        ));
    }

    let lead = Lead {
        id: Uuid::new_v4().to_string(),
        assessment_id: assessment.id.clone(),
        assessment_title: Some(assessment.title.clone()),
        first_name: first_name.to_string(),
        last_name: last_name.to_string(),
        email: email.to_string(),
        phone: non_blank(request.phone),
        score: clamp_score(request.score),
        status: LeadStatus::New,
        source: non_blank(request.source),
        answers: request.answers,
        completed_at: Utc::now(),
    };
    leads::insert(&state.db, &lead).await?;

    info!(lead = %lead.id, slug = %assessment.slug, score = lead.score, "Lead captured");
    Ok((StatusCode::CREATED, Json(lead)))
}

/// GET /api/leads
pub async fn list_leads(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<LeadQuery>,
) -> ApiResult<Json<Vec<Lead>>> {
    let filter = query.filter()?;
    let records = leads::list_for_user(&state.db, &user.user_id, &filter).await?;
    Ok(Json(records.into_iter().map(LeadRecord::into_lead).collect()))
}

/// PATCH /api/leads/:id/status
pub async fn update_lead_status(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    payload: Result<Json<StatusUpdate>, JsonRejection>,
) -> ApiResult<Json<Lead>> {
    let Json(update) = payload?;

    let owner = leads::owner_of(&state.db, &id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Lead not found".to_string()))?;
    if owner != user.user_id {
        return Err(ApiError::Forbidden(
            "You do not have permission to modify this lead".to_string(),
        ));
    }

    let status = parse_status(&update.status)?;
    leads::update_status(&state.db, &id, status).await?;

    let record = leads::find_by_id(&state.db, &id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Lead not found".to_string()))?;

    info!(lead = %id, status = status.as_str(), "Lead status updated");
    Ok(Json(record.into_lead()))
}

/// GET /api/leads/export
pub async fn export_leads(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<LeadQuery>,
) -> ApiResult<impl IntoResponse> {
    let filter = query.filter()?;
    let records = leads::list_for_user(&state.db, &user.user_id, &filter).await?;

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (header::CONTENT_DISPOSITION, "attachment; filename=\"leads.csv\""),
        ],
        leads_csv(&records)?,
    ))
}

const CSV_HEADER: &str = "Name,Email,Phone,Assessment,Score,Status,Date\n";

/// Render leads as CSV; the header is bare, every data field is quoted
pub fn leads_csv(records: &[LeadRecord]) -> ApiResult<String> {
    let mut writer = csv::WriterBuilder::new()
        .quote_style(csv::QuoteStyle::Always)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(CSV_HEADER.as_bytes().to_vec());

    for record in records {
        let name = format!("{} {}", record.first_name, record.last_name);
        let score = record.score.to_string();
        let date = record.completed_at.format("%Y-%m-%d").to_string();
        writer
            .write_record([
                name.as_str(),
                record.email.as_str(),
                record.phone.as_deref().unwrap_or_default(),
                record.assessment_title.as_deref().unwrap_or("—"),
                score.as_str(),
                record.status.as_str(),
                date.as_str(),
            ])
            .map_err(|e| ApiError::Internal(format!("Failed to write CSV: {}", e)))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| ApiError::Internal(format!("Failed to write CSV: {}", e.error())))?;
    String::from_utf8(bytes).map_err(|e| ApiError::Internal(format!("Failed to write CSV: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn record(first: &str, title: Option<&str>) -> LeadRecord {
        LeadRecord {
            guid: "l1".to_string(),
            assessment_guid: "a1".to_string(),
            assessment_title: title.map(str::to_string),
            audience: None,
            first_name: first.to_string(),
            last_name: "Smith".to_string(),
            email: "jo@example.com".to_string(),
            phone: None,
            score: 88,
            status: "contacted".to_string(),
            source: None,
            answers: "{}".to_string(),
            completed_at: Utc.with_ymd_and_hms(2024, 3, 9, 8, 30, 0).unwrap(),
        }
    }

    #[test]
    fn test_csv_quotes_every_field() {
        let csv = leads_csv(&[record("Jo \"JJ\"", Some("Career, Fit"))]).unwrap();
        let mut lines = csv.lines();

        assert_eq!(lines.next(), Some("Name,Email,Phone,Assessment,Score,Status,Date"));
        assert_eq!(
            lines.next(),
            Some(
                r#""Jo ""JJ"" Smith","jo@example.com","","Career, Fit","88","contacted","2024-03-09""#
            )
        );
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn test_csv_missing_assessment() {
        let csv = leads_csv(&[record("Jo", None)]).unwrap();
        assert!(csv.contains(r#","—","88","#));
    }

    #[test]
    fn test_csv_multiline_field_stays_one_record() {
        let mut lead = record("Jo", Some("Line one\nLine two"));
        lead.phone = Some("555-0100".to_string());
        let out = leads_csv(&[lead]).unwrap();

        assert!(out.ends_with("\"contacted\",\"2024-03-09\"\n"));
        let mut reader = csv::Reader::from_reader(out.as_bytes());
        let rows: Vec<csv::StringRecord> = reader.records().map(Result::unwrap).collect();
        assert_eq!(rows.len(), 1);
        assert_eq!(&rows[0][2], "555-0100");
        assert_eq!(&rows[0][3], "Line one\nLine two");
    }

    #[test]
    fn test_empty_export_has_header() {
        assert_eq!(leads_csv(&[]).unwrap(), "Name,Email,Phone,Assessment,Score,Status,Date\n");
    }

    #[test]
    fn test_clamp_score() {
        assert_eq!(clamp_score(-5.0), 0);
        assert_eq!(clamp_score(72.6), 73);
        assert_eq!(clamp_score(140.0), 100);
        assert_eq!(clamp_score(f64::NAN), 0);
    }

    #[test]
    fn test_status_filter() {
        let all = LeadQuery {
            search: None,
            status: Some("all".to_string()),
        };
        assert_eq!(all.filter().unwrap().status, None);

        let qualified = LeadQuery {
            search: None,
            status: Some("Qualified".to_string()),
        };
        assert_eq!(qualified.filter().unwrap().status, Some(LeadStatus::Qualified));

        let bogus = LeadQuery {
            search: None,
            status: Some("lost".to_string()),
        };
        assert!(bogus.filter().is_err());
    }
}
