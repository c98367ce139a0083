//! GET /api/analytics

use axum::{extract::State, Extension, Json};
use chrono::Utc;

use super::auth::AuthUser;
use crate::analytics::{compute, AnalyticsReport, LeadSample};
use crate::db::leads::{self, LeadFilter, LeadRecord};
use crate::error::ApiResult;
use crate::AppState;

impl From<LeadRecord> for LeadSample {
    fn from(record: LeadRecord) -> Self {
        LeadSample {
            audience: record.audience(),
            assessment_title: record.assessment_title.unwrap_or_default(),
            assessment_id: record.assessment_guid,
            score: record.score,
            source: record.source,
            completed_at: record.completed_at,
        }
    }
}

/// Dashboard figures over every lead of the caller's assessments
pub async fn get_analytics(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<Json<AnalyticsReport>> {
    let records = leads::list_for_user(&state.db, &user.user_id, &LeadFilter::default()).await?;
    let samples: Vec<LeadSample> = records.into_iter().map(LeadSample::from).collect();

    Ok(Json(compute(&samples, Utc::now())))
}
