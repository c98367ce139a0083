//! Question import: merge an incoming question list into an assessment
//!
//! Entries are read leniently, accepting either the JSON field names or the
//! CSV column names, so raw CSV-shaped objects can be posted directly.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Extension, Json,
};
use chrono::Utc;
use pathway_common::api::types::{ImportQuestionsRequest, ImportQuestionsResponse};
use pathway_common::merge_questions;
use pathway_common::models::{Question, QuestionType};
use serde_json::{Map, Value};
use tracing::info;

use super::assessments::ensure_owner;
use super::auth::AuthUser;
use crate::db::assessments;
use crate::error::{ApiError, ApiResult};
use crate::uploads::foreign_question_audio;
use crate::AppState;

/// Non-empty string value of the first present key
fn first_string(entry: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| entry.get(*key))
        .filter_map(Value::as_str)
        .find(|s| !s.is_empty())
        .map(str::to_string)
}

/// Nonzero integer value of the first key that has one
fn first_id(entry: &Map<String, Value>, keys: &[&str]) -> Option<i64> {
    keys.iter()
        .filter_map(|key| entry.get(*key))
        .filter_map(|value| match value {
            Value::Number(n) => n
                .as_i64()
                .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        })
        .find(|id| *id != 0)
}

/// Read one posted entry; `position` is its 0-based index in the request
pub fn normalize_incoming(value: &Value, position: usize) -> ApiResult<Question> {
    let number = position + 1;
    let entry = value
        .as_object()
        .ok_or_else(|| ApiError::BadRequest(format!("Question {} is not an object", number)))?;

    let kind = first_string(entry, &["type", "question_type"])
        .ok_or_else(|| ApiError::BadRequest(format!("Question {} is missing its type", number)))?;
    let question = first_string(entry, &["question", "question_text"])
        .ok_or_else(|| ApiError::BadRequest(format!("Question {} is missing its text", number)))?;

    let options = entry
        .get("options")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    Ok(Question {
        id: first_id(entry, &["id", "question_order"]).unwrap_or(number as i64),
        kind: QuestionType::from(kind),
        question,
        voice_script: first_string(entry, &["voiceScript", "voice_script"]).unwrap_or_default(),
        options,
        audio: first_string(entry, &["audio"]),
    })
}

/// POST /api/assessments/:slug/import
pub async fn import_questions(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(slug): Path<String>,
    payload: Result<Json<ImportQuestionsRequest>, JsonRejection>,
) -> ApiResult<Json<ImportQuestionsResponse>> {
    let Json(request) = payload?;

    let entries = match request.questions {
        Some(Value::Array(entries)) => entries,
        _ => return Err(ApiError::BadRequest("Questions array is required".to_string())),
    };

    let mut assessment = assessments::find_by_slug(&state.db, &slug)
        .await?
        .ok_or_else(ApiError::assessment_not_found)?;
    ensure_owner(&assessment, &user)?;

    let incoming = entries
        .iter()
        .enumerate()
        .map(|(position, value)| normalize_incoming(value, position))
        .collect::<ApiResult<Vec<_>>>()?;
    if let Some(position) = foreign_question_audio(&incoming, &assessment.media_paths()) {
        return Err(ApiError::BadRequest(format!(
            "Question {} references audio that does not belong to this assessment",
            position + 1
        )));
    }

    assessment.questions = merge_questions(&assessment.questions, &incoming);
    assessment.updated_at = Utc::now();
    assessments::save(&state.db, &assessment).await?;

    info!(
        slug = %slug,
        imported = entries.len(),
        total = assessment.questions.len(),
        "Questions imported"
    );

    Ok(Json(ImportQuestionsResponse {
        message: format!("Successfully imported {} question(s)", entries.len()),
        assessment,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_json_field_names() {
        let q = normalize_incoming(
            &json!({
                "id": 4,
                "type": "yes-no",
                "question": "Ready?",
                "voiceScript": "Are you ready",
                "options": ["Yes", "No"],
                "audio": "/uploads/audio/a.mp3"
            }),
            0,
        )
        .unwrap();

        assert_eq!(q.id, 4);
        assert_eq!(q.kind, QuestionType::YesNo);
        assert_eq!(q.voice_script, "Are you ready");
        assert_eq!(q.options, vec!["Yes", "No"]);
        assert_eq!(q.audio.as_deref(), Some("/uploads/audio/a.mp3"));
    }

    #[test]
    fn test_csv_field_names() {
        let q = normalize_incoming(
            &json!({
                "question_order": "7",
                "question_type": "rating",
                "question_text": "How sure?",
                "voice_script": "Rate it"
            }),
            0,
        )
        .unwrap();

        assert_eq!(q.id, 7);
        assert_eq!(q.question, "How sure?");
        assert_eq!(q.voice_script, "Rate it");
        assert!(q.options.is_empty());
        assert_eq!(q.audio, None);
    }

    #[test]
    fn test_id_falls_back_to_position() {
        let q = normalize_incoming(&json!({"id": 0, "type": "rating", "question": "Q"}), 2).unwrap();
        assert_eq!(q.id, 3);

        let q = normalize_incoming(&json!({"type": "rating", "question": "Q", "audio": ""}), 0)
            .unwrap();
        assert_eq!(q.id, 1);
        assert_eq!(q.audio, None);
    }

    #[test]
    fn test_missing_required_fields() {
        let err = normalize_incoming(&json!({"question": "Q"}), 1).unwrap_err();
        assert_eq!(err.to_string(), "Question 2 is missing its type");

        let err = normalize_incoming(&json!({"type": "rating", "question": ""}), 0).unwrap_err();
        assert_eq!(err.to_string(), "Question 1 is missing its text");

        assert!(normalize_incoming(&json!("text"), 0).is_err());
    }
}
