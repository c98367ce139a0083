//! Assessment CRUD

use axum::{
    extract::{multipart::MultipartRejection, Multipart, Path, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::Utc;
use pathway_common::api::types::MessageResponse;
use pathway_common::models::{Assessment, MediaSlot};
use pathway_common::slug::{copy_candidates, is_valid_slug, slugify};
use tracing::{info, warn};
use uuid::Uuid;

use super::auth::AuthUser;
use super::form::AssessmentForm;
use crate::db::assessments;
use crate::error::{ApiError, ApiResult};
use crate::AppState;

/// Path segment used by the id-addressed routes; never a valid slug
const RESERVED_SLUG: &str = "id";

/// Reject callers that do not own `assessment`
pub fn ensure_owner(assessment: &Assessment, user: &AuthUser) -> ApiResult<()> {
    if assessment.user_id != user.user_id {
        return Err(ApiError::Forbidden(
            "You do not have permission to modify this assessment".to_string(),
        ));
    }
    Ok(())
}

async fn load_owned(state: &AppState, id: &str, user: &AuthUser) -> ApiResult<Assessment> {
    let assessment = assessments::find_by_id(&state.db, id)
        .await?
        .ok_or_else(ApiError::assessment_not_found)?;
    ensure_owner(&assessment, user)?;
    Ok(assessment)
}

async fn check_slug(state: &AppState, slug: &str, except_id: Option<&str>) -> ApiResult<()> {
    if !is_valid_slug(slug) || slug == RESERVED_SLUG {
        return Err(ApiError::BadRequest(format!("Invalid slug: {}", slug)));
    }
    if assessments::slug_taken(&state.db, slug, except_id).await? {
        return Err(ApiError::Conflict(format!("Slug already in use: {}", slug)));
    }
    Ok(())
}

/// A unique index violation means another request took the slug first
fn map_insert_error(e: pathway_common::Error, slug: &str) -> ApiError {
    match e {
        pathway_common::Error::Database(sqlx::Error::Database(db)) if db.is_unique_violation() => {
            ApiError::Conflict(format!("Slug already in use: {}", slug))
        }
        other => other.into(),
    }
}

/// GET /api/assessments
pub async fn list_assessments(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<Json<Vec<Assessment>>> {
    let list = assessments::list_for_user(&state.db, &user.user_id).await?;
    Ok(Json(list))
}

/// GET /api/assessments/:slug (public)
pub async fn get_assessment(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> ApiResult<Json<Assessment>> {
    let assessment = assessments::find_by_slug(&state.db, &slug)
        .await?
        .ok_or_else(ApiError::assessment_not_found)?;
    Ok(Json(assessment))
}

/// POST /api/assessments
pub async fn create_assessment(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<(StatusCode, Json<Assessment>)> {
    let form = AssessmentForm::read(multipart?, &state.uploads).await?;

    match build_new(&state, &user, form).await {
        Ok(assessment) => {
            info!(id = %assessment.id, slug = %assessment.slug, "Assessment created");
            Ok((StatusCode::CREATED, Json(assessment)))
        }
        Err((e, uploaded)) => {
            state.uploads.delete_all(uploaded).await;
            Err(e)
        }
    }
}

/// Validate and insert; on failure hands back the files to remove
async fn build_new(
    state: &AppState,
    user: &AuthUser,
    form: AssessmentForm,
) -> Result<Assessment, (ApiError, Vec<String>)> {
    let uploaded = form.uploaded_paths();

    let title = form.text("title").map(|t| t.trim().to_string());
    let Some(title) = title else {
        return Err((
            ApiError::BadRequest("Title is required".to_string()),
            uploaded,
        ));
    };
    let slug = form
        .text("slug")
        .map(|s| s.trim().to_string())
        .unwrap_or_else(|| slugify(&title));

    if let Err(e) = check_slug(state, &slug, None).await {
        return Err((e, uploaded));
    }

    let now = Utc::now();
    let mut assessment = Assessment {
        id: Uuid::new_v4().to_string(),
        user_id: user.user_id.clone(),
        slug,
        title,
        description: String::new(),
        audience: Default::default(),
        tags: Vec::new(),
        questions: Vec::new(),
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
    };

    let unused = match form.apply(&mut assessment) {
        Ok(unused) => unused,
        Err(e) => return Err((e, uploaded)),
    };

    if let Err(e) = assessments::insert(&state.db, &assessment).await {
        return Err((map_insert_error(e, &assessment.slug), uploaded));
    }
    state.uploads.delete_all(unused).await;

    Ok(assessment)
}

/// PUT /api/assessments/id/:id
///
/// Partial update. A new file for a media slot, or for a question index named
/// in `questionAudioIndexes`, replaces and deletes the stored one.
pub async fn update_assessment(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<Json<Assessment>> {
    let mut assessment = load_owned(&state, &id, &user).await?;
    let form = AssessmentForm::read(multipart?, &state.uploads).await?;
    let uploaded = form.uploaded_paths();

    let mut replaced: Vec<String> = form
        .media
        .iter()
        .filter_map(|(slot, _)| assessment.media(*slot).map(str::to_string))
        .collect();
    replaced.extend(
        form.replaced_question_indexes()
            .iter()
            .filter_map(|idx| assessment.questions.get(*idx))
            .filter_map(|q| q.audio.clone()),
    );

    let previous_slug = assessment.slug.clone();
    let unused = match form.apply(&mut assessment) {
        Ok(unused) => unused,
        Err(e) => {
            state.uploads.delete_all(uploaded).await;
            return Err(e);
        }
    };

    if assessment.slug != previous_slug {
        if let Err(e) = check_slug(&state, &assessment.slug, Some(&assessment.id)).await {
            state.uploads.delete_all(uploaded).await;
            return Err(e);
        }
    }

    assessment.updated_at = Utc::now();
    if let Err(e) = assessments::save(&state.db, &assessment).await {
        state.uploads.delete_all(uploaded).await;
        return Err(map_insert_error(e, &assessment.slug));
    }

    // only files the updated document no longer references
    let still_used = assessment.media_paths();
    replaced.retain(|path| !still_used.contains(path));
    state.uploads.delete_all(replaced.into_iter().chain(unused)).await;

    info!(id = %assessment.id, slug = %assessment.slug, "Assessment updated");
    Ok(Json(assessment))
}

/// DELETE /api/assessments/id/:id
pub async fn delete_assessment(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
    let assessment = load_owned(&state, &id, &user).await?;

    if !assessments::delete(&state.db, &id).await? {
        return Err(ApiError::assessment_not_found());
    }
    state.uploads.delete_all(assessment.media_paths()).await;

    info!(id = %id, slug = %assessment.slug, "Assessment deleted");
    Ok(Json(MessageResponse::new("Assessment deleted")))
}

/// POST /api/assessments/id/:id/duplicate
///
/// The copy gets a fresh id, the first free `<slug>-copy[-N]` slug and its
/// own copies of every media file.
pub async fn duplicate_assessment(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<(StatusCode, Json<Assessment>)> {
    let original = load_owned(&state, &id, &user).await?;

    let mut slug = String::new();
    for candidate in copy_candidates(&original.slug) {
        if !assessments::slug_taken(&state.db, &candidate, None).await? {
            slug = candidate;
            break;
        }
    }

    let now = Utc::now();
    let mut copy = Assessment {
        id: Uuid::new_v4().to_string(),
        slug,
        created_at: now,
        updated_at: now,
        ..original.clone()
    };

    for slot in MediaSlot::ALL {
        if let Some(path) = original.media(slot) {
            copy.set_media(slot, duplicate_file(&state, path).await);
        }
    }
    for question in &mut copy.questions {
        if let Some(path) = question.audio.take() {
            question.audio = duplicate_file(&state, &path).await;
        }
    }

    if let Err(e) = assessments::insert(&state.db, &copy).await {
        state.uploads.delete_all(copy.media_paths()).await;
        return Err(map_insert_error(e, &copy.slug));
    }

    info!(id = %copy.id, source = %original.id, slug = %copy.slug, "Assessment duplicated");
    Ok((StatusCode::CREATED, Json(copy)))
}

/// Copy a media file for a duplicate; a missing source drops the reference
async fn duplicate_file(state: &AppState, path: &str) -> Option<String> {
    match state.uploads.duplicate(path).await {
        Ok(copy) => Some(copy),
        Err(e) => {
            warn!(path = %path, "Could not copy media file: {}", e);
            None
        }
    }
}
