//! Multipart assessment form
//!
//! Create and update send the same form: plain text fields, JSON-encoded
//! `tags` / `questions` / `questionAudioIndexes`, and media files. Files are
//! stored while the body is read; if the form is rejected afterwards they are
//! removed again.

use axum::extract::Multipart;
use pathway_common::models::{Assessment, Audience, MediaKind, MediaSlot, Question};
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use tracing::debug;

use crate::error::{ApiError, ApiResult};
use crate::uploads::{foreign_question_audio, map_question_audios, UploadStore};

/// Repeated file field holding per-question narration
pub const QUESTION_AUDIOS_FIELD: &str = "questionAudios";

/// JSON array mapping the i-th `questionAudios` file to a question index
pub const QUESTION_AUDIO_INDEXES_FIELD: &str = "questionAudioIndexes";

/// A parsed assessment form
#[derive(Debug, Default)]
pub struct AssessmentForm {
    text: HashMap<String, String>,
    pub tags: Option<Vec<String>>,
    pub questions: Option<Vec<Question>>,
    pub question_audio_indexes: Vec<usize>,
    /// Stored single-file uploads, first file per slot
    pub media: Vec<(MediaSlot, String)>,
    /// Stored `questionAudios` files, in upload order
    pub question_audios: Vec<String>,
}

impl AssessmentForm {
    /// Read the whole multipart body, storing files as they arrive
    pub async fn read(mut multipart: Multipart, store: &UploadStore) -> ApiResult<Self> {
        let mut form = AssessmentForm::default();

        let parsed = match form.collect(&mut multipart, store).await {
            Ok(()) => form.parse_json_fields(),
            Err(e) => Err(e),
        };

        if let Err(e) = parsed {
            form.discard(store).await;
            return Err(e);
        }

        Ok(form)
    }

    async fn collect(&mut self, multipart: &mut Multipart, store: &UploadStore) -> ApiResult<()> {
        while let Some(field) = multipart.next_field().await? {
            let name = field.name().unwrap_or_default().to_string();

            let Some(file_name) = field.file_name().map(str::to_string) else {
                let value = field.text().await?;
                self.text.insert(name, value);
                continue;
            };

            let slot = MediaSlot::from_field_name(&name);
            let kind = match slot {
                Some(slot) if self.media.iter().any(|(s, _)| *s == slot) => {
                    debug!(field = %name, "Ignoring extra file for single-file field");
                    continue;
                }
                Some(slot) => slot.media_kind(),
                None if name == QUESTION_AUDIOS_FIELD => MediaKind::Audio,
                None => {
                    debug!(field = %name, "Ignoring unknown file field");
                    continue;
                }
            };

            let bytes = field.bytes().await?;
            if bytes.is_empty() {
                continue;
            }

            let path = store.save(kind, &file_name, &bytes).await?;
            match slot {
                Some(slot) => self.media.push((slot, path)),
                None => self.question_audios.push(path),
            }
        }

        Ok(())
    }

    fn parse_json_fields(&mut self) -> ApiResult<()> {
        self.tags = self.json_field("tags")?;
        self.questions = self.json_field("questions")?;
        self.question_audio_indexes = self
            .json_field(QUESTION_AUDIO_INDEXES_FIELD)?
            .unwrap_or_default();
        Ok(())
    }

    /// Parse a JSON sub-document; blank or absent means "not sent"
    fn json_field<T: DeserializeOwned>(&self, name: &str) -> ApiResult<Option<T>> {
        match self.text(name) {
            Some(raw) => serde_json::from_str(raw)
                .map(Some)
                .map_err(|_| ApiError::BadRequest(format!("Invalid JSON in {} field", name))),
            None => Ok(None),
        }
    }

    /// Non-blank text field
    pub fn text(&self, name: &str) -> Option<&str> {
        self.text
            .get(name)
            .map(String::as_str)
            .filter(|v| !v.trim().is_empty())
    }

    /// Whether the field was sent at all, blank included
    pub fn has(&self, name: &str) -> bool {
        self.text.contains_key(name)
    }

    /// Served paths of every file stored for this form
    pub fn uploaded_paths(&self) -> Vec<String> {
        self.media
            .iter()
            .map(|(_, path)| path.clone())
            .chain(self.question_audios.iter().cloned())
            .collect()
    }

    /// Delete every file stored for this form
    pub async fn discard(&self, store: &UploadStore) {
        store.delete_all(self.uploaded_paths()).await;
    }

    /// Question indexes that receive a new audio file
    pub fn replaced_question_indexes(&self) -> &[usize] {
        let n = self.question_audios.len().min(self.question_audio_indexes.len());
        &self.question_audio_indexes[..n]
    }

    /// Apply the form onto `assessment`.
    ///
    /// Returns stored question audio that matched no question.
    pub fn apply(self, assessment: &mut Assessment) -> ApiResult<Vec<String>> {
        if self.has("title") {
            assessment.title = self
                .text("title")
                .map(|t| t.trim().to_string())
                .ok_or_else(|| ApiError::BadRequest("Title is required".to_string()))?;
        }
        if let Some(slug) = self.text("slug") {
            assessment.slug = slug.trim().to_string();
        }
        if let Some(audience) = self.text("audience") {
            assessment.audience = parse_audience(audience)?;
        }
        if self.has("description") {
            assessment.description = self.text.get("description").cloned().unwrap_or_default();
        }
        if self.has("bookingLink") {
            assessment.booking_link = self.text("bookingLink").map(|l| l.trim().to_string());
        }

        for (field, target) in [
            ("welcomeMessage", &mut assessment.welcome_message),
            ("keepGoingMessage", &mut assessment.keep_going_message),
            ("congratulationMessage", &mut assessment.congratulation_message),
            ("contactMessage", &mut assessment.contact_message),
        ] {
            if let Some(value) = self.text.get(field) {
                *target = value.clone();
            }
        }

        if let Some(tags) = self.tags {
            assessment.tags = tags;
        }
        if let Some(questions) = self.questions {
            if let Some(position) = foreign_question_audio(&questions, &assessment.media_paths()) {
                return Err(ApiError::BadRequest(format!(
                    "Question {} references audio that does not belong to this assessment",
                    position + 1
                )));
            }
            assessment.questions = questions;
        }
        for (slot, path) in self.media {
            assessment.set_media(slot, Some(path));
        }

        Ok(map_question_audios(
            &mut assessment.questions,
            self.question_audios,
            &self.question_audio_indexes,
        ))
    }
}

fn parse_audience(value: &str) -> ApiResult<Audience> {
    match value.trim().to_ascii_lowercase().as_str() {
        "individual" => Ok(Audience::Individual),
        "business" => Ok(Audience::Business),
        other => Err(ApiError::BadRequest(format!("Invalid audience: {}", other))),
    }
}
