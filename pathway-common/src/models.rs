//! Domain models shared by the API service and the importer
//!
//! JSON field names follow the wire format consumed by the admin frontend
//! (camelCase, `type` for the question kind).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Kind of a question; unknown kinds round-trip verbatim
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum QuestionType {
    YesNo,
    ThisThat,
    MultipleChoice,
    Rating,
    Desires,
    PainAvoidance,
    Other(String),
}

impl QuestionType {
    pub fn as_str(&self) -> &str {
        match self {
            QuestionType::YesNo => "yes-no",
            QuestionType::ThisThat => "this-that",
            QuestionType::MultipleChoice => "multiple-choice",
            QuestionType::Rating => "rating",
            QuestionType::Desires => "desires",
            QuestionType::PainAvoidance => "pain-avoidance",
            QuestionType::Other(s) => s,
        }
    }
}

impl From<String> for QuestionType {
    fn from(s: String) -> Self {
        match s.as_str() {
            "yes-no" => QuestionType::YesNo,
            "this-that" => QuestionType::ThisThat,
            "multiple-choice" => QuestionType::MultipleChoice,
            "rating" => QuestionType::Rating,
            "desires" => QuestionType::Desires,
            "pain-avoidance" => QuestionType::PainAvoidance,
            _ => QuestionType::Other(s),
        }
    }
}

impl From<&str> for QuestionType {
    fn from(s: &str) -> Self {
        QuestionType::from(s.to_string())
    }
}

impl From<QuestionType> for String {
    fn from(t: QuestionType) -> Self {
        match t {
            QuestionType::Other(s) => s,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One question of an assessment.
///
/// `id` is both the display order and the merge key: it is unique within one
/// assessment's question list, and that list is kept sorted by it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: i64,
    #[serde(rename = "type")]
    pub kind: QuestionType,
    pub question: String,
    #[serde(default)]
    pub voice_script: String,
    #[serde(default)]
    pub options: Vec<String>,
    /// Served path of the narration clip, e.g. `/uploads/audio/<file>`
    #[serde(
        default,
        deserialize_with = "empty_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub audio: Option<String>,
}

/// Target audience of an assessment
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Audience {
    #[default]
    Individual,
    Business,
}

impl Audience {
    pub fn as_str(&self) -> &'static str {
        match self {
            Audience::Individual => "individual",
            Audience::Business => "business",
        }
    }
}

/// An assessment document
///
/// Persisted as one JSON document per row; `id`, `userId` and `slug` are
/// mirrored into indexed columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assessment {
    pub id: String,
    pub user_id: String,
    pub slug: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub audience: Audience,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub questions: Vec<Question>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub booking_link: Option<String>,
    #[serde(default)]
    pub welcome_message: String,
    #[serde(default)]
    pub keep_going_message: String,
    #[serde(default)]
    pub congratulation_message: String,
    #[serde(default)]
    pub contact_message: String,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub image: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub welcome_message_audio: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub keep_going_message_audio: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub congratulation_message_audio: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub contact_message_audio: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Single-file media slots of an assessment, keyed by their multipart field name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaSlot {
    Image,
    WelcomeMessageAudio,
    KeepGoingMessageAudio,
    CongratulationMessageAudio,
    ContactMessageAudio,
}

impl MediaSlot {
    pub const ALL: [MediaSlot; 5] = [
        MediaSlot::Image,
        MediaSlot::WelcomeMessageAudio,
        MediaSlot::KeepGoingMessageAudio,
        MediaSlot::CongratulationMessageAudio,
        MediaSlot::ContactMessageAudio,
    ];

    pub fn field_name(&self) -> &'static str {
        match self {
            MediaSlot::Image => "image",
            MediaSlot::WelcomeMessageAudio => "welcomeMessageAudio",
            MediaSlot::KeepGoingMessageAudio => "keepGoingMessageAudio",
            MediaSlot::CongratulationMessageAudio => "congratulationMessageAudio",
            MediaSlot::ContactMessageAudio => "contactMessageAudio",
        }
    }

    pub fn from_field_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|slot| slot.field_name() == name)
    }

    pub fn media_kind(&self) -> MediaKind {
        match self {
            MediaSlot::Image => MediaKind::Image,
            _ => MediaKind::Audio,
        }
    }
}

/// Upload subdirectory a file is stored under
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Audio,
}

impl MediaKind {
    pub fn dir_name(&self) -> &'static str {
        match self {
            MediaKind::Image => "images",
            MediaKind::Audio => "audio",
        }
    }
}

impl Assessment {
    pub fn media(&self, slot: MediaSlot) -> Option<&str> {
        let value = match slot {
            MediaSlot::Image => &self.image,
            MediaSlot::WelcomeMessageAudio => &self.welcome_message_audio,
            MediaSlot::KeepGoingMessageAudio => &self.keep_going_message_audio,
            MediaSlot::CongratulationMessageAudio => &self.congratulation_message_audio,
            MediaSlot::ContactMessageAudio => &self.contact_message_audio,
        };
        value.as_deref()
    }

    pub fn set_media(&mut self, slot: MediaSlot, path: Option<String>) {
        let target = match slot {
            MediaSlot::Image => &mut self.image,
            MediaSlot::WelcomeMessageAudio => &mut self.welcome_message_audio,
            MediaSlot::KeepGoingMessageAudio => &mut self.keep_going_message_audio,
            MediaSlot::CongratulationMessageAudio => &mut self.congratulation_message_audio,
            MediaSlot::ContactMessageAudio => &mut self.contact_message_audio,
        };
        *target = path;
    }

    /// Every served media path referenced by this document, question audio included
    pub fn media_paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = MediaSlot::ALL
            .iter()
            .filter_map(|slot| self.media(*slot).map(str::to_string))
            .collect();
        paths.extend(self.questions.iter().filter_map(|q| q.audio.clone()));
        paths
    }
}

/// Pipeline stage of a lead
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LeadStatus {
    #[default]
    New,
    Contacted,
    Qualified,
    Converted,
}

impl LeadStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LeadStatus::New => "new",
            LeadStatus::Contacted => "contacted",
            LeadStatus::Qualified => "qualified",
            LeadStatus::Converted => "converted",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "new" => Some(LeadStatus::New),
            "contacted" => Some(LeadStatus::Contacted),
            "qualified" => Some(LeadStatus::Qualified),
            "converted" => Some(LeadStatus::Converted),
            _ => None,
        }
    }
}

/// A person who completed an assessment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lead {
    pub id: String,
    pub assessment_id: String,
    /// Title of the owning assessment, filled in when listing
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assessment_title: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub score: i64,
    pub status: LeadStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default)]
    pub answers: serde_json::Value,
    pub completed_at: DateTime<Utc>,
}

/// Questions destined for one assessment within a single import run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentImportBatch {
    pub slug: String,
    pub questions: Vec<Question>,
}

fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<String> = Option::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.trim().is_empty()))
}
