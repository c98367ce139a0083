//! CSV row → question normalization

use crate::csv::{CsvRow, CsvTable};
use crate::headers::{Field, ResolvedHeaders};
use pathway_common::models::{Question, QuestionType};
use std::fmt;
use tracing::warn;

/// A validated question together with the assessment it belongs to
#[derive(Debug, Clone, PartialEq)]
pub struct SlugQuestion {
    pub slug: String,
    pub question: Question,
    /// Source line, for diagnostics
    pub line: usize,
}

/// Why a row was skipped; checks run in this order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    MissingSlug,
    InvalidOrder(String),
    MissingText,
    MissingType,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::MissingSlug => write!(f, "missing assessment slug"),
            SkipReason::InvalidOrder(raw) => write!(f, "invalid question order {:?}", raw),
            SkipReason::MissingText => write!(f, "missing question text"),
            SkipReason::MissingType => write!(f, "missing question type"),
        }
    }
}

/// Parse a question order the lenient way spreadsheets export it.
///
/// Leading whitespace and sign are accepted and parsing stops at the first
/// non-digit (`"3.0"` → 3, `"12abc"` → 12). No digits, or zero, is rejected.
///
/// ```
/// use pathway_import::normalize::parse_order;
///
/// assert_eq!(parse_order(" 4"), Some(4));
/// assert_eq!(parse_order("2.5"), Some(2));
/// assert_eq!(parse_order("0"), None);
/// assert_eq!(parse_order("first"), None);
/// ```
pub fn parse_order(raw: &str) -> Option<i64> {
    let s = raw.trim_start();
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };

    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    let value: i64 = digits[..end].parse().ok()?;
    let value = if negative { -value } else { value };

    (value != 0).then_some(value)
}

/// Turn one row into a question, or say why it cannot be one
pub fn normalize_row(
    headers: &ResolvedHeaders,
    row: &CsvRow,
) -> Result<(String, Question), SkipReason> {
    let slug = headers
        .value(row, Field::AssessmentSlug)
        .ok_or(SkipReason::MissingSlug)?;

    let raw_order = headers.value(row, Field::QuestionOrder).unwrap_or("");
    let order =
        parse_order(raw_order).ok_or_else(|| SkipReason::InvalidOrder(raw_order.to_string()))?;

    let text = headers
        .value(row, Field::QuestionText)
        .ok_or(SkipReason::MissingText)?;

    let kind = headers
        .value(row, Field::QuestionType)
        .ok_or(SkipReason::MissingType)?;

    let voice_script = headers
        .value(row, Field::VoiceScript)
        .unwrap_or("")
        .to_string();

    let question = Question {
        id: order,
        kind: QuestionType::from(kind),
        question: text.to_string(),
        voice_script,
        options: headers.options(row),
        audio: None,
    };

    Ok((slug.to_string(), question))
}

/// Normalize every row of a table, logging and dropping invalid ones
pub fn normalize_table(table: &CsvTable) -> Vec<SlugQuestion> {
    let headers = ResolvedHeaders::resolve(table);

    table
        .rows
        .iter()
        .filter_map(|row| match normalize_row(&headers, row) {
            Ok((slug, question)) => Some(SlugQuestion {
                slug,
                question,
                line: row.line,
            }),
            Err(reason) => {
                warn!(line = row.line, "Skipping CSV row: {}", reason);
                None
            }
        })
        .collect()
}
