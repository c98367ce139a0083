//! Upsert-by-id merge of question lists

use crate::models::Question;
use std::collections::BTreeMap;

/// Merge `incoming` into `existing` keyed by question id.
///
/// Incoming entries replace existing entries with the same id, existing
/// entries with other ids are kept. The result is sorted ascending by id.
/// When `incoming` repeats an id, the last occurrence wins.
pub fn merge_questions(existing: &[Question], incoming: &[Question]) -> Vec<Question> {
    let mut by_id: BTreeMap<i64, Question> = BTreeMap::new();

    for question in existing.iter().chain(incoming) {
        by_id.insert(question.id, question.clone());
    }

    by_id.into_values().collect()
}
