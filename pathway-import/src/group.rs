//! Per-assessment batching of normalized questions

use crate::normalize::SlugQuestion;
use pathway_common::models::AssessmentImportBatch;
use std::collections::HashSet;
use tracing::debug;

/// Group questions into one batch per slug.
///
/// The first `(slug, order)` pair wins; later duplicates are dropped. Batches
/// keep first-seen slug order and each batch is sorted by question id.
pub fn group_by_assessment(questions: Vec<SlugQuestion>) -> Vec<AssessmentImportBatch> {
    let mut seen: HashSet<(String, i64)> = HashSet::new();
    let mut batches: Vec<AssessmentImportBatch> = Vec::new();

    for item in questions {
        if !seen.insert((item.slug.clone(), item.question.id)) {
            debug!(
                slug = %item.slug,
                order = item.question.id,
                line = item.line,
                "Dropping duplicate question"
            );
            continue;
        }

        match batches.iter_mut().find(|b| b.slug == item.slug) {
            Some(batch) => batch.questions.push(item.question),
            None => batches.push(AssessmentImportBatch {
                slug: item.slug,
                questions: vec![item.question],
            }),
        }
    }

    for batch in &mut batches {
        batch.questions.sort_by_key(|q| q.id);
    }

    batches
}
