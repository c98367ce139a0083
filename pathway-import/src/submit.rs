//! Sequential submission of import batches

use crate::csv::parse_csv;
use crate::error::{ImportError, ImportResult};
use crate::group::group_by_assessment;
use crate::normalize::normalize_table;
use async_trait::async_trait;
use pathway_common::models::{AssessmentImportBatch, Question};
use tracing::{error, info};

/// Remote side of an import: merges questions into the assessment `slug`
#[async_trait]
pub trait QuestionImporter: Send + Sync {
    /// Returns the server's confirmation message
    async fn import_questions(&self, slug: &str, questions: &[Question]) -> ImportResult<String>;
}

/// Outcome of one failed batch
#[derive(Debug)]
pub struct BatchFailure {
    pub slug: String,
    pub error: ImportError,
}

/// Tally of an import run with at least one accepted batch
#[derive(Debug, Default)]
pub struct ImportSummary {
    pub success_count: usize,
    pub error_count: usize,
    /// Questions across accepted batches
    pub question_count: usize,
    pub failures: Vec<BatchFailure>,
}

impl ImportSummary {
    pub fn attempted(&self) -> usize {
        self.success_count + self.error_count
    }
}

/// Submit batches one at a time, counting failures instead of stopping
pub async fn submit_batches<I>(
    importer: &I,
    batches: Vec<AssessmentImportBatch>,
) -> ImportResult<ImportSummary>
where
    I: QuestionImporter + ?Sized,
{
    let mut summary = ImportSummary::default();

    for batch in batches {
        match importer.import_questions(&batch.slug, &batch.questions).await {
            Ok(message) => {
                info!(slug = %batch.slug, questions = batch.questions.len(), "{}", message);
                summary.success_count += 1;
                summary.question_count += batch.questions.len();
            }
            Err(e) => {
                error!(slug = %batch.slug, error = %e, "Failed to import questions");
                summary.error_count += 1;
                summary.failures.push(BatchFailure {
                    slug: batch.slug,
                    error: e,
                });
            }
        }
    }

    if summary.success_count == 0 {
        return Err(ImportError::TotalFailure {
            attempted: summary.attempted(),
        });
    }

    Ok(summary)
}

/// Parse CSV text and submit every assessment it names.
///
/// Fails with [`ImportError::NoValidQuestions`] before any remote call when
/// no row survives validation.
pub async fn run_import<I>(csv_text: &str, importer: &I) -> ImportResult<ImportSummary>
where
    I: QuestionImporter + ?Sized,
{
    let table = parse_csv(csv_text);
    let questions = normalize_table(&table);
    if questions.is_empty() {
        return Err(ImportError::NoValidQuestions);
    }

    let batches = group_by_assessment(questions);
    info!(
        assessments = batches.len(),
        rows = table.rows.len(),
        "Submitting question import"
    );

    submit_batches(importer, batches).await
}
