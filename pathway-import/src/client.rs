//! HTTP client for the assessment import endpoint

use crate::error::{ImportError, ImportResult};
use crate::submit::QuestionImporter;
use async_trait::async_trait;
use pathway_common::api::types::{ErrorResponse, ImportQuestionsRequest, ImportQuestionsResponse};
use pathway_common::models::Question;
use reqwest::Url;
use std::time::Duration;
use tracing::debug;

const USER_AGENT: &str = concat!("pathway-import/", env!("CARGO_PKG_VERSION"));
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Posts batches to `POST {base_url}/api/assessments/{slug}/import`
pub struct HttpImporter {
    http_client: reqwest::Client,
    base_url: Url,
    token: String,
}

impl HttpImporter {
    pub fn new(base_url: &str, token: impl Into<String>) -> ImportResult<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| ImportError::InvalidServerUrl(format!("{}: {}", base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(ImportError::InvalidServerUrl(base_url.to_string()));
        }

        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| ImportError::Transport(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url,
            token: token.into(),
        })
    }

    /// Import endpoint for `slug`, percent-encoded as one path segment
    pub fn import_url(&self, slug: &str) -> ImportResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ImportError::InvalidServerUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(["api", "assessments", slug, "import"]);
        Ok(url)
    }
}

#[async_trait]
impl QuestionImporter for HttpImporter {
    async fn import_questions(&self, slug: &str, questions: &[Question]) -> ImportResult<String> {
        let url = self.import_url(slug)?;
        let body = ImportQuestionsRequest {
            slug: Some(slug.to_string()),
            questions: Some(
                serde_json::to_value(questions)
                    .map_err(|e| ImportError::MalformedInput(e.to_string()))?,
            ),
        };

        debug!(slug = %slug, url = %url, questions = questions.len(), "Posting question batch");

        let response = self
            .http_client
            .post(url.clone())
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await
            .map_err(|e| ImportError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorResponse>(&text)
                .map(|e| e.error)
                .unwrap_or_else(|_| status.canonical_reason().unwrap_or("error").to_string());
            return Err(ImportError::Remote {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: ImportQuestionsResponse = response
            .json()
            .await
            .map_err(|e| ImportError::Transport(e.to_string()))?;

        debug!(
            slug = %slug,
            total_questions = parsed.assessment.questions.len(),
            "Assessment updated"
        );

        Ok(parsed.message)
    }
}
