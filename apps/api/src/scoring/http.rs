//! HTTP scorer — forwards the frozen intake to an external scoring service.
//!
//! Wire format: POST JSON `{job_description, job_url, resume_name, resume_content_type,
//! resume_base64}`, expecting `{fit_score, tailored_summary}` back.

use std::time::Duration;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{check_assessment, FitAssessment, FitScorer, ScoringError, ScoringRequest};

const MAX_ATTEMPTS: u32 = 3;
const DEFAULT_BACKOFF: Duration = Duration::from_millis(1000);
const MIN_ATTEMPT_TIMEOUT: Duration = Duration::from_secs(1);

#[derive(Debug, Serialize)]
struct ServiceRequest<'a> {
    job_description: &'a str,
    job_url: &'a str,
    resume_name: &'a str,
    resume_content_type: Option<&'a str>,
    resume_base64: String,
}

#[derive(Debug, Deserialize)]
struct ServiceResponse {
    fit_score: u32,
    tailored_summary: String,
}

#[derive(Debug, Deserialize)]
struct ServiceError {
    error: ServiceErrorBody,
}

#[derive(Debug, Deserialize)]
struct ServiceErrorBody {
    message: String,
}

/// Outcome of one request to the scoring service.
enum Attempt {
    Done(Result<FitAssessment, ScoringError>),
    Retry(ScoringError),
}

/// Splits an overall scoring budget across every attempt and the backoff between them,
/// so a hung first request cannot use up the whole budget.
pub fn attempt_timeout(budget: Duration) -> Duration {
    let backoff_total: Duration = (1..MAX_ATTEMPTS)
        .map(|retry| DEFAULT_BACKOFF * (1 << (retry - 1)))
        .sum();
    (budget.saturating_sub(backoff_total) / MAX_ATTEMPTS).max(MIN_ATTEMPT_TIMEOUT)
}

#[derive(Clone)]
pub struct HttpFitScorer {
    client: Client,
    endpoint: String,
    backoff: Duration,
}

impl HttpFitScorer {
    /// `request_timeout` bounds each attempt, not the whole retry sequence.
    pub fn new(endpoint: impl Into<String>, request_timeout: Duration) -> Result<Self, ScoringError> {
        Ok(Self {
            client: Client::builder().timeout(request_timeout).build()?,
            endpoint: endpoint.into(),
            backoff: DEFAULT_BACKOFF,
        })
    }

    /// Overrides the first retry delay; later retries double it.
    #[cfg(test)]
    pub fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn attempt(&self, body: &ServiceRequest<'_>) -> Attempt {
        let response = match self.client.post(&self.endpoint).json(body).send().await {
            Ok(r) => r,
            Err(e) => return Attempt::Retry(ScoringError::Http(e)),
        };

        let status = response.status();

        if status.as_u16() == 429 || status.is_server_error() {
            let message = response.text().await.unwrap_or_default();
            warn!("Scoring service returned {}: {}", status, message);
            return Attempt::Retry(ScoringError::Api {
                status: status.as_u16(),
                message,
            });
        }

        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ServiceError>(&text)
                .map(|e| e.error.message)
                .unwrap_or(text);
            return Attempt::Done(Err(ScoringError::Api {
                status: status.as_u16(),
                message,
            }));
        }

        let parsed: ServiceResponse = match response.json().await {
            Ok(parsed) => parsed,
            Err(e) => return Attempt::Done(Err(e.into())),
        };
        debug!("Scoring service returned fit_score={}", parsed.fit_score);

        Attempt::Done(check_assessment(FitAssessment {
            fit_score: parsed.fit_score,
            tailored_summary: parsed.tailored_summary,
            scorer_backend: "http".to_string(),
        }))
    }
}

#[async_trait]
impl FitScorer for HttpFitScorer {
    /// Retries transport failures, 429 and 5xx with exponential backoff.
    /// The last attempt's error is returned as-is.
    async fn score(&self, request: &ScoringRequest) -> Result<FitAssessment, ScoringError> {
        let body = ServiceRequest {
            job_description: &request.job_description,
            job_url: &request.job_url,
            resume_name: &request.resume.name,
            resume_content_type: request.resume.content_type.as_deref(),
            resume_base64: STANDARD.encode(&request.resume.bytes),
        };

        let mut attempt = 1;
        loop {
            match self.attempt(&body).await {
                Attempt::Done(outcome) => return outcome,
                Attempt::Retry(err) if attempt < MAX_ATTEMPTS => {
                    let delay = self.backoff * (1 << (attempt - 1));
                    warn!(
                        "Scoring attempt {} failed ({}), retrying after {}ms...",
                        attempt,
                        err,
                        delay.as_millis()
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Attempt::Retry(err) => return Err(err),
            }
        }
    }
}
