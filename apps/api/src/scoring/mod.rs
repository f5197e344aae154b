//! Fit Scoring — pluggable, trait-based scorer behind the analysis step.
//!
//! Default: `RandomFitScorer` (placeholder, no analysis of the résumé).
//! `HttpFitScorer` delegates to an external scoring service when one is configured.
//!
//! `AppState` holds an `Arc<dyn FitScorer>`, chosen at startup via config.

pub mod http;

use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use thiserror::Error;

use crate::models::intake::ResumeFile;

pub use http::HttpFitScorer;

/// Placeholder score bounds (inclusive). 100 is never drawn.
pub const PLACEHOLDER_SCORE_MIN: u32 = 70;
pub const PLACEHOLDER_SCORE_MAX: u32 = 99;

pub const PLACEHOLDER_SUMMARY: &str =
    "Your tailored résumé has been generated with optimized keywords and formatting.";

/// Adjustments advertised alongside every tailored summary.
pub const TAILORING_HIGHLIGHTS: &[&str] = &[
    "Keywords optimized for ATS systems",
    "Skills section enhanced with job-relevant terms",
    "Experience descriptions tailored to match requirements",
];

// ────────────────────────────────────────────────────────────────────────────
// Data models
// ────────────────────────────────────────────────────────────────────────────

/// Frozen copy of the intake taken when an analysis starts.
#[derive(Debug, Clone)]
pub struct ScoringRequest {
    pub job_description: String,
    pub job_url: String,
    pub resume: ResumeFile,
}

/// What a scorer hands back to the workflow.
#[derive(Debug, Clone, PartialEq)]
pub struct FitAssessment {
    pub fit_score: u32, // 0 – 100
    pub tailored_summary: String,
    pub scorer_backend: String, // "random" | "http"
}

#[derive(Debug, Error)]
pub enum ScoringError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("scoring service error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("fit score {0} is outside 0-100")]
    ScoreOutOfRange(u32),

    #[error("scoring backend returned an empty summary")]
    EmptySummary,

    #[error("scoring timed out after {0:?}")]
    Timeout(Duration),
}

// ────────────────────────────────────────────────────────────────────────────
// Trait definition
// ────────────────────────────────────────────────────────────────────────────

/// Implement this to swap the analysis backend without touching the workflow,
/// session, or handler code.
#[async_trait]
pub trait FitScorer: Send + Sync {
    async fn score(&self, request: &ScoringRequest) -> Result<FitAssessment, ScoringError>;
}

/// Rejects assessments no tier or badge can render.
pub fn check_assessment(assessment: FitAssessment) -> Result<FitAssessment, ScoringError> {
    if assessment.fit_score > 100 {
        return Err(ScoringError::ScoreOutOfRange(assessment.fit_score));
    }
    if assessment.tailored_summary.trim().is_empty() {
        return Err(ScoringError::EmptySummary);
    }
    Ok(assessment)
}

// ────────────────────────────────────────────────────────────────────────────
// RandomFitScorer — placeholder
// ────────────────────────────────────────────────────────────────────────────

/// Uniform draw from [70, 99] plus a fixed summary. Ignores the request entirely.
pub struct RandomFitScorer;

#[async_trait]
impl FitScorer for RandomFitScorer {
    async fn score(&self, _request: &ScoringRequest) -> Result<FitAssessment, ScoringError> {
        Ok(FitAssessment {
            fit_score: draw_placeholder_score(),
            tailored_summary: PLACEHOLDER_SUMMARY.to_string(),
            scorer_backend: "random".to_string(),
        })
    }
}

fn draw_placeholder_score() -> u32 {
    rand::rng().random_range(PLACEHOLDER_SCORE_MIN..=PLACEHOLDER_SCORE_MAX)
}
