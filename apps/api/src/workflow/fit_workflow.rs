//! FitWorkflow — intake, readiness checks, and the Idle → Processing → Scored lifecycle.
//!
//! This type is synchronous and owns no timers. `WorkflowSession` drives the deferred
//! completion: it calls `begin_analysis`, awaits the scorer, then hands the outcome back
//! through `complete_analysis`.

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::models::intake::{IntakeState, ResumeFile};
use crate::scoring::{FitAssessment, ScoringError, ScoringRequest};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowPhase {
    #[default]
    Idle,
    Processing,
    Scored,
    /// Scoring backend errored or timed out. Re-analyzable.
    Failed,
}

/// Present iff phase == Scored.
#[derive(Debug, Clone, Serialize)]
pub struct FitResult {
    pub fit_score: u32,
    pub tailored_summary: String,
    pub scorer_backend: String,
    pub scored_at: DateTime<Utc>,
}

/// Present iff phase == Failed.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisFailure {
    pub reason: String,
    pub failed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkflowError {
    #[error("missing job input")]
    MissingJobInput,

    #[error("missing resume")]
    MissingResume,

    #[error("an analysis is already in progress")]
    AnalysisInFlight,

    #[error("intake cannot be edited while an analysis is in progress")]
    IntakeLocked,
}

impl WorkflowError {
    /// Blocking intake problems the user has to fix, as opposed to lifecycle conflicts.
    pub fn is_validation(&self) -> bool {
        matches!(self, WorkflowError::MissingJobInput | WorkflowError::MissingResume)
    }
}

/// Handle for one in-flight analysis. The run id ties the completion back to it.
#[derive(Debug, Clone)]
pub struct AnalysisRun {
    pub run_id: u64,
    pub request: ScoringRequest,
}

#[derive(Debug, Default)]
pub struct FitWorkflow {
    phase: WorkflowPhase,
    intake: IntakeState,
    result: Option<FitResult>,
    failure: Option<AnalysisFailure>,
    current_run: u64,
}

impl FitWorkflow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> WorkflowPhase {
        self.phase
    }

    pub fn intake(&self) -> &IntakeState {
        &self.intake
    }

    pub fn result(&self) -> Option<&FitResult> {
        self.result.as_ref()
    }

    pub fn failure(&self) -> Option<&AnalysisFailure> {
        self.failure.as_ref()
    }

    /// Mirrors the trigger rule: disabled while Processing or with incomplete intake.
    pub fn can_analyze(&self) -> bool {
        self.phase != WorkflowPhase::Processing && self.intake.is_complete()
    }

    pub fn set_job_description(&mut self, text: impl Into<String>) -> Result<(), WorkflowError> {
        self.ensure_editable()?;
        self.intake.job_description = text.into();
        Ok(())
    }

    pub fn set_job_url(&mut self, text: impl Into<String>) -> Result<(), WorkflowError> {
        self.ensure_editable()?;
        self.intake.job_url = text.into();
        Ok(())
    }

    /// Replaces any previous résumé. Type and size are not checked here.
    pub fn set_resume_file(&mut self, file: ResumeFile) -> Result<(), WorkflowError> {
        self.ensure_editable()?;
        self.intake.resume = Some(file);
        Ok(())
    }

    pub fn clear_resume_file(&mut self) -> Result<(), WorkflowError> {
        self.ensure_editable()?;
        self.intake.resume = None;
        Ok(())
    }

    /// Validates intake and moves to Processing.
    ///
    /// Checks, in order: in-flight analysis, job input, résumé. On error nothing changes.
    pub fn begin_analysis(&mut self) -> Result<AnalysisRun, WorkflowError> {
        if self.phase == WorkflowPhase::Processing {
            return Err(WorkflowError::AnalysisInFlight);
        }
        if !self.intake.has_job_input() {
            return Err(WorkflowError::MissingJobInput);
        }
        let resume = self
            .intake
            .resume
            .clone()
            .ok_or(WorkflowError::MissingResume)?;

        self.current_run += 1;
        self.phase = WorkflowPhase::Processing;
        self.result = None;
        self.failure = None;

        Ok(AnalysisRun {
            run_id: self.current_run,
            request: ScoringRequest {
                job_description: self.intake.job_description.clone(),
                job_url: self.intake.job_url.clone(),
                resume,
            },
        })
    }

    /// Applies the scorer outcome. Returns false (and changes nothing) unless `run_id`
    /// is the analysis currently Processing, so each run lands exactly once.
    pub fn complete_analysis(
        &mut self,
        run_id: u64,
        outcome: Result<FitAssessment, ScoringError>,
    ) -> bool {
        if self.phase != WorkflowPhase::Processing || run_id != self.current_run {
            return false;
        }

        match outcome {
            Ok(assessment) => {
                self.result = Some(FitResult {
                    fit_score: assessment.fit_score,
                    tailored_summary: assessment.tailored_summary,
                    scorer_backend: assessment.scorer_backend,
                    scored_at: Utc::now(),
                });
                self.phase = WorkflowPhase::Scored;
            }
            Err(e) => {
                self.failure = Some(AnalysisFailure {
                    reason: e.to_string(),
                    failed_at: Utc::now(),
                });
                self.phase = WorkflowPhase::Failed;
            }
        }
        true
    }

    fn ensure_editable(&self) -> Result<(), WorkflowError> {
        if self.phase == WorkflowPhase::Processing {
            Err(WorkflowError::IntakeLocked)
        } else {
            Ok(())
        }
    }
}
