//! WorkflowSession — one user's FitWorkflow plus the machinery for its deferred completion.
//!
//! `analyze()` returns as soon as the workflow is Processing. A spawned task waits the
//! configured delay, calls the scorer under a timeout, and applies the outcome. The
//! workflow lock is never held across either await.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::models::intake::{IntakeView, ResumeFile};
use crate::scoring::{FitScorer, ScoringError, TAILORING_HIGHLIGHTS};
use crate::workflow::fit_workflow::{
    AnalysisFailure, AnalysisRun, FitResult, FitWorkflow, WorkflowError, WorkflowPhase,
};
use crate::workflow::tier::{score_tier, ScoreTier};

#[derive(Debug, Clone, Copy)]
pub struct AnalysisTiming {
    /// Wait before the scorer is called.
    pub delay: Duration,
    /// Upper bound on a single scorer call.
    pub scoring_timeout: Duration,
}

impl Default for AnalysisTiming {
    fn default() -> Self {
        Self {
            delay: Duration::from_millis(3000),
            scoring_timeout: Duration::from_secs(30),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Snapshot models
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct ResultView {
    pub fit_score: u32,
    pub tier: ScoreTier,
    pub tier_message: String,
    pub tailored_summary: String,
    pub highlights: Vec<String>,
    pub scorer_backend: String,
    pub scored_at: DateTime<Utc>,
}

impl From<&FitResult> for ResultView {
    fn from(result: &FitResult) -> Self {
        let tier = score_tier(i64::from(result.fit_score));
        Self {
            fit_score: result.fit_score,
            tier,
            tier_message: tier.message().to_string(),
            tailored_summary: result.tailored_summary.clone(),
            highlights: TAILORING_HIGHLIGHTS.iter().map(|h| h.to_string()).collect(),
            scorer_backend: result.scorer_backend.clone(),
            scored_at: result.scored_at,
        }
    }
}

/// Everything the presentation layer renders for one session.
#[derive(Debug, Clone, Serialize)]
pub struct WorkflowSnapshot {
    pub session_id: Uuid,
    pub phase: WorkflowPhase,
    pub intake: IntakeView,
    pub can_analyze: bool,
    pub result: Option<ResultView>,
    pub failure: Option<AnalysisFailure>,
    pub created_at: DateTime<Utc>,
}

pub struct StartedAnalysis {
    /// Taken under the same lock as the Processing transition.
    pub snapshot: WorkflowSnapshot,
    /// Resolves once the outcome is applied. HTTP handlers detach it and clients poll.
    #[allow(dead_code)]
    pub completion: JoinHandle<()>,
}

// ────────────────────────────────────────────────────────────────────────────
// Session
// ────────────────────────────────────────────────────────────────────────────

struct SessionInner {
    workflow: FitWorkflow,
    last_touched: Instant,
}

#[derive(Clone)]
pub struct WorkflowSession {
    id: Uuid,
    created_at: DateTime<Utc>,
    inner: Arc<Mutex<SessionInner>>,
    scorer: Arc<dyn FitScorer>,
    timing: AnalysisTiming,
}

impl WorkflowSession {
    pub fn new(scorer: Arc<dyn FitScorer>, timing: AnalysisTiming) -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            inner: Arc::new(Mutex::new(SessionInner {
                workflow: FitWorkflow::new(),
                last_touched: Instant::now(),
            })),
            scorer,
            timing,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub async fn snapshot(&self) -> WorkflowSnapshot {
        let inner = self.inner.lock().await;
        self.snapshot_of(&inner.workflow)
    }

    /// Applies whichever job fields are present as a single edit.
    pub async fn update_job(
        &self,
        description: Option<String>,
        url: Option<String>,
    ) -> Result<WorkflowSnapshot, WorkflowError> {
        self.edit(|wf| {
            if let Some(text) = description {
                wf.set_job_description(text)?;
            }
            if let Some(text) = url {
                wf.set_job_url(text)?;
            }
            Ok(())
        })
        .await
    }

    pub async fn set_resume_file(&self, file: ResumeFile) -> Result<WorkflowSnapshot, WorkflowError> {
        self.edit(|wf| wf.set_resume_file(file)).await
    }

    pub async fn clear_resume_file(&self) -> Result<WorkflowSnapshot, WorkflowError> {
        self.edit(FitWorkflow::clear_resume_file).await
    }

    /// Starts an analysis. The returned handle resolves once the outcome is applied.
    pub async fn analyze(&self) -> Result<StartedAnalysis, WorkflowError> {
        let (run, snapshot) = {
            let mut inner = self.inner.lock().await;
            inner.last_touched = Instant::now();
            let run = inner.workflow.begin_analysis()?;
            (run, self.snapshot_of(&inner.workflow))
        };

        info!(session_id = %self.id, run_id = run.run_id, "Analysis started");

        let session = self.clone();
        let completion = tokio::spawn(async move { session.complete(run).await });

        Ok(StartedAnalysis {
            snapshot,
            completion,
        })
    }

    /// Records activity without changing the workflow. Reads count as activity.
    pub async fn touch(&self) {
        self.inner.lock().await.last_touched = Instant::now();
    }

    /// True when untouched for longer than `ttl` and not Processing.
    pub async fn is_expired(&self, ttl: Duration) -> bool {
        let inner = self.inner.lock().await;
        inner.workflow.phase() != WorkflowPhase::Processing && inner.last_touched.elapsed() > ttl
    }

    async fn complete(self, run: AnalysisRun) {
        tokio::time::sleep(self.timing.delay).await;

        let outcome =
            match tokio::time::timeout(self.timing.scoring_timeout, self.scorer.score(&run.request))
                .await
            {
                Ok(outcome) => outcome,
                Err(_) => Err(ScoringError::Timeout(self.timing.scoring_timeout)),
            };

        match &outcome {
            Ok(assessment) => info!(
                session_id = %self.id,
                run_id = run.run_id,
                fit_score = assessment.fit_score,
                backend = %assessment.scorer_backend,
                "Analysis scored"
            ),
            Err(e) => warn!(session_id = %self.id, run_id = run.run_id, "Analysis failed: {e}"),
        }

        let mut inner = self.inner.lock().await;
        if !inner.workflow.complete_analysis(run.run_id, outcome) {
            debug!(session_id = %self.id, run_id = run.run_id, "Discarded stale completion");
        }
    }

    async fn edit<F>(&self, f: F) -> Result<WorkflowSnapshot, WorkflowError>
    where
        F: FnOnce(&mut FitWorkflow) -> Result<(), WorkflowError>,
    {
        let mut inner = self.inner.lock().await;
        inner.last_touched = Instant::now();
        f(&mut inner.workflow)?;
        Ok(self.snapshot_of(&inner.workflow))
    }

    fn snapshot_of(&self, workflow: &FitWorkflow) -> WorkflowSnapshot {
        WorkflowSnapshot {
            session_id: self.id,
            phase: workflow.phase(),
            intake: workflow.intake().view(),
            can_analyze: workflow.can_analyze(),
            result: workflow.result().map(ResultView::from),
            failure: workflow.failure().cloned(),
            created_at: self.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    use async_trait::async_trait;
    use bytes::Bytes;

    use crate::scoring::{
        FitAssessment, ScoringRequest, PLACEHOLDER_SCORE_MAX, PLACEHOLDER_SCORE_MIN,
        RandomFitScorer,
    };

    /// Counts calls; fails the first `fail_first` of them.
    struct CountingScorer {
        calls: AtomicU32,
        fail_first: u32,
    }

    impl CountingScorer {
        fn new(fail_first: u32) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicU32::new(0),
                fail_first,
            })
        }
    }

    #[async_trait]
    impl FitScorer for CountingScorer {
        async fn score(&self, _request: &ScoringRequest) -> Result<FitAssessment, ScoringError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n < self.fail_first {
                return Err(ScoringError::Api {
                    status: 503,
                    message: "scoring service down".to_string(),
                });
            }
            Ok(FitAssessment {
                fit_score: 84,
                tailored_summary: "tailored".to_string(),
                scorer_backend: "counting".to_string(),
            })
        }
    }

    struct SlowScorer;

    #[async_trait]
    impl FitScorer for SlowScorer {
        async fn score(&self, _request: &ScoringRequest) -> Result<FitAssessment, ScoringError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            unreachable!("timeout fires first")
        }
    }

    fn timing() -> AnalysisTiming {
        AnalysisTiming {
            delay: Duration::from_millis(3000),
            scoring_timeout: Duration::from_secs(5),
        }
    }

    fn resume() -> ResumeFile {
        ResumeFile::new(
            "resume.pdf",
            Some("application/pdf".to_string()),
            Bytes::from_static(b"%PDF-1.7"),
        )
    }

    async fn ready_session(scorer: Arc<dyn FitScorer>) -> WorkflowSession {
        let session = WorkflowSession::new(scorer, timing());
        session
            .update_job(Some("Senior Engineer...".to_string()), None)
            .await
            .unwrap();
        session.set_resume_file(resume()).await.unwrap();
        session
    }

    #[tokio::test(start_paused = true)]
    async fn test_end_to_end_scores_in_placeholder_range() {
        let session = ready_session(Arc::new(RandomFitScorer)).await;

        let started = session.analyze().await.unwrap();
        assert_eq!(started.snapshot.phase, WorkflowPhase::Processing);
        assert!(!started.snapshot.can_analyze);

        started.completion.await.unwrap();

        let snapshot = session.snapshot().await;
        assert_eq!(snapshot.phase, WorkflowPhase::Scored);
        let result = snapshot.result.unwrap();
        assert!((PLACEHOLDER_SCORE_MIN..=PLACEHOLDER_SCORE_MAX).contains(&result.fit_score));
        assert!(!result.tailored_summary.is_empty());
        assert_eq!(result.tier, score_tier(i64::from(result.fit_score)));
        assert_eq!(result.highlights.len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_job_input_leaves_session_idle() {
        let session = WorkflowSession::new(Arc::new(RandomFitScorer), timing());
        session
            .update_job(Some(String::new()), Some(String::new()))
            .await
            .unwrap();
        session.set_resume_file(resume()).await.unwrap();

        let err = session.analyze().await.err().unwrap();
        assert_eq!(err, WorkflowError::MissingJobInput);
        assert_eq!(session.snapshot().await.phase, WorkflowPhase::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_resume_leaves_session_idle() {
        let session = WorkflowSession::new(Arc::new(RandomFitScorer), timing());
        session
            .update_job(None, Some("https://company.com/job".to_string()))
            .await
            .unwrap();

        let err = session.analyze().await.err().unwrap();
        assert_eq!(err, WorkflowError::MissingResume);
        assert_eq!(session.snapshot().await.phase, WorkflowPhase::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_still_processing_before_delay_elapses() {
        let scorer = CountingScorer::new(0);
        let session = ready_session(scorer.clone()).await;

        let started = session.analyze().await.unwrap();
        tokio::time::advance(Duration::from_millis(2999)).await;
        tokio::task::yield_now().await;

        assert_eq!(session.snapshot().await.phase, WorkflowPhase::Processing);
        assert_eq!(scorer.calls.load(Ordering::SeqCst), 0);

        started.completion.await.unwrap();
        assert_eq!(session.snapshot().await.phase, WorkflowPhase::Scored);
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_analyze_while_processing_has_no_effect() {
        let scorer = CountingScorer::new(0);
        let session = ready_session(scorer.clone()).await;

        let started = session.analyze().await.unwrap();
        let err = session.analyze().await.err().unwrap();
        assert_eq!(err, WorkflowError::AnalysisInFlight);

        started.completion.await.unwrap();
        assert_eq!(scorer.calls.load(Ordering::SeqCst), 1);
        assert_eq!(session.snapshot().await.phase, WorkflowPhase::Scored);
    }

    #[tokio::test(start_paused = true)]
    async fn test_edits_rejected_while_processing() {
        let session = ready_session(CountingScorer::new(0)).await;
        let started = session.analyze().await.unwrap();

        let err = session.clear_resume_file().await.unwrap_err();
        assert_eq!(err, WorkflowError::IntakeLocked);

        started.completion.await.unwrap();
        assert!(session.clear_resume_file().await.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_scorer_timeout_moves_to_failed() {
        let session = ready_session(Arc::new(SlowScorer)).await;

        session.analyze().await.unwrap().completion.await.unwrap();

        let snapshot = session.snapshot().await;
        assert_eq!(snapshot.phase, WorkflowPhase::Failed);
        assert!(snapshot.failure.unwrap().reason.contains("timed out"));
        assert!(snapshot.result.is_none());
        assert!(snapshot.can_analyze);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_after_scoring_error_reaches_scored() {
        let scorer = CountingScorer::new(1);
        let session = ready_session(scorer.clone()).await;

        session.analyze().await.unwrap().completion.await.unwrap();
        let failed = session.snapshot().await;
        assert_eq!(failed.phase, WorkflowPhase::Failed);
        assert!(failed.failure.unwrap().reason.contains("503"));

        session.analyze().await.unwrap().completion.await.unwrap();
        let scored = session.snapshot().await;
        assert_eq!(scored.phase, WorkflowPhase::Scored);
        assert!(scored.failure.is_none());
        assert_eq!(scored.result.unwrap().tier, ScoreTier::Great);
        assert_eq!(scorer.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_update_job_applies_both_fields() {
        let session = WorkflowSession::new(Arc::new(RandomFitScorer), timing());
        let snapshot = session
            .update_job(Some("Rust role".to_string()), Some("https://x.io/j".to_string()))
            .await
            .unwrap();
        assert_eq!(snapshot.intake.job_description, "Rust role");
        assert_eq!(snapshot.intake.job_url, "https://x.io/j");
        assert!(!snapshot.intake.complete);

        let snapshot = session.update_job(None, Some(String::new())).await.unwrap();
        assert_eq!(snapshot.intake.job_description, "Rust role");
        assert!(snapshot.intake.job_url.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_expiry_tracks_last_touch() {
        let session = ready_session(Arc::new(RandomFitScorer)).await;
        let ttl = Duration::from_secs(60);
        assert!(!session.is_expired(ttl).await);

        tokio::time::advance(Duration::from_secs(61)).await;
        assert!(session.is_expired(ttl).await);

        session
            .update_job(None, Some("https://x.io".to_string()))
            .await
            .unwrap();
        assert!(!session.is_expired(ttl).await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_touch_resets_idle_clock() {
        let session = ready_session(Arc::new(RandomFitScorer)).await;
        let ttl = Duration::from_secs(60);

        tokio::time::advance(ttl).await;
        assert!(!session.is_expired(ttl).await);

        tokio::time::advance(Duration::from_secs(30)).await;
        assert!(session.is_expired(ttl).await);

        session.touch().await;
        assert!(!session.is_expired(ttl).await);
    }
}
