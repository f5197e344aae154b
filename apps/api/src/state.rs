use std::sync::Arc;

use crate::config::Config;
use crate::scoring::FitScorer;
use crate::workflow::session::WorkflowSession;
use crate::workflow::store::SessionStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Pluggable fit scorer. Default: RandomFitScorer. Swap via SCORING_SERVICE_URL.
    pub fit_scorer: Arc<dyn FitScorer>,
    pub sessions: SessionStore,
}

impl AppState {
    /// Creates and registers a fresh session wired to the configured scorer and timing.
    pub async fn open_session(&self) -> WorkflowSession {
        let session = WorkflowSession::new(self.fit_scorer.clone(), self.config.analysis_timing());
        self.sessions.insert(session.clone()).await;
        session
    }
}
