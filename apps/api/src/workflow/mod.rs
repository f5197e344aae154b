// AutoApply fit workflow: intake → validation → deferred scoring → tiered result.
// Scoring itself lives behind `crate::scoring::FitScorer`; nothing here knows which backend runs.

pub mod fit_workflow;
pub mod handlers;
pub mod session;
pub mod store;
pub mod tier;
