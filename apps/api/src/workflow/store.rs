use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::info;
use uuid::Uuid;

use crate::workflow::session::WorkflowSession;

/// In-memory registry of live sessions. Nothing here outlives the process.
#[derive(Clone, Default)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<Uuid, WorkflowSession>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, session: WorkflowSession) {
        self.sessions.write().await.insert(session.id(), session);
    }

    /// Looks up a session and marks it active before the read lock is released,
    /// so a concurrent prune cannot remove it between lookup and use.
    pub async fn get(&self, id: Uuid) -> Option<WorkflowSession> {
        let sessions = self.sessions.read().await;
        let session = sessions.get(&id)?.clone();
        session.touch().await;
        Some(session)
    }

    pub async fn remove(&self, id: Uuid) -> Option<WorkflowSession> {
        self.sessions.write().await.remove(&id)
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Drops sessions idle for longer than `ttl`. Sessions mid-analysis are kept.
    ///
    /// Expiry is checked and applied under one write lock, so activity that lands
    /// before the lock is taken always keeps the session.
    pub async fn prune_expired(&self, ttl: Duration) -> usize {
        let mut sessions = self.sessions.write().await;

        let mut expired = Vec::new();
        for (id, session) in sessions.iter() {
            if session.is_expired(ttl).await {
                expired.push(*id);
            }
        }

        for id in &expired {
            sessions.remove(id);
        }
        if !expired.is_empty() {
            info!("Pruned {} idle sessions", expired.len());
        }
        expired.len()
    }

    /// Runs `prune_expired` every `every` until the runtime shuts down.
    pub fn spawn_pruner(&self, ttl: Duration, every: Duration) -> JoinHandle<()> {
        let store = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            loop {
                ticker.tick().await;
                store.prune_expired(ttl).await;
            }
        })
    }
}
