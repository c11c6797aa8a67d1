//! In-memory store implementation.
//!
//! Backs both collaborator traits with maps behind a `tokio::sync::Mutex`
//! for tests and single-process embedding.

use crate::persistence::{ResultStore, SessionStore, StoreError};
use async_trait::async_trait;
use chrono::Utc;
use pf_protocol::session_models::{PersistedResult, PipelineSession};
use std::collections::HashMap;
use tokio::sync::Mutex;
use uuid::Uuid;

/// In-memory [`SessionStore`] + [`ResultStore`].
#[derive(Default)]
pub struct MemoryStore {
    sessions: Mutex<HashMap<(String, Uuid), PipelineSession>>,
    results: Mutex<Vec<PersistedResult>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// All results persisted so far, in persist order.
    pub async fn results(&self) -> Vec<PersistedResult> {
        self.results.lock().await.clone()
    }

    /// Number of session records currently held.
    pub async fn session_count(&self) -> usize {
        self.sessions.lock().await.len()
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn put(&self, session: &PipelineSession) -> Result<(), StoreError> {
        let mut sessions = self.sessions.lock().await;
        sessions.insert(
            (session.owner_id.clone(), session.session_id),
            session.clone(),
        );
        Ok(())
    }

    async fn find_latest_incomplete(
        &self,
        owner_id: &str,
    ) -> Result<Option<PipelineSession>, StoreError> {
        let sessions = self.sessions.lock().await;
        let latest = sessions
            .values()
            .filter(|s| s.owner_id == owner_id && !s.stage.is_terminal())
            .max_by_key(|s| s.updated_at)
            .cloned();
        Ok(latest)
    }

    async fn delete(&self, owner_id: &str, session_id: Uuid) -> Result<(), StoreError> {
        let mut sessions = self.sessions.lock().await;
        sessions.remove(&(owner_id.to_string(), session_id));
        Ok(())
    }
}

#[async_trait]
impl ResultStore for MemoryStore {
    async fn persist(
        &self,
        session: &PipelineSession,
        include_details: bool,
    ) -> Result<PersistedResult, StoreError> {
        let result = PersistedResult {
            result_id: Uuid::new_v4(),
            owner_id: session.owner_id.clone(),
            candidate_count: session.candidates.len(),
            include_details,
            saved_at: Utc::now(),
        };

        let mut results = self.results.lock().await;
        results.push(result.clone());
        Ok(result)
    }
}
