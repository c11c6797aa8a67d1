//! Persistence collaborator boundary.
//!
//! Sessions are persisted keyed by `(owner_id, session_id)` so an
//! interrupted run can be found again after a reload; final results are
//! handed to a separate sink that owns them beyond the pipeline's
//! lifecycle. Both contracts are traits so the backing store (BaaS
//! table, SQL, memory) stays out of the engine.

pub mod memory;

pub use memory::MemoryStore;

use async_trait::async_trait;
use pf_protocol::session_models::{PersistedResult, PipelineSession};
use thiserror::Error;
use uuid::Uuid;

/// Errors produced by the persistence collaborators.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The store could not be reached.
    #[error("Session store unavailable: {0}")]
    Unavailable(String),

    /// A read or write was attempted and rejected.
    #[error("Store operation failed: {0}")]
    OperationFailed(String),
}

/// Read/write access to persisted pipeline sessions.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Insert or overwrite the session record for
    /// `(session.owner_id, session.session_id)`.
    async fn put(&self, session: &PipelineSession) -> Result<(), StoreError>;

    /// Find the owner's most recent incomplete (non-terminal) session,
    /// by `updated_at` (last-writer-wins on reload).
    async fn find_latest_incomplete(
        &self,
        owner_id: &str,
    ) -> Result<Option<PipelineSession>, StoreError>;

    /// Delete one session record. Deleting a missing record is not an
    /// error.
    async fn delete(&self, owner_id: &str, session_id: Uuid) -> Result<(), StoreError>;
}

/// Sink that converts a session's candidates into permanent records.
///
/// The records it creates are owned by the library/collection feature
/// afterwards, not by the pipeline.
#[async_trait]
pub trait ResultStore: Send + Sync {
    /// Persist the session's candidates and return a receipt.
    async fn persist(
        &self,
        session: &PipelineSession,
        include_details: bool,
    ) -> Result<PersistedResult, StoreError>;
}
