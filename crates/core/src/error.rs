//! Error types for pipeline operations.
//!
//! The taxonomy separates synchronous precondition failures (caller
//! bugs or user-correctable input, rejected before any mutation) from
//! transport-class failures (absorbed into the session's `last_error`
//! so the caller can retry without losing progress) and persistence
//! failures (surfaced, non-fatal to in-memory state).

use pf_protocol::session_models::Stage;
use thiserror::Error;
use uuid::Uuid;

use crate::persistence::StoreError;
use crate::service::ServiceError;

/// Errors returned by pipeline operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PipelineError {
    /// Operation invoked while the session is in a stage that does not
    /// permit it. Always a caller bug; never retried automatically.
    #[error("Operation '{operation}' is not legal in stage {stage:?}")]
    InvalidStage {
        operation: &'static str,
        stage: Stage,
    },

    /// `generate()` called before the required configuration fields were
    /// set. User-correctable; the session stays in `Configuration`.
    #[error("Generation config is incomplete: {0}")]
    IncompleteConfig(String),

    /// `start()` called while an active or resumable session exists for
    /// this owner. Resolved by routing through the recovery gate.
    #[error("An active session {session_id} already exists for this owner")]
    AlreadyActive { session_id: Uuid },

    /// A second `save()` arrived while the first was still in flight.
    /// The losing caller must requery the outcome rather than
    /// double-submit.
    #[error("A save is already in flight for this session")]
    SaveInProgress,

    /// Operation invoked with no session installed.
    #[error("Operation '{operation}' requires an active session")]
    NoActiveSession { operation: &'static str },

    /// Candidate or unit index out of range.
    #[error("No unit at candidate {candidate}, unit {unit}")]
    UnknownUnit { candidate: usize, unit: usize },

    /// The generation service call failed outright.
    #[error("Generation service call failed: {0}")]
    Transport(#[from] ServiceError),

    /// The persistence collaborator failed to read or write a session.
    #[error("Persistence failed: {0}")]
    Persistence(#[from] StoreError),
}

/// Type alias for Result with PipelineError.
pub type PipelineResult<T> = Result<T, PipelineError>;
