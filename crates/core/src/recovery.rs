//! Session recovery gate.
//!
//! Before starting a new session, callers consult the gate: it looks up
//! the owner's most recent incomplete session and classifies it. A
//! session parked in one of the validation stages can be reinstalled
//! exactly as persisted; a session interrupted mid-stream is abandoned,
//! because a half-consumed stream cannot be re-entered, and the caller
//! is expected to restart.

use pf_protocol::session_models::PipelineSession;
use std::sync::Arc;
use tracing::{debug, info};

use crate::error::PipelineResult;
use crate::persistence::SessionStore;
use crate::pipeline::GenerationPipeline;

/// What the gate found for an owner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecoveryOutcome {
    /// No incomplete session on record; start fresh.
    NoSession,
    /// An incomplete session that can be reinstalled as-is.
    Resumable(PipelineSession),
    /// An incomplete session interrupted mid-stream; its partial work
    /// is preserved in the record but it cannot be re-entered.
    Abandoned(PipelineSession),
}

/// Classifies persisted sessions and routes them back into an engine.
pub struct RecoveryGate {
    sessions: Arc<dyn SessionStore>,
}

impl RecoveryGate {
    pub fn new(sessions: Arc<dyn SessionStore>) -> Self {
        Self { sessions }
    }

    /// Look up and classify the owner's latest incomplete session.
    ///
    /// # Errors
    ///
    /// Propagates store failures; classification itself cannot fail.
    pub async fn check(&self, owner_id: &str) -> PipelineResult<RecoveryOutcome> {
        let Some(session) = self.sessions.find_latest_incomplete(owner_id).await? else {
            return Ok(RecoveryOutcome::NoSession);
        };

        if session.stage.is_resumable() {
            debug!(session_id = %session.session_id, stage = ?session.stage, "resumable session found");
            Ok(RecoveryOutcome::Resumable(session))
        } else {
            debug!(session_id = %session.session_id, stage = ?session.stage, "abandoned session found");
            Ok(RecoveryOutcome::Abandoned(session))
        }
    }

    /// Reinstall a resumable session into the engine.
    ///
    /// # Errors
    ///
    /// Fails if the engine already has an active session or the session
    /// is not in a resumable stage; see [`GenerationPipeline::resume`].
    pub async fn resume(
        &self,
        engine: &mut GenerationPipeline,
        session: PipelineSession,
    ) -> PipelineResult<()> {
        engine.resume(session).await
    }

    /// Drop whatever incomplete session the owner has and start fresh.
    ///
    /// This is the only route for [`RecoveryOutcome::Abandoned`], and also
    /// the explicit "start over" choice for a resumable one.
    pub async fn restart(
        &self,
        engine: &mut GenerationPipeline,
        owner_id: &str,
    ) -> PipelineResult<PipelineSession> {
        if let Some(existing) = self.sessions.find_latest_incomplete(owner_id).await? {
            info!(session_id = %existing.session_id, "dropping incomplete session before restart");
            self.sessions
                .delete(owner_id, existing.session_id)
                .await?;
        }

        let session = engine.start(owner_id).await?.clone();
        Ok(session)
    }
}
