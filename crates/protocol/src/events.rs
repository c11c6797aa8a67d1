//! Domain events emitted by the pipeline engine.
//!
//! The engine exposes its session and derived progress as read-only
//! observable state and emits these discrete, named events on an
//! asynchronous channel. Presentation-layer side effects (sounds,
//! toasts, navigation) subscribe to the channel; the engine itself
//! performs no side effects beyond state mutation and emission.
//!
//! Uses tagged enum serialization for TypeScript compatibility:
//! ```json
//! {
//!   "type": "unitReceived",
//!   "payload": {
//!     "session_id": "uuid-here",
//!     "candidate_index": 0,
//!     "unit_index": 3
//!   }
//! }
//! ```

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::progress_models::ProgressSnapshot;
use crate::session_models::Stage;

/// Events sent from the pipeline engine to its observers.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(tag = "type", content = "payload", rename_all = "camelCase")]
pub enum Event {
    /// A new session has been created in the `Configuration` stage.
    SessionStarted {
        #[ts(type = "string")]
        session_id: Uuid,
        owner_id: String,
    },

    /// A persisted session was reconstructed after a reload.
    SessionResumed {
        #[ts(type = "string")]
        session_id: Uuid,
        stage: Stage,
    },

    /// The session moved to a new stage.
    StageChanged {
        #[ts(type = "string")]
        session_id: Uuid,
        stage: Stage,
    },

    /// A plan-level unit arrived from the generation stream.
    UnitReceived {
        #[ts(type = "string")]
        session_id: Uuid,
        candidate_index: usize,
        unit_index: usize,
    },

    /// One item's detail generation completed.
    ItemReady {
        #[ts(type = "string")]
        session_id: Uuid,
        candidate_index: usize,
        unit_index: usize,
        item_index: usize,
    },

    /// One item's detail generation failed; siblings are unaffected.
    ItemFailed {
        #[ts(type = "string")]
        session_id: Uuid,
        candidate_index: usize,
        unit_index: usize,
        item_index: usize,
        error: String,
    },

    /// Derived progress changed.
    ///
    /// Observers should replace any previously displayed snapshot.
    ProgressUpdated {
        #[ts(type = "string")]
        session_id: Uuid,
        snapshot: ProgressSnapshot,
    },

    /// A recoverable generation failure was absorbed; the session keeps
    /// its received units and the caller may retry the same operation.
    GenerationError {
        #[ts(type = "string")]
        session_id: Uuid,
        error: String,
    },

    /// The session reached terminal `Saved`.
    SessionSaved {
        #[ts(type = "string")]
        session_id: Uuid,
        #[ts(type = "string")]
        result_id: Uuid,
    },

    /// The session reached terminal `Discarded`.
    SessionDiscarded {
        #[ts(type = "string")]
        session_id: Uuid,
    },
}
