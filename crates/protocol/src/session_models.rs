//! Pipeline session state models.
//!
//! This module defines the structures for tracking the state of one
//! generation pipeline run: the stage enumeration, the user-chosen
//! generation configuration, and the persisted session record itself.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::plan_models::Candidate;

/// Represents the current stage of a generation pipeline session.
///
/// The stage progresses through these states during normal execution:
/// Configuration -> Generating -> Validation -> DetailGenerating ->
/// DetailValidation -> Saved
///
/// Special states:
/// - Saved: terminal, the candidates were converted into permanent records
/// - Discarded: terminal, reachable from any non-terminal stage
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, TS)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Stage {
    /// The user is still assembling the generation configuration.
    Configuration,

    /// The plan-level generation stream is in flight.
    ///
    /// Units are appended to the session as the external service streams
    /// them. A session persisted in this stage is not resumable.
    Generating,

    /// A full plan has been generated and awaits user review.
    Validation,

    /// Per-item detail generation is in flight.
    ///
    /// Items flip pending -> ready (or pending -> failed) independently
    /// and out of order. A session persisted in this stage is not
    /// resumable.
    DetailGenerating,

    /// Every item has settled (ready or failed) and awaits final review.
    DetailValidation,

    /// Terminal: the candidates were persisted as permanent records.
    Saved,

    /// Terminal: the session was explicitly discarded by the user.
    Discarded,
}

impl Stage {
    /// Whether this stage is terminal (no further transitions).
    pub fn is_terminal(self) -> bool {
        matches!(self, Stage::Saved | Stage::Discarded)
    }

    /// Whether a session persisted in this stage may be resumed after a
    /// reload.
    ///
    /// Only the two validation stages protect generated work that the
    /// user has not yet decided on. `Configuration` has nothing to
    /// protect, and the streaming stages are abandoned on reload because
    /// a stream cannot be rejoined mid-flight.
    pub fn is_resumable(self) -> bool {
        matches!(self, Stage::Validation | Stage::DetailValidation)
    }
}

/// User-chosen generation parameters, frozen once generation starts.
///
/// The config is mutable only while the session is in the
/// `Configuration` stage; changing it afterwards requires discarding and
/// starting a new session.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, TS)]
pub struct GenerationConfig {
    /// Number of weekly periods to generate. Must be at least 1.
    pub week_count: u32,

    /// Reference to the source inventory the plan draws from.
    ///
    /// Required before `generate()` is legal.
    pub source_id: Option<String>,

    /// Prefer items already present in the source inventory.
    pub prefer_inventory: bool,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            week_count: 1,
            source_id: None,
            prefer_inventory: false,
        }
    }
}

impl GenerationConfig {
    /// Merge a partial update into this config.
    ///
    /// Fields absent from the patch are left unchanged.
    pub fn apply(&mut self, patch: ConfigPatch) {
        if let Some(week_count) = patch.week_count {
            self.week_count = week_count;
        }
        if let Some(source_id) = patch.source_id {
            self.source_id = Some(source_id);
        }
        if let Some(prefer_inventory) = patch.prefer_inventory {
            self.prefer_inventory = prefer_inventory;
        }
    }
}

/// A partial update to a [`GenerationConfig`].
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq, TS)]
pub struct ConfigPatch {
    pub week_count: Option<u32>,
    pub source_id: Option<String>,
    pub prefer_inventory: Option<bool>,
}

/// The persisted unit of pipeline progress.
///
/// One session exists per pipeline run, scoped to exactly one owner.
/// It is created at `start()`, mutated as configuration is set and
/// generation progresses, and destroyed when the user saves or discards.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, TS)]
pub struct PipelineSession {
    /// Unique identifier for this session, generated at pipeline start.
    #[ts(type = "string")]
    pub session_id: Uuid,

    /// Identifier of the requesting user.
    pub owner_id: String,

    /// Current stage in the pipeline.
    pub stage: Stage,

    /// Generation configuration, frozen once `generate()` is called.
    pub config: GenerationConfig,

    /// Generated results so far. Append-only within a stage; replaced
    /// wholesale on restart.
    pub candidates: Vec<Candidate>,

    /// Completions received in the current streaming stage (units while
    /// generating, items while generating details).
    pub received_units: usize,

    /// Expected completions for the current streaming stage, once known.
    pub total_units: Option<usize>,

    /// Most recent recoverable error, surfaced for retry instead of
    /// thrown. Cleared when the operation later succeeds.
    pub last_error: Option<String>,

    /// Timestamp of the last mutation. Used for display and as the
    /// last-writer-wins tie break on reload.
    pub updated_at: DateTime<Utc>,
}

impl PipelineSession {
    /// Create a fresh session in the `Configuration` stage.
    pub fn new(owner_id: impl Into<String>) -> Self {
        Self {
            session_id: Uuid::new_v4(),
            owner_id: owner_id.into(),
            stage: Stage::Configuration,
            config: GenerationConfig::default(),
            candidates: Vec::new(),
            received_units: 0,
            total_units: None,
            last_error: None,
            updated_at: Utc::now(),
        }
    }

    /// Bump `updated_at` to now. Call after every mutation.
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// Receipt returned when a session's candidates are converted into
/// permanent records.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, TS)]
pub struct PersistedResult {
    #[ts(type = "string")]
    pub result_id: Uuid,

    pub owner_id: String,

    /// Number of candidates persisted.
    pub candidate_count: usize,

    /// Whether per-item details were included in the saved records.
    pub include_details: bool,

    pub saved_at: DateTime<Utc>,
}
