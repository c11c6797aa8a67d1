//! Derived progress reporting models.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// A derived, never-stored snapshot of overall pipeline progress.
///
/// Recomputed from the session's counters and stage on every state
/// change; the percent is monotonic within a stage and jumps
/// deterministically at each stage boundary.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, TS)]
pub struct ProgressSnapshot {
    /// Overall progress in the 0-100 range.
    pub overall_percent: f64,

    /// Zero-based index of the current stage among the working stages.
    pub stage_index: usize,

    /// Number of working (non-terminal) stages.
    pub stage_count: usize,

    /// Human-readable status line for the current stage.
    pub message: String,
}
