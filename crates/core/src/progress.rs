//! Derived progress computation.
//!
//! Each of the five working stages is allotted an equal span of the
//! 0-100 range in enumeration order; within a streaming stage the span
//! fills proportionally to `received_units / total_units`. Progress is
//! therefore monotonic within a stage and jumps deterministically at
//! each stage boundary.

use pf_protocol::progress_models::ProgressSnapshot;
use pf_protocol::session_models::{PipelineSession, Stage};

/// Number of non-terminal working stages.
pub const STAGE_COUNT: usize = 5;

const STAGE_SPAN: f64 = 100.0 / STAGE_COUNT as f64;

/// Zero-based position of a stage among the working stages.
///
/// Terminal stages report the last working index so observers keep a
/// full bar.
pub fn stage_index(stage: Stage) -> usize {
    match stage {
        Stage::Configuration => 0,
        Stage::Generating => 1,
        Stage::Validation => 2,
        Stage::DetailGenerating => 3,
        Stage::DetailValidation | Stage::Saved | Stage::Discarded => 4,
    }
}

/// Compute the current progress snapshot for a session.
pub fn snapshot(session: &PipelineSession) -> ProgressSnapshot {
    let index = stage_index(session.stage);

    let overall_percent = match session.stage {
        Stage::Saved => 100.0,
        Stage::Discarded => 0.0,
        stage => {
            let base = index as f64 * STAGE_SPAN;
            let fraction = stage_fraction(session, stage);
            base + fraction * STAGE_SPAN
        }
    };

    ProgressSnapshot {
        overall_percent,
        stage_index: index,
        stage_count: STAGE_COUNT,
        message: message(session),
    }
}

/// Fill fraction within the current stage's span, clamped to [0, 1].
fn stage_fraction(session: &PipelineSession, stage: Stage) -> f64 {
    match stage {
        Stage::Generating | Stage::DetailGenerating => match session.total_units {
            Some(total) if total > 0 => {
                (session.received_units as f64 / total as f64).clamp(0.0, 1.0)
            }
            _ => 0.0,
        },
        _ => 0.0,
    }
}

fn message(session: &PipelineSession) -> String {
    match session.stage {
        Stage::Configuration => "Choose your plan options".to_string(),
        Stage::Generating => match session.total_units {
            Some(total) => format!(
                "Generating plan: day {} of {}",
                session.received_units, total
            ),
            None => "Generating plan...".to_string(),
        },
        Stage::Validation => "Review your plan".to_string(),
        Stage::DetailGenerating => match session.total_units {
            Some(total) => format!(
                "Generating details: {} of {}",
                session.received_units, total
            ),
            None => "Generating details...".to_string(),
        },
        Stage::DetailValidation => "Review the final plan".to_string(),
        Stage::Saved => "Plan saved".to_string(),
        Stage::Discarded => "Session discarded".to_string(),
    }
}
