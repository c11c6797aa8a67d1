//! Session mutation helpers.
//!
//! This module provides the functions that mutate a [`PipelineSession`]
//! and emit the corresponding domain events. Every mutation goes
//! through here so that event emission, `updated_at` touching, and
//! progress recomputation stay in one place.

use pf_protocol::events::Event;
use pf_protocol::plan_models::{Candidate, Item, ItemState, Unit};
use pf_protocol::session_models::{PipelineSession, Stage};
use tokio::sync::mpsc::Sender;
use tracing::{debug, warn};

use crate::progress;

/// Move the session to a new stage and emit `StageChanged`.
pub async fn enter_stage(session: &mut PipelineSession, events_tx: &Sender<Event>, stage: Stage) {
    debug!(session_id = %session.session_id, from = ?session.stage, to = ?stage, "stage transition");
    session.stage = stage;
    session.touch();
    let _ = events_tx
        .send(Event::StageChanged {
            session_id: session.session_id,
            stage,
        })
        .await;
}

/// Append a streamed unit to the first candidate and emit
/// `UnitReceived` + `ProgressUpdated`.
///
/// The first candidate is created on demand; the caller has already
/// suppressed duplicate units.
pub async fn record_unit(session: &mut PipelineSession, events_tx: &Sender<Event>, unit: Unit) {
    if session.candidates.is_empty() {
        session.candidates.push(Candidate::default());
    }

    let unit_index = unit.index;
    session.candidates[0].units.push(unit);
    session.received_units += 1;
    session.touch();

    let _ = events_tx
        .send(Event::UnitReceived {
            session_id: session.session_id,
            candidate_index: 0,
            unit_index,
        })
        .await;
    emit_progress(session, events_tx).await;
}

/// Flip one item from pending to ready with its detail payload.
///
/// The slot is keyed by the dispatched `item_index`, not by whatever
/// index the service put on the payload; the payload's index is
/// overwritten so a misbehaving service cannot settle a sibling.
/// Emits `ItemReady` + `ProgressUpdated`. A no-op if the item has
/// already settled (the pending -> ready transition is one-way).
pub async fn settle_item_ready(
    session: &mut PipelineSession,
    events_tx: &Sender<Event>,
    candidate_index: usize,
    unit_index: usize,
    item_index: usize,
    mut detailed: Item,
) {
    let Some(slot) = item_slot(session, candidate_index, unit_index, item_index) else {
        return;
    };
    if slot.state.is_settled() {
        return;
    }

    detailed.index = item_index;
    *slot = detailed;
    session.received_units += 1;
    session.touch();

    let _ = events_tx
        .send(Event::ItemReady {
            session_id: session.session_id,
            candidate_index,
            unit_index,
            item_index,
        })
        .await;
    emit_progress(session, events_tx).await;
}

/// Record an item-scoped failure without aborting the stage.
///
/// Emits `ItemFailed` + `ProgressUpdated`.
pub async fn settle_item_failed(
    session: &mut PipelineSession,
    events_tx: &Sender<Event>,
    candidate_index: usize,
    unit_index: usize,
    item_index: usize,
    error: String,
) {
    let Some(slot) = item_slot(session, candidate_index, unit_index, item_index) else {
        return;
    };
    if slot.state.is_settled() {
        return;
    }

    slot.state = ItemState::Failed {
        error: error.clone(),
    };
    session.received_units += 1;
    session.touch();

    let _ = events_tx
        .send(Event::ItemFailed {
            session_id: session.session_id,
            candidate_index,
            unit_index,
            item_index,
            error,
        })
        .await;
    emit_progress(session, events_tx).await;
}

/// Absorb a recoverable generation failure into `last_error`.
///
/// The session keeps its stage and already-received work; the caller
/// may retry the same operation. Emits `GenerationError`.
pub async fn record_recoverable_error(
    session: &mut PipelineSession,
    events_tx: &Sender<Event>,
    error: String,
) {
    warn!(session_id = %session.session_id, stage = ?session.stage, %error, "recoverable generation failure");
    session.last_error = Some(error.clone());
    session.touch();
    let _ = events_tx
        .send(Event::GenerationError {
            session_id: session.session_id,
            error,
        })
        .await;
}

/// Emit a fresh `ProgressUpdated` snapshot.
pub async fn emit_progress(session: &PipelineSession, events_tx: &Sender<Event>) {
    let _ = events_tx
        .send(Event::ProgressUpdated {
            session_id: session.session_id,
            snapshot: progress::snapshot(session),
        })
        .await;
}

fn item_slot<'a>(
    session: &'a mut PipelineSession,
    candidate_index: usize,
    unit_index: usize,
    item_index: usize,
) -> Option<&'a mut Item> {
    session
        .candidates
        .get_mut(candidate_index)?
        .units
        .get_mut(unit_index)?
        .items
        .get_mut(item_index)
}
