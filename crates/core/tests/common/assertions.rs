//! Custom assertion helpers over collected event sequences.

use pf_protocol::events::Event;
use pf_protocol::session_models::Stage;
use tokio::sync::mpsc;

/// Drain every event currently buffered on the channel.
///
/// Engine operations complete before returning, so once an operation's
/// future resolves all of its events are already buffered.
#[allow(dead_code)]
pub fn drain_events(rx: &mut mpsc::Receiver<Event>) -> Vec<Event> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

/// Whether the sequence contains a `StageChanged` into the given stage.
#[allow(dead_code)]
pub fn has_stage_change(events: &[Event], stage: Stage) -> bool {
    events
        .iter()
        .any(|e| matches!(e, Event::StageChanged { stage: s, .. } if *s == stage))
}

/// Number of `UnitReceived` events in the sequence.
#[allow(dead_code)]
pub fn count_unit_received(events: &[Event]) -> usize {
    events
        .iter()
        .filter(|e| matches!(e, Event::UnitReceived { .. }))
        .count()
}

/// Number of `ItemReady` events in the sequence.
#[allow(dead_code)]
pub fn count_item_ready(events: &[Event]) -> usize {
    events
        .iter()
        .filter(|e| matches!(e, Event::ItemReady { .. }))
        .count()
}

/// Number of `ItemFailed` events in the sequence.
#[allow(dead_code)]
pub fn count_item_failed(events: &[Event]) -> usize {
    events
        .iter()
        .filter(|e| matches!(e, Event::ItemFailed { .. }))
        .count()
}

/// The overall percentage of the last `ProgressUpdated` event.
#[allow(dead_code)]
pub fn last_progress_percent(events: &[Event]) -> Option<f64> {
    events.iter().rev().find_map(|e| match e {
        Event::ProgressUpdated { snapshot, .. } => Some(snapshot.overall_percent),
        _ => None,
    })
}

/// Assert that progress percentages never decrease across the sequence.
#[allow(dead_code)]
pub fn assert_progress_monotonic(events: &[Event]) {
    let mut previous = 0.0_f64;
    for event in events {
        if let Event::ProgressUpdated { snapshot, .. } = event {
            assert!(
                snapshot.overall_percent >= previous,
                "progress went backwards: {} -> {}",
                previous,
                snapshot.overall_percent
            );
            previous = snapshot.overall_percent;
        }
    }
}
