//! Generated plan models.
//!
//! A pipeline run produces a three-level tree: a [`Candidate`] (e.g. one
//! generated week) owns an ordered sequence of [`Unit`]s (e.g. days),
//! each of which owns an ordered sequence of [`Item`]s (e.g. meals).
//! Items carry their own pending/ready/failed sub-state because detail
//! generation streams in after the item's slot and title are known.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Detail sub-state of a single generated item.
///
/// The pending -> ready transition is one-way. A failed item keeps its
/// error so the stage can still complete with the failure recorded.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, TS)]
#[serde(tag = "state", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ItemState {
    /// Detail generation has not completed for this item yet.
    Pending,

    /// The item's full detail has arrived.
    Ready,

    /// Detail generation failed for this item; siblings are unaffected.
    Failed { error: String },
}

impl ItemState {
    /// Whether this item no longer has detail work outstanding.
    pub fn is_settled(&self) -> bool {
        !matches!(self, ItemState::Pending)
    }
}

/// Detailed content for an item, produced during detail generation.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, TS)]
pub struct ItemDetail {
    /// Full description (e.g. a complete recipe).
    pub description: String,

    /// Reference to a generated image, if any.
    pub image_ref: Option<String>,
}

/// The leaf generated object (e.g. one meal) within a unit.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, TS)]
pub struct Item {
    /// Position of this item within its unit.
    pub index: usize,

    /// Short name known from plan-level generation (e.g. "Lentil soup").
    pub title: String,

    /// Detail generation sub-state.
    pub state: ItemState,

    /// Present once `state` is `Ready`.
    pub detail: Option<ItemDetail>,
}

impl Item {
    /// Create a plan-level item stub with no detail yet.
    pub fn stub(index: usize, title: impl Into<String>) -> Self {
        Self {
            index,
            title: title.into(),
            state: ItemState::Pending,
            detail: None,
        }
    }
}

/// A mid-level generated grouping (e.g. one day) within a candidate.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, TS)]
pub struct Unit {
    /// Position of this unit within its candidate.
    pub index: usize,

    /// Human-readable label (e.g. "Day 3").
    pub label: String,

    /// Ordered items belonging to this unit.
    pub items: Vec<Item>,
}

/// One top-level generated result (e.g. one week's plan).
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq, TS)]
pub struct Candidate {
    /// Ordered units belonging to this candidate.
    pub units: Vec<Unit>,
}

impl Candidate {
    /// Total number of items across all units.
    pub fn item_count(&self) -> usize {
        self.units.iter().map(|unit| unit.items.len()).sum()
    }

    /// Number of items whose detail work has settled (ready or failed).
    pub fn settled_item_count(&self) -> usize {
        self.units
            .iter()
            .flat_map(|unit| unit.items.iter())
            .filter(|item| item.state.is_settled())
            .count()
    }

    /// Whether every item under every unit has settled.
    pub fn all_items_settled(&self) -> bool {
        self.settled_item_count() == self.item_count()
    }
}
