//! Generation service collaborator boundary.
//!
//! The pipeline depends on, but does not implement, an external service
//! that performs the actual AI-backed generation. Transport details
//! (HTTP streaming, chunked responses, polling) live behind the
//! [`GenerationService`] trait; the engine only sees ordered unit
//! streams and per-item detail calls.

pub mod mock;

pub use mock::MockGenerationService;

use async_trait::async_trait;
use pf_protocol::plan_models::{Item, Unit};
use pf_protocol::session_models::GenerationConfig;
use std::pin::Pin;
use thiserror::Error;
use tokio_stream::Stream;

/// An ordered, finite stream of plan-level units.
///
/// The stream may be interrupted by a transport failure; already-emitted
/// units are retained by the caller. Delivery is at-least-once per
/// stream: a fresh call after an interruption may resend earlier units,
/// and duplicate suppression by unit index is the state machine's job.
pub type UnitStream = Pin<Box<dyn Stream<Item = Result<Unit, ServiceError>> + Send>>;

/// Errors produced by the generation service.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ServiceError {
    /// Network or remote failure. Recoverable by retrying the call.
    #[error("Transport failure: {0}")]
    Transport(String),

    /// The caller-side timeout elapsed before the service responded.
    #[error("Generation call timed out")]
    Timeout,

    /// One item's detail generation failed. Isolated to that item;
    /// sibling requests are unaffected.
    #[error("Item generation failed: {0}")]
    Item(String),
}

/// Contract for the external AI-backed generation service.
#[async_trait]
pub trait GenerationService: Send + Sync {
    /// Generate a full plan for the given frozen config, streaming units
    /// in order as they become available.
    async fn generate_plan(&self, config: &GenerationConfig) -> Result<UnitStream, ServiceError>;

    /// Produce a replacement for exactly one unit of the plan.
    ///
    /// Used when the user regenerates a single unit during validation;
    /// sibling units are not involved.
    async fn regenerate_unit(
        &self,
        config: &GenerationConfig,
        unit_index: usize,
    ) -> Result<Unit, ServiceError>;

    /// Produce the fully detailed form of one item stub.
    ///
    /// Not streamed; issued concurrently with bounded fan-out by the
    /// state machine. Failures are item-scoped.
    async fn generate_details(&self, unit: &Unit, item: &Item) -> Result<Item, ServiceError>;
}
