//! # pf-protocol
//!
//! Shared data models and domain events for plan-forge.
//!
//! This crate defines all structures shared between the pipeline engine
//! and its observers:
//! - Session state, stages, and generation configuration
//! - The generated candidate/unit/item tree
//! - Derived progress snapshots
//! - Domain events emitted on the engine's observable channel
//!
//! ## Modules
//!
//! - [`session_models`]: Session, stage enumeration, configuration
//! - [`plan_models`]: Candidate/unit/item tree and item sub-states
//! - [`progress_models`]: Derived progress snapshot
//! - [`events`]: Domain events for the engine's observers
//!
//! ## Design Principles
//!
//! - Minimal dependencies: only serde, ts-rs, uuid, and chrono
//! - TypeScript generation: all types derive `TS` for client compatibility
//! - Independent compilation: no dependencies on other plan-forge crates

pub mod events;
pub mod plan_models;
pub mod progress_models;
pub mod session_models;

// Re-export all public types for convenience
pub use events::*;
pub use plan_models::*;
pub use progress_models::*;
pub use session_models::*;
