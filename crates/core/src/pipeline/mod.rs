//! Pipeline orchestration.
//!
//! [`engine`] holds the single-session state machine; [`manager`] wraps
//! it for concurrent callers, adding the save guard and background-task
//! cancellation.

pub mod engine;
pub mod manager;

pub use engine::{GenerationPipeline, UNITS_PER_WEEK};
pub use manager::PipelineManager;
