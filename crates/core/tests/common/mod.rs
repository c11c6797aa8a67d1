//! Common test utilities and helpers for the pipeline integration
//! tests.
//!
//! This module provides shared functionality across the test binaries:
//! - Fixtures (engine builders, config patches, store wrappers)
//! - Custom assertions over collected event sequences

pub mod assertions;
pub mod fixtures;

#[allow(unused_imports)]
pub use assertions::*;
#[allow(unused_imports)]
pub use fixtures::*;
