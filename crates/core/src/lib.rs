//! # pf-core
//!
//! Core generation pipeline engine for plan-forge.
//!
//! This crate provides:
//! - The multi-stage pipeline state machine and its event emission
//! - Derived progress computation for observers
//! - The session recovery gate for interrupted sessions
//! - Collaborator contracts for generation and persistence, with
//!   in-memory and mock implementations
//!
//! ## Modules
//!
//! - [`pipeline`]: The state machine engine and its concurrency wrapper
//! - [`session`]: Session mutation helpers and event emission
//! - [`progress`]: Progress snapshot computation
//! - [`recovery`]: Recovery gate for persisted sessions
//! - [`service`]: External generation service contract
//! - [`persistence`]: Session and result store contracts
//! - [`settings`]: Engine tunables
//! - [`error`]: The crate-wide error type

pub mod error;
pub mod persistence;
pub mod pipeline;
pub mod progress;
pub mod recovery;
pub mod service;
pub mod session;
pub mod settings;
