//! # Engine Module
//!
//! The stateful layer between the core data model and the workflows: the
//! processing configuration, the error and progress types shared by all
//! passes, and the passes themselves.
//!
//! ## Architecture
//!
//! - **Configuration** ([`config`]) - Bonding, secondary-structure, alignment, storage and batching settings
//! - **Error Handling** ([`error`]) - The umbrella [`error::EngineError`] used by workflows
//! - **Progress Monitoring** ([`progress`]) - Phase and task events delivered to an optional callback
//! - **Batching** ([`batch`]) - Bounded index ranges for chunked processing of large inputs
//! - **Tasks** ([`tasks`]) - Bond perception, secondary-structure assignment and chain naming
//!
//! Tasks share a [`context::ProcessingContext`] holding the configuration and
//! the progress reporter. With the `parallel` feature, the per-residue part
//! of bond perception runs on the rayon thread pool.

pub mod batch;
pub mod config;
pub mod context;
pub mod error;
pub mod progress;
pub mod tasks;
