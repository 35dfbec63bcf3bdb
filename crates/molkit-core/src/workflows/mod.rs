//! High-level entry points that combine the core model with the engine tasks.
//!
//! - [`build`] turns raw atom records into a bonded structure with secondary
//!   structure and chain names.
//! - [`superpose`] moves one structure onto another, optionally through a
//!   sequence alignment.

pub mod build;
pub mod superpose;
