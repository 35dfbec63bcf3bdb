//! # molkit
//!
//! A library for holding, querying and post-processing molecular structures.
//!
//! The crate is split into three layers:
//!
//! - **[`core`]** holds the data model: atom storage, the
//!   model/chain/residue/atom hierarchy, bonds, the selection language,
//!   sequence alignment, superposition and the transfer encoding.
//!
//! - **[`engine`]** holds configuration, progress reporting and the
//!   processing tasks run on a structure after it is read: bond perception,
//!   secondary-structure assignment and automatic chain naming.
//!
//! - **[`workflows`]** ties the two together into complete procedures, such
//!   as building a structure from records or superposing two structures.

pub mod core;
pub mod engine;
pub mod workflows;
