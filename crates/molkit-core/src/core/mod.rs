//! # Core Module
//!
//! The stateless foundation of molkit: the molecular data model, the
//! selection language, sequence alignment, geometry and the transfer
//! encoding.
//!
//! ## Architecture
//!
//! - **Molecular Representation** ([`models`]) - Structures, models, chains, residues, atoms and bonds
//! - **Selection Language** ([`selection`]) - Parsing and compiling selection strings into predicates
//! - **Sequence Alignment** ([`align`]) - Substitution matrices and global affine-gap alignment
//! - **Transfer Encoding** ([`io`]) - A flat, serializable representation of a whole structure
//! - **Utilities** ([`utils`]) - Element tables, name classification, geometry and superposition
//!
//! Nothing in this layer keeps state between calls; the stateful
//! post-processing passes live in [`crate::engine`].

pub mod align;
pub mod io;
pub mod models;
pub mod selection;
pub mod utils;
