//! # Models Module
//!
//! Data structures for a molecular structure held as a queryable hierarchy:
//! models contain chains, chains contain residues, residues contain atoms.
//!
//! ## Overview
//!
//! Every level lives in a dense arena inside [`structure::Structure`]. Children
//! store the index of their parent and parents keep the ordered indices of their
//! children, so the hierarchy can be walked in file order in both directions.
//! Atoms are kept in one of two representations chosen when the structure is
//! created: one [`atom::Atom`] per atom, or a packed [`array::AtomArray`].
//! Both are read through the [`atom::AtomView`] trait.
//!
//! ## Key Components
//!
//! - [`atom`] / [`array`] - Atom records, the `AtomView` trait and both storages
//! - [`residue`] / [`chain`] / [`model`] - Hierarchy levels and residue classification
//! - [`structure`] - The owning container with bonds, frames and metadata
//! - [`builder`] - Assembly of a structure from an ordered record stream
//! - [`view`] - Borrowed handles and selection-aware traversal
//! - [`fiber`] - Backbone-connected runs of residues
//! - [`subset`] - Deep copies restricted to a selection
//! - [`registry`] - Structures keyed by stable ids with a shared index allocator
//!
//! ## Usage
//!
//! ```ignore
//! use molkit::core::models::{builder::StructureBuilder, ids::GlobalIndexAllocator};
//! use molkit::core::selection::Selection;
//!
//! let mut allocator = GlobalIndexAllocator::new();
//! let mut builder = StructureBuilder::for_atom_count("1crn", records.len(), 1000, &mut allocator);
//! builder.add_records(&records);
//! let structure = builder.build();
//!
//! let backbone = Selection::new("backbone and :A");
//! structure.each_atom(Some(&backbone), |atom| println!("{}", atom.name()));
//! ```

pub mod array;
pub mod atom;
pub mod builder;
pub mod chain;
pub mod connectivity;
pub mod fiber;
pub mod ids;
pub mod metadata;
pub mod model;
pub mod registry;
pub mod residue;
pub mod secondary;
pub mod structure;
pub mod subset;
pub mod topology;
pub mod view;
