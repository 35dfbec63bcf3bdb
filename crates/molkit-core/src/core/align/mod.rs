//! Pairwise global sequence alignment.
//!
//! [`alignment::Aligner`] implements Gotoh's affine-gap dynamic programme over
//! a [`matrix::SubstitutionMatrix`]. Structure superposition uses it to pair
//! up Cα atoms of residues in aligned columns.

pub mod alignment;
pub mod matrix;

pub use alignment::{Aligner, Alignment, AlignmentError};
pub use matrix::SubstitutionMatrix;
