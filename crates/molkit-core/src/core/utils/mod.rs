//! Stateless helpers shared by the models and algorithms: element tables,
//! residue and atom name classification, geometry and rigid superposition.

pub mod elements;
pub mod geometry;
pub mod identifiers;
pub mod superposition;
