//! Post-processing passes over an assembled structure.
//!
//! Each task takes the structure mutably together with a
//! [`ProcessingContext`](super::context::ProcessingContext) and reports how
//! much it changed. Tasks never fail on data: missing atoms or degenerate
//! geometry simply leave the affected residues unbonded or unclassified.

pub mod bonding;
pub mod chain_naming;
pub mod secondary;

#[cfg(test)]
pub(crate) mod fixtures;
