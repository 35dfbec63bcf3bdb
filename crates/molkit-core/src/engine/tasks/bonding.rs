use crate::core::models::connectivity::ConnectivityCriteria;
use crate::core::models::ids::AtomIndex;
use crate::core::models::structure::Structure;
use crate::core::models::topology::BondOrder;
use crate::engine::context::ProcessingContext;
use crate::engine::progress::{Progress, ProgressReporter};
use itertools::Itertools;
use tracing::{debug, info, instrument};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Perceives covalent bonds from geometry and adds them to the structure.
///
/// Every atom pair inside a residue is tested. Between residues only the
/// backbone link of neighbours within one fiber is tested (protein C to N,
/// nucleic O3' to P, coarse-grained bead to bead). Bonds already present
/// are kept, so running the task twice adds nothing the second time.
///
/// Returns the number of bonds added.
#[instrument(skip_all, name = "bonding_task")]
pub fn run(structure: &mut Structure, context: &ProcessingContext) -> usize {
    let criteria = context.criteria();
    let before = structure.bond_count();

    context.reporter.report(Progress::TaskStart {
        total_steps: structure.residue_count() as u64,
    });
    let within = intra_residue_pairs(structure, &criteria, context.reporter);
    context.reporter.report(Progress::TaskFinish);

    for (a, b) in within.into_iter().flatten() {
        structure.add_bond(a, b, BondOrder::Single);
    }
    let intra = structure.bond_count() - before;
    debug!(bonds = intra, "Bonds within residues");

    let between = inter_residue_pairs(structure, &criteria);
    for (a, b) in between {
        structure.add_bond(a, b, BondOrder::Single);
    }

    let added = structure.bond_count() - before;
    info!(
        added,
        between = added - intra,
        total = structure.bond_count(),
        "Bond perception complete."
    );
    added
}

/// Connected atom pairs of each residue, in residue order.
fn intra_residue_pairs(
    structure: &Structure,
    criteria: &ConnectivityCriteria,
    reporter: &ProgressReporter,
) -> Vec<Vec<(AtomIndex, AtomIndex)>> {
    #[cfg(not(feature = "parallel"))]
    let iterator = structure.residues().iter();

    #[cfg(feature = "parallel")]
    let iterator = structure.residues().par_iter();

    iterator
        .map(|residue| {
            let pairs = residue
                .atoms()
                .iter()
                .copied()
                .tuple_combinations()
                .filter(|&(a, b)| structure.atoms_connected(a, b, criteria))
                .collect();
            reporter.report(Progress::TaskIncrement);
            pairs
        })
        .collect()
}

fn inter_residue_pairs(
    structure: &Structure,
    criteria: &ConnectivityCriteria,
) -> Vec<(AtomIndex, AtomIndex)> {
    let mut pairs = Vec::new();
    for fiber in structure.fiber_residues(None, criteria) {
        for link in fiber.windows(2) {
            let start = structure.residue(link[0]).backbone_start_atom();
            let end = structure.residue(link[1]).backbone_end_atom();
            if let (Some(a), Some(b)) = (start, end) {
                if structure.atoms_connected(a, b, criteria) {
                    pairs.push((a, b));
                }
            }
        }
    }
    pairs
}
