use super::connectivity::ConnectivityCriteria;
use super::ids::{AtomIndex, ChainIndex, ResidueIndex};
use super::residue::{BackboneSpan, BackboneType, Residue, ResidueType};
use super::structure::Structure;
use super::view::{AtomHandle, ChainHandle, ResidueHandle};
use super::atom::AtomView;
use crate::core::selection::Selection;
use nalgebra::Point3;
use tracing::trace;

/// A maximal run of backbone-connected residues of one backbone type inside
/// a single chain.
#[derive(Debug, Clone, Copy)]
pub struct Fiber<'a> {
    structure: &'a Structure,
    chain: ChainIndex,
    residues: &'a [ResidueIndex],
}

impl<'a> Fiber<'a> {
    pub fn structure(&self) -> &'a Structure {
        self.structure
    }

    pub fn chain(&self) -> ChainIndex {
        self.chain
    }

    pub fn residue_indices(&self) -> &'a [ResidueIndex] {
        self.residues
    }

    pub fn residue_count(&self) -> usize {
        self.residues.len()
    }

    pub fn residues(&self) -> impl Iterator<Item = ResidueHandle<'a>> + use<'a> {
        let structure = self.structure;
        self.residues
            .iter()
            .map(move |&residue| ResidueHandle::new(structure, residue))
    }

    fn first(&self) -> &'a Residue {
        self.structure.residue(self.residues[0])
    }

    // The molecule type of a fiber is the type of its first residue.

    pub fn is_protein(&self) -> bool {
        self.first().is_protein()
    }

    pub fn is_coarse_grained(&self) -> bool {
        self.first().is_coarse_grained()
    }

    pub fn is_nucleic(&self) -> bool {
        self.first().is_nucleic()
    }

    pub fn residue_type(&self) -> ResidueType {
        self.first().residue_type()
    }

    pub fn backbone_type(&self, span: BackboneSpan) -> BackboneType {
        self.first().backbone_type(span)
    }

    pub fn each_atom<F>(&self, mut callback: F)
    where
        F: FnMut(AtomHandle<'a>),
    {
        for residue in self.residues() {
            residue.atoms().for_each(&mut callback);
        }
    }

    pub fn atom_indices(&self) -> Vec<AtomIndex> {
        self.residues
            .iter()
            .flat_map(|&r| self.structure.residue(r).atoms().iter().copied())
            .collect()
    }

    /// Trace-atom position of each residue; `None` for residues without one.
    pub fn trace_positions(&self) -> Vec<Option<Point3<f64>>> {
        self.residues
            .iter()
            .map(|&r| {
                self.structure
                    .residue(r)
                    .trace_atom()
                    .map(|atom| self.structure.atom(atom).position())
            })
            .collect()
    }
}

impl<'a> ChainHandle<'a> {
    /// Splits the chain into fibers.
    ///
    /// Adjacent residues stay in one fiber while they share a known backbone
    /// type and the start atom of the first is connected to the end atom of
    /// the second. With a selection, both link atoms must also pass its full
    /// atom test.
    pub fn each_fiber<F>(
        &self,
        selection: Option<&Selection>,
        criteria: &ConnectivityCriteria,
        mut callback: F,
    ) where
        F: FnMut(Fiber<'a>),
    {
        let structure = self.structure();
        let residues = self.chain().residues();
        if residues.is_empty() {
            return;
        }

        let test = selection.and_then(Selection::atom_test);
        let chain = self.index();
        let mut emit = |from: usize, to: usize| {
            callback(Fiber {
                structure,
                chain,
                residues: &residues[from..to],
            })
        };

        let mut i = 0;
        let mut j = 1;
        for pair in residues.windows(2) {
            let r1 = structure.residue(pair[0]);
            let r2 = structure.residue(pair[1]);

            let span1 = if i == j - 1 {
                BackboneSpan::Outgoing
            } else {
                BackboneSpan::Complete
            };
            let type1 = r1.backbone_type(span1);
            let type2 = r2.backbone_type(BackboneSpan::Complete);

            if type1 == BackboneType::Unknown || type1 != type2 {
                if type1 != BackboneType::Unknown {
                    emit(i, j);
                }
                i = j;
                j += 1;
                continue;
            }

            let linked = match (r1.backbone_start_atom(), r2.backbone_end_atom()) {
                (Some(a1), Some(a2)) => {
                    structure.atoms_connected(a1, a2, criteria)
                        && test.is_none_or(|t| {
                            t.passes(&AtomHandle::new(structure, a1))
                                && t.passes(&AtomHandle::new(structure, a2))
                        })
                }
                _ => false,
            };
            if !linked {
                trace!(
                    chain = %chain,
                    residue = r2.number(),
                    "Backbone break"
                );
                emit(i, j);
                i = j;
            }
            j += 1;
        }

        if structure
            .residue(residues[i])
            .has_backbone(BackboneSpan::Outgoing)
        {
            emit(i, j);
        }
    }
}

impl Structure {
    /// Visits every fiber of every model and chain that passes the
    /// model-only and chain-only tests, using the default connectivity rules.
    pub fn each_fiber<'a, F>(&'a self, selection: Option<&Selection>, callback: F)
    where
        F: FnMut(Fiber<'a>),
    {
        self.each_fiber_with(selection, &ConnectivityCriteria::default(), callback);
    }

    pub fn each_fiber_with<'a, F>(
        &'a self,
        selection: Option<&Selection>,
        criteria: &ConnectivityCriteria,
        mut callback: F,
    ) where
        F: FnMut(Fiber<'a>),
    {
        for model in self.selected_models(selection) {
            for chain in model.selected_chains(selection) {
                chain.each_fiber(selection, criteria, &mut callback);
            }
        }
    }

    /// Residue index runs of all fibers, for callers that need to mutate
    /// the structure afterwards.
    pub fn fiber_residues(
        &self,
        selection: Option<&Selection>,
        criteria: &ConnectivityCriteria,
    ) -> Vec<Vec<ResidueIndex>> {
        let mut fibers = Vec::new();
        self.each_fiber_with(selection, criteria, |fiber| {
            fibers.push(fiber.residue_indices().to_vec())
        });
        fibers
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::array::StorageKind;
    use crate::core::models::atom::AtomRecord;
    use crate::core::models::ids::GlobalIndexAllocator;

    struct Builder {
        structure: Structure,
        allocator: GlobalIndexAllocator,
        chain: ChainIndex,
    }

    impl Builder {
        fn new() -> Self {
            let mut structure = Structure::new("fibers", StorageKind::Objects);
            let model = structure.add_model();
            let chain = structure.add_chain(model, "A");
            Self {
                structure,
                allocator: GlobalIndexAllocator::new(),
                chain,
            }
        }

        fn residue(&mut self, number: i32, name: &str, atoms: &[(&str, [f32; 3])]) {
            let r = self.structure.add_residue(self.chain, number, name);
            for (atom, position) in atoms {
                let record = AtomRecord::new("A", number, name, atom, *position);
                self.structure.add_atom(r, &record, self.allocator.allocate());
            }
        }

        /// A protein residue whose N sits at `x` and whose C sits at `x + 2.4`.
        fn amino_acid(&mut self, number: i32, x: f32) {
            self.residue(
                number,
                "ALA",
                &[
                    ("N", [x, 0.0, 0.0]),
                    ("CA", [x + 1.2, 0.8, 0.0]),
                    ("C", [x + 2.4, 0.0, 0.0]),
                    ("O", [x + 2.4, -1.2, 0.0]),
                ],
            );
        }
    }

    fn fiber_lengths(structure: &Structure, selection: Option<&Selection>) -> Vec<usize> {
        let mut lengths = Vec::new();
        structure.each_fiber(selection, |f| lengths.push(f.residue_count()));
        lengths
    }

    #[test]
    fn connected_protein_residues_form_one_fiber() {
        let mut b = Builder::new();
        for i in 0..4 {
            b.amino_acid(i + 1, i as f32 * 3.73);
        }
        let structure = b.structure;
        assert_eq!(fiber_lengths(&structure, None), vec![4]);

        let mut protein = false;
        structure.each_fiber(None, |f| protein = f.is_protein());
        assert!(protein);
    }

    #[test]
    fn chain_break_splits_fibers() {
        let mut b = Builder::new();
        b.amino_acid(1, 0.0);
        b.amino_acid(2, 3.73);
        b.amino_acid(3, 20.0);
        b.amino_acid(4, 23.73);
        assert_eq!(fiber_lengths(&b.structure, None), vec![2, 2]);
    }

    #[test]
    fn non_polymer_residues_end_the_fiber() {
        let mut b = Builder::new();
        b.amino_acid(1, 0.0);
        b.amino_acid(2, 3.73);
        b.residue(3, "HOH", &[("O", [6.0, 0.0, 0.0])]);
        b.amino_acid(4, 50.0);
        assert_eq!(fiber_lengths(&b.structure, None), vec![2, 1]);
    }

    #[test]
    fn selection_must_include_both_link_atoms() {
        let mut b = Builder::new();
        for i in 0..3 {
            b.amino_acid(i + 1, i as f32 * 3.73);
        }
        let structure = b.structure;
        let selection = Selection::new("not 2");
        assert_eq!(fiber_lengths(&structure, Some(&selection)), vec![1, 1, 1]);
    }

    #[test]
    fn coarse_grained_beads_link_by_flat_cutoff() {
        let mut b = Builder::new();
        for i in 0..5 {
            b.residue(i + 1, "LEU", &[("BB", [i as f32 * 3.8, 0.0, 0.0]), ("SC1", [i as f32 * 3.8, 2.0, 0.0])]);
        }
        let structure = b.structure;
        let mut seen = Vec::new();
        structure.each_fiber(None, |f| seen.push((f.residue_count(), f.is_coarse_grained())));
        assert_eq!(seen, vec![(5, true)]);
    }

    #[test]
    fn fiber_exposes_atoms_and_trace() {
        let mut b = Builder::new();
        b.amino_acid(1, 0.0);
        b.amino_acid(2, 3.73);
        let structure = b.structure;
        let runs = structure.fiber_residues(None, &ConnectivityCriteria::default());
        assert_eq!(runs, vec![vec![ResidueIndex(0), ResidueIndex(1)]]);

        structure.each_fiber(None, |f| {
            assert_eq!(f.atom_indices().len(), 8);
            let trace = f.trace_positions();
            assert_eq!(trace.len(), 2);
            assert!(trace.iter().all(Option::is_some));
            let mut count = 0;
            f.each_atom(|_| count += 1);
            assert_eq!(count, 8);
        });
    }
}
