use super::atom::AtomView;
use super::ids::{AtomIndex, ChainIndex, ModelIndex, ResidueIndex};
use super::structure::Structure;
use crate::core::selection::Selection;
use tracing::debug;

impl Structure {
    /// Deep-copies the atoms passing `selection` into a new structure.
    ///
    /// Atoms keep their global indices. Residues, chains and models left
    /// without atoms are dropped, bonds are kept when both atoms survive, and
    /// every trajectory frame is cut down to the kept atoms.
    pub fn subset(&self, selection: &Selection) -> Structure {
        let mut keep = vec![false; self.atom_count()];
        self.each_atom(Some(selection), |atom| keep[atom.index().get()] = true);

        let mut subset = Structure::new(&self.name, self.storage_kind());
        subset.path = self.path.clone();
        subset.title = self.title.clone();
        subset.id = self.id.clone();
        subset.unit_cell = self.unit_cell.clone();
        subset.assemblies = self.assemblies.clone();
        subset.default_assembly = self.default_assembly.clone();

        let mut remap: Vec<Option<AtomIndex>> = vec![None; self.atom_count()];
        for model in self.models() {
            let mut new_model: Option<ModelIndex> = None;
            for &chain_index in model.chains() {
                let chain = self.chain(chain_index);
                let mut new_chain: Option<ChainIndex> = None;
                for &residue_index in chain.residues() {
                    let residue = self.residue(residue_index);
                    let mut new_residue: Option<ResidueIndex> = None;
                    for &atom in residue.atoms() {
                        if !keep[atom.get()] {
                            continue;
                        }
                        let m = *new_model.get_or_insert_with(|| subset.add_model());
                        let c = *new_chain.get_or_insert_with(|| subset.add_chain(m, chain.name()));
                        let r = *new_residue.get_or_insert_with(|| {
                            let r = subset.add_residue(c, residue.number(), residue.name());
                            subset.set_residue_secondary_structure_only(
                                r,
                                residue.secondary_structure(),
                            );
                            r
                        });
                        remap[atom.get()] = Some(subset.add_atom_copy(r, &self.atom(atom)));
                    }
                }
            }
        }

        for (_, bond) in self.bonds().iter() {
            if let (Some(a), Some(b)) = (remap[bond.atom1.get()], remap[bond.atom2.get()]) {
                subset.add_bond(a, b, bond.order);
            }
        }

        let kept: Vec<usize> = (0..keep.len()).filter(|&i| keep[i]).collect();
        for frame in self.frames() {
            let sliced = kept
                .iter()
                .flat_map(|&i| frame[3 * i..3 * i + 3].iter().copied())
                .collect();
            subset.frames_mut().push(sliced);
        }

        subset.refresh_geometry();
        debug!(
            source = %self.name,
            atoms = subset.atom_count(),
            residues = subset.residue_count(),
            "Derived subset structure"
        );
        subset
    }
}
