//! Borrowed handles pairing an entity with its structure, and the
//! selection-aware traversal built on them.
//!
//! Traversal pushes a selection down to the coarsest level that can decide
//! it: models are filtered with the model-only test, chains with the
//! chain-only test, residues with the residue-only test, and atoms with the
//! atom-only test, or the full atom test inside chains without a name.
//! Entities for which a test is not applicable are visited.

use super::array::AtomRef;
use super::atom::AtomView;
use super::chain::Chain;
use super::ids::{AtomIndex, BondIndex, ChainIndex, ModelIndex, ResidueIndex};
use super::model::Model;
use super::residue::Residue;
use super::structure::Structure;
use super::topology::Bond;
use crate::core::selection::Selection;
use crate::core::utils::geometry::BoundingBox;
use std::ops::Deref;

/// An atom together with the structure it belongs to.
#[derive(Debug, Clone, Copy)]
pub struct AtomHandle<'a> {
    structure: &'a Structure,
    atom: AtomRef<'a>,
}

impl<'a> AtomHandle<'a> {
    pub fn new(structure: &'a Structure, index: AtomIndex) -> Self {
        Self {
            structure,
            atom: structure.atom(index),
        }
    }

    pub fn structure(&self) -> &'a Structure {
        self.structure
    }

    pub fn atom(&self) -> AtomRef<'a> {
        self.atom
    }

    pub fn residue_handle(&self) -> ResidueHandle<'a> {
        ResidueHandle::new(self.structure, self.atom.residue())
    }

    pub fn bonds(&self) -> &'a [BondIndex] {
        self.structure.atom_bonds(self.atom.index())
    }
}

impl<'a> Deref for AtomHandle<'a> {
    type Target = AtomRef<'a>;

    fn deref(&self) -> &Self::Target {
        &self.atom
    }
}

/// A residue together with the structure it belongs to.
#[derive(Debug, Clone, Copy)]
pub struct ResidueHandle<'a> {
    structure: &'a Structure,
    residue: &'a Residue,
}

impl<'a> ResidueHandle<'a> {
    pub fn new(structure: &'a Structure, index: ResidueIndex) -> Self {
        Self {
            structure,
            residue: structure.residue(index),
        }
    }

    pub fn structure(&self) -> &'a Structure {
        self.structure
    }

    pub fn residue(&self) -> &'a Residue {
        self.residue
    }

    pub fn chain_handle(&self) -> ChainHandle<'a> {
        ChainHandle::new(self.structure, self.residue.chain())
    }

    pub fn chain_name(&self) -> &'a str {
        self.structure.chain(self.residue.chain()).name()
    }

    pub fn model_index(&self) -> ModelIndex {
        self.residue.model()
    }

    /// A residue is hetero when its first atom is.
    pub fn is_hetero(&self) -> bool {
        self.residue
            .atoms()
            .first()
            .is_some_and(|&atom| self.structure.atom(atom).is_hetero())
    }

    pub fn atoms(&self) -> impl Iterator<Item = AtomHandle<'a>> + use<'a> {
        let structure = self.structure;
        self.residue
            .atoms()
            .iter()
            .map(move |&atom| AtomHandle::new(structure, atom))
    }

    /// Visits the residue's atoms, filtered by the atom-only test, or by the
    /// full atom test when the chain has no name (auto-assigned chain names
    /// live on atoms only).
    pub fn each_atom<F>(&self, selection: Option<&Selection>, mut callback: F)
    where
        F: FnMut(AtomHandle<'a>),
    {
        let unnamed_chain = self.chain_name().is_empty();
        let test = selection.and_then(|s| {
            if unnamed_chain {
                s.atom_test()
            } else {
                s.atom_only_test()
            }
        });

        for atom in self.atoms() {
            if test.is_none_or(|t| t.passes(&atom)) {
                callback(atom);
            }
        }
    }
}

impl Deref for ResidueHandle<'_> {
    type Target = Residue;

    fn deref(&self) -> &Self::Target {
        self.residue
    }
}

/// A chain together with the structure it belongs to.
#[derive(Debug, Clone, Copy)]
pub struct ChainHandle<'a> {
    structure: &'a Structure,
    chain: &'a Chain,
}

impl<'a> ChainHandle<'a> {
    pub fn new(structure: &'a Structure, index: ChainIndex) -> Self {
        Self {
            structure,
            chain: structure.chain(index),
        }
    }

    pub fn structure(&self) -> &'a Structure {
        self.structure
    }

    pub fn chain(&self) -> &'a Chain {
        self.chain
    }

    pub fn model_handle(&self) -> ModelHandle<'a> {
        ModelHandle::new(self.structure, self.chain.model())
    }

    pub fn residues(&self) -> impl Iterator<Item = ResidueHandle<'a>> + use<'a> {
        let structure = self.structure;
        self.chain
            .residues()
            .iter()
            .map(move |&residue| ResidueHandle::new(structure, residue))
    }

    pub fn each_residue<F>(&self, selection: Option<&Selection>, mut callback: F)
    where
        F: FnMut(ResidueHandle<'a>),
    {
        let test = selection.and_then(Selection::residue_only_test);
        for residue in self.residues() {
            if test.is_none_or(|t| t.passes(&residue)) {
                callback(residue);
            }
        }
    }

    pub fn each_atom<F>(&self, selection: Option<&Selection>, mut callback: F)
    where
        F: FnMut(AtomHandle<'a>),
    {
        let Some(selection) = selection else {
            self.residues()
                .for_each(|residue| residue.atoms().for_each(&mut callback));
            return;
        };

        if let Some(test) = selection.residue_only_test() {
            for residue in self.residues() {
                if test.passes(&residue) {
                    residue.each_atom(Some(selection), &mut callback);
                }
            }
        } else if selection.atom_only_test().is_some()
            || (self.chain.name().is_empty() && selection.atom_test().is_some())
        {
            for residue in self.residues() {
                residue.each_atom(Some(selection), &mut callback);
            }
        } else {
            self.residues()
                .for_each(|residue| residue.atoms().for_each(&mut callback));
        }
    }
}

impl Deref for ChainHandle<'_> {
    type Target = Chain;

    fn deref(&self) -> &Self::Target {
        self.chain
    }
}

/// A model together with the structure it belongs to.
#[derive(Debug, Clone, Copy)]
pub struct ModelHandle<'a> {
    structure: &'a Structure,
    model: &'a Model,
}

impl<'a> ModelHandle<'a> {
    pub fn new(structure: &'a Structure, index: ModelIndex) -> Self {
        Self {
            structure,
            model: structure.model(index),
        }
    }

    pub fn structure(&self) -> &'a Structure {
        self.structure
    }

    pub fn model(&self) -> &'a Model {
        self.model
    }

    pub fn chains(&self) -> impl Iterator<Item = ChainHandle<'a>> + use<'a> {
        let structure = self.structure;
        self.model
            .chains()
            .iter()
            .map(move |&chain| ChainHandle::new(structure, chain))
    }

    /// Chains of this model that pass the chain-only test.
    pub(crate) fn selected_chains<'s>(
        &self,
        selection: Option<&'s Selection>,
    ) -> impl Iterator<Item = ChainHandle<'a>> + use<'a, 's> {
        let test = selection.and_then(Selection::chain_only_test);
        self.chains()
            .filter(move |chain| test.is_none_or(|t| t.passes(chain)))
    }

    pub fn each_chain<F>(&self, selection: Option<&Selection>, callback: F)
    where
        F: FnMut(ChainHandle<'a>),
    {
        self.selected_chains(selection).for_each(callback);
    }

    pub fn each_residue<F>(&self, selection: Option<&Selection>, mut callback: F)
    where
        F: FnMut(ResidueHandle<'a>),
    {
        for chain in self.selected_chains(selection) {
            chain.each_residue(selection, &mut callback);
        }
    }

    pub fn each_atom<F>(&self, selection: Option<&Selection>, mut callback: F)
    where
        F: FnMut(AtomHandle<'a>),
    {
        for chain in self.selected_chains(selection) {
            chain.each_atom(selection, &mut callback);
        }
    }
}

impl Deref for ModelHandle<'_> {
    type Target = Model;

    fn deref(&self) -> &Self::Target {
        self.model
    }
}

impl Structure {
    pub fn atom_handle(&self, index: AtomIndex) -> AtomHandle<'_> {
        AtomHandle::new(self, index)
    }

    pub fn residue_handle(&self, index: ResidueIndex) -> ResidueHandle<'_> {
        ResidueHandle::new(self, index)
    }

    pub fn chain_handle(&self, index: ChainIndex) -> ChainHandle<'_> {
        ChainHandle::new(self, index)
    }

    pub fn model_handle(&self, index: ModelIndex) -> ModelHandle<'_> {
        ModelHandle::new(self, index)
    }

    pub fn model_handles(&self) -> impl Iterator<Item = ModelHandle<'_>> + '_ {
        (0..self.model_count()).map(move |i| ModelHandle::new(self, ModelIndex(i)))
    }

    /// Models that pass the model-only test.
    pub(crate) fn selected_models<'a, 's>(
        &'a self,
        selection: Option<&'s Selection>,
    ) -> impl Iterator<Item = ModelHandle<'a>> + use<'a, 's> {
        let test = selection.and_then(Selection::model_only_test);
        self.model_handles()
            .filter(move |model| test.is_none_or(|t| t.passes(model)))
    }

    pub fn each_model<'a, F>(&'a self, selection: Option<&Selection>, callback: F)
    where
        F: FnMut(ModelHandle<'a>),
    {
        self.selected_models(selection).for_each(callback);
    }

    pub fn each_chain<'a, F>(&'a self, selection: Option<&Selection>, mut callback: F)
    where
        F: FnMut(ChainHandle<'a>),
    {
        for model in self.selected_models(selection) {
            model.each_chain(selection, &mut callback);
        }
    }

    pub fn each_residue<'a, F>(&'a self, selection: Option<&Selection>, mut callback: F)
    where
        F: FnMut(ResidueHandle<'a>),
    {
        for model in self.selected_models(selection) {
            model.each_residue(selection, &mut callback);
        }
    }

    /// Visits atoms in file order, pushing `selection` down the hierarchy.
    pub fn each_atom<'a, F>(&'a self, selection: Option<&Selection>, mut callback: F)
    where
        F: FnMut(AtomHandle<'a>),
    {
        match selection {
            None => (0..self.atom_count())
                .for_each(|i| callback(AtomHandle::new(self, AtomIndex(i)))),
            Some(_) => {
                for model in self.selected_models(selection) {
                    model.each_atom(selection, &mut callback);
                }
            }
        }
    }

    /// Visits bonds whose two atoms both pass the full atom test.
    pub fn each_bond<F>(&self, selection: Option<&Selection>, mut callback: F)
    where
        F: FnMut(BondIndex, &Bond),
    {
        let test = selection.and_then(Selection::atom_test);
        for (index, bond) in self.bonds().iter() {
            let keep = test.is_none_or(|t| {
                t.passes(&AtomHandle::new(self, bond.atom1))
                    && t.passes(&AtomHandle::new(self, bond.atom2))
            });
            if keep {
                callback(index, bond);
            }
        }
    }

    /// Local indices of the atoms visited by [`each_atom`](Self::each_atom).
    pub fn atom_indices(&self, selection: Option<&Selection>) -> Vec<AtomIndex> {
        let mut indices = Vec::new();
        self.each_atom(selection, |atom| indices.push(atom.index()));
        indices
    }

    pub fn residue_indices(&self, selection: Option<&Selection>) -> Vec<ResidueIndex> {
        let mut indices = Vec::new();
        self.each_residue(selection, |residue| indices.push(residue.index()));
        indices
    }

    /// One-letter sequence of the residues that carry a `CA` atom.
    pub fn sequence(&self, selection: Option<&Selection>) -> String {
        let mut sequence = String::new();
        self.each_residue(selection, |residue| {
            if residue.atom_by_name("CA").is_some() {
                sequence.push(residue.one_letter_code());
            }
        });
        sequence
    }

    /// Bounding box of the atoms selected by `selection`.
    pub fn compute_bounding_box(
        &self,
        selection: Option<&Selection>,
    ) -> Option<BoundingBox> {
        let mut points = Vec::new();
        self.each_atom(selection, |atom| points.push(atom.position()));
        BoundingBox::from_points(points)
    }
}
