use super::array::{AtomRef, AtomStorage, StorageKind};
use super::atom::{AtomRecord, AtomView};
use super::chain::Chain;
use super::connectivity::ConnectivityCriteria;
use super::ids::{AtomIndex, BondIndex, ChainIndex, ModelIndex, ResidueIndex};
use super::metadata::{Assembly, DEFAULT_ASSEMBLY_NAME, UnitCell};
use super::model::Model;
use super::residue::Residue;
use super::secondary::SecondaryStructure;
use super::topology::{BondOrder, BondSet};
use crate::core::utils::geometry::BoundingBox;
use nalgebra::Point3;
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FrameError {
    #[error("Frame holds {found} coordinates but the structure needs {expected}")]
    LengthMismatch { expected: usize, found: usize },
    #[error("Frame {index} does not exist (structure has {count} frames)")]
    OutOfRange { index: usize, count: usize },
}

/// A molecular structure: models, chains, residues and atoms held in dense
/// arenas, plus bonds, trajectory frames and crystallographic metadata.
///
/// Children store the index of their parent and parents store the ordered
/// indices of their children, so every level can be walked in file order
/// without reference cycles. Indices are zero-based and dense per level.
#[derive(Debug, Clone, PartialEq)]
pub struct Structure {
    pub name: String,
    pub path: String,
    pub title: String,
    pub id: String,
    atoms: AtomStorage,
    residues: Vec<Residue>,
    chains: Vec<Chain>,
    models: Vec<Model>,
    bonds: BondSet,
    frames: Vec<Vec<f32>>,
    pub unit_cell: Option<UnitCell>,
    pub assemblies: BTreeMap<String, Assembly>,
    pub default_assembly: String,
    center: Point3<f64>,
    bounding_box: Option<BoundingBox>,
}

impl Structure {
    /// Creates an empty structure whose atoms live in the given storage.
    ///
    /// The storage kind is fixed for the lifetime of the structure.
    pub fn new(name: &str, storage: StorageKind) -> Self {
        Self::with_capacity(name, storage, 0)
    }

    pub fn with_capacity(name: &str, storage: StorageKind, atom_capacity: usize) -> Self {
        Self {
            name: name.to_string(),
            path: String::new(),
            title: String::new(),
            id: String::new(),
            atoms: AtomStorage::new(storage, atom_capacity),
            residues: Vec::new(),
            chains: Vec::new(),
            models: Vec::new(),
            bonds: BondSet::new(),
            frames: Vec::new(),
            unit_cell: None,
            assemblies: BTreeMap::new(),
            default_assembly: DEFAULT_ASSEMBLY_NAME.to_string(),
            center: Point3::origin(),
            bounding_box: None,
        }
    }

    pub fn storage_kind(&self) -> StorageKind {
        self.atoms.kind()
    }

    pub fn atom_count(&self) -> usize {
        self.atoms.len()
    }

    pub fn residue_count(&self) -> usize {
        self.residues.len()
    }

    pub fn chain_count(&self) -> usize {
        self.chains.len()
    }

    pub fn model_count(&self) -> usize {
        self.models.len()
    }

    pub fn bond_count(&self) -> usize {
        self.bonds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }

    // --- Construction ---

    pub fn add_model(&mut self) -> ModelIndex {
        let index = ModelIndex(self.models.len());
        self.models.push(Model::new(index));
        index
    }

    /// Appends a chain to a model.
    ///
    /// # Panics
    ///
    /// Panics if `model` does not exist.
    pub fn add_chain(&mut self, model: ModelIndex, name: &str) -> ChainIndex {
        assert!(
            model.get() < self.models.len(),
            "Model {model} does not exist in structure '{}'",
            self.name
        );
        let index = ChainIndex(self.chains.len());
        self.chains.push(Chain::new(index, model, name));
        self.models[model.get()].chains.push(index);
        index
    }

    /// Appends a residue to a chain.
    ///
    /// # Panics
    ///
    /// Panics if `chain` does not exist.
    pub fn add_residue(&mut self, chain: ChainIndex, number: i32, name: &str) -> ResidueIndex {
        assert!(
            chain.get() < self.chains.len(),
            "Chain {chain} does not exist in structure '{}'",
            self.name
        );
        let model = self.chains[chain.get()].model;
        let index = ResidueIndex(self.residues.len());
        self.residues
            .push(Residue::new(index, chain, model, number, name));
        self.chains[chain.get()].residues.push(index);
        index
    }

    /// Appends an atom built from `record` to a residue.
    ///
    /// # Arguments
    ///
    /// * `residue` - The owning residue.
    /// * `record` - The raw atom; element and radii are filled in when missing.
    /// * `global_index` - The identity handed out by a
    ///   [`GlobalIndexAllocator`](super::ids::GlobalIndexAllocator).
    ///
    /// # Panics
    ///
    /// Panics if `residue` does not exist.
    pub fn add_atom(
        &mut self,
        residue: ResidueIndex,
        record: &AtomRecord,
        global_index: u64,
    ) -> AtomIndex {
        assert!(
            residue.get() < self.residues.len(),
            "Residue {residue} does not exist in structure '{}'",
            self.name
        );
        let model = self.residues[residue.get()].model;
        let index = self
            .atoms
            .push_record(record, global_index, residue, model);
        let name = self.atoms.get(index).name().to_string();
        self.residues[residue.get()].add_atom(&name, index);
        index
    }

    /// Appends a copy of an atom from another structure, keeping its identity.
    pub(crate) fn add_atom_copy(&mut self, residue: ResidueIndex, atom: &dyn AtomView) -> AtomIndex {
        let model = self.residues[residue.get()].model;
        let index = self.atoms.push_copy(atom, residue, model);
        self.residues[residue.get()].add_atom(atom.name(), index);
        index
    }

    pub(crate) fn set_residue_secondary_structure_only(
        &mut self,
        residue: ResidueIndex,
        ss: SecondaryStructure,
    ) {
        self.residues[residue.get()].secondary_structure = ss;
    }

    // --- Access ---

    pub fn atom(&self, index: AtomIndex) -> AtomRef<'_> {
        self.atoms.get(index)
    }

    pub fn atoms(&self) -> impl Iterator<Item = AtomRef<'_>> + '_ {
        self.atoms.iter()
    }

    pub fn atom_storage(&self) -> &AtomStorage {
        &self.atoms
    }

    pub fn residue(&self, index: ResidueIndex) -> &Residue {
        &self.residues[index.get()]
    }

    pub fn residues(&self) -> &[Residue] {
        &self.residues
    }

    pub fn chain(&self, index: ChainIndex) -> &Chain {
        &self.chains[index.get()]
    }

    pub fn chains(&self) -> &[Chain] {
        &self.chains
    }

    pub fn model(&self, index: ModelIndex) -> &Model {
        &self.models[index.get()]
    }

    pub fn models(&self) -> &[Model] {
        &self.models
    }

    /// The residue owning an atom.
    pub fn residue_of(&self, atom: AtomIndex) -> &Residue {
        self.residue(self.atoms.get(atom).residue())
    }

    /// Looks an atom up by its global index.
    pub fn find_atom_by_global_index(&self, global_index: u64) -> Option<AtomIndex> {
        self.atoms
            .iter()
            .find(|atom| atom.global_index() == global_index)
            .map(|atom| atom.index())
    }

    // --- Bonds ---

    pub fn bonds(&self) -> &BondSet {
        &self.bonds
    }

    /// Adds a bond between two atoms of this structure; re-adding an
    /// existing pair returns the existing bond.
    ///
    /// # Panics
    ///
    /// Panics if either atom does not exist or both are the same atom.
    pub fn add_bond(&mut self, a: AtomIndex, b: AtomIndex, order: BondOrder) -> BondIndex {
        let count = self.atoms.len();
        assert!(
            a.get() < count && b.get() < count,
            "Bond {a}-{b} references an atom outside structure '{}' ({count} atoms)",
            self.name
        );
        self.bonds.add_bond(a, b, order)
    }

    pub fn atom_bonds(&self, atom: AtomIndex) -> &[BondIndex] {
        self.bonds.atom_bonds(atom)
    }

    pub fn clear_bonds(&mut self) {
        self.bonds.clear();
    }

    /// Applies [`ConnectivityCriteria::connected`] to two atoms, using the
    /// residue of `a` to decide whether coarse-grained rules apply.
    pub fn atoms_connected(
        &self,
        a: AtomIndex,
        b: AtomIndex,
        criteria: &ConnectivityCriteria,
    ) -> bool {
        let atom_a = self.atoms.get(a);
        let atom_b = self.atoms.get(b);
        let coarse_grained = self.residue(atom_a.residue()).is_coarse_grained();
        criteria.connected(&atom_a, &atom_b, coarse_grained)
    }

    // --- Mutation ---

    /// Sets a residue's secondary structure and copies it onto its atoms.
    pub fn set_residue_secondary_structure(&mut self, residue: ResidueIndex, ss: SecondaryStructure) {
        let entry = &mut self.residues[residue.get()];
        entry.secondary_structure = ss;
        for &atom in &entry.atoms {
            self.atoms.set_secondary_structure(atom, ss);
        }
    }

    /// Renames a chain and every atom in it.
    pub fn set_chain_name(&mut self, chain: ChainIndex, name: &str) {
        let name = name.trim();
        self.chains[chain.get()].name = name.to_string();
        for &residue in &self.chains[chain.get()].residues {
            for &atom in &self.residues[residue.get()].atoms {
                self.atoms.set_chain_name(atom, name);
            }
        }
    }

    /// Renames a single atom's chain without touching its chain entity.
    pub fn set_atom_chain_name(&mut self, atom: AtomIndex, name: &str) {
        self.atoms.set_chain_name(atom, name);
    }

    pub fn set_atom_position(&mut self, atom: AtomIndex, position: &Point3<f64>) {
        self.atoms.set_position(atom, position);
    }

    /// Moves every atom through `transform`.
    pub fn transform_positions<F>(&mut self, mut transform: F)
    where
        F: FnMut(&Point3<f64>) -> Point3<f64>,
    {
        for i in 0..self.atoms.len() {
            let index = AtomIndex(i);
            let moved = transform(&self.atoms.get(index).position());
            self.atoms.set_position(index, &moved);
        }
    }

    // --- Derived values ---

    /// Positions as a flat `[x0, y0, z0, x1, ...]` array in atom order.
    pub fn flat_positions(&self) -> Vec<f32> {
        let mut flat = Vec::with_capacity(self.atoms.len() * 3);
        for atom in self.atoms.iter() {
            let p = atom.position();
            flat.extend_from_slice(&[p.x as f32, p.y as f32, p.z as f32]);
        }
        flat
    }

    /// Recomputes the cached bounding box and center from the atom positions.
    pub fn refresh_geometry(&mut self) {
        self.bounding_box = BoundingBox::from_points(self.atoms.iter().map(|a| a.position()));
        self.center = self
            .bounding_box
            .map(|bbox| bbox.center())
            .unwrap_or_else(Point3::origin);
    }

    /// Center of the bounding box as of the last [`refresh_geometry`](Self::refresh_geometry).
    pub fn center(&self) -> Point3<f64> {
        self.center
    }

    pub fn bounding_box(&self) -> Option<&BoundingBox> {
        self.bounding_box.as_ref()
    }

    // --- Trajectory frames ---

    /// Stores a frame of `atom_count * 3` coordinates and returns its index.
    pub fn add_frame(&mut self, coordinates: Vec<f32>) -> Result<usize, FrameError> {
        let expected = self.atoms.len() * 3;
        if coordinates.len() != expected {
            return Err(FrameError::LengthMismatch {
                expected,
                found: coordinates.len(),
            });
        }
        self.frames.push(coordinates);
        Ok(self.frames.len() - 1)
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    pub fn frames(&self) -> &[Vec<f32>] {
        &self.frames
    }

    /// Copies a stored frame into the atom positions.
    pub fn apply_frame(&mut self, index: usize) -> Result<(), FrameError> {
        let frame = self.frames.get(index).ok_or(FrameError::OutOfRange {
            index,
            count: self.frames.len(),
        })?;
        let positions: Vec<Point3<f64>> = frame
            .chunks_exact(3)
            .map(|xyz| Point3::new(xyz[0] as f64, xyz[1] as f64, xyz[2] as f64))
            .collect();
        for (i, position) in positions.iter().enumerate() {
            self.atoms.set_position(AtomIndex(i), position);
        }
        Ok(())
    }

    pub(crate) fn frames_mut(&mut self) -> &mut Vec<Vec<f32>> {
        &mut self.frames
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::ids::GlobalIndexAllocator;

    fn two_residue_structure(kind: StorageKind) -> Structure {
        let mut allocator = GlobalIndexAllocator::new();
        let mut structure = Structure::new("test", kind);
        let model = structure.add_model();
        let chain = structure.add_chain(model, "A");
        let r1 = structure.add_residue(chain, 1, "GLY");
        for (name, x) in [("N", 0.0), ("CA", 1.46), ("C", 2.98), ("O", 3.6)] {
            let record = AtomRecord::new("A", 1, "GLY", name, [x, 0.0, 0.0]);
            structure.add_atom(r1, &record, allocator.allocate());
        }
        let r2 = structure.add_residue(chain, 2, "HOH");
        let record = AtomRecord::new("A", 2, "HOH", "O", [10.0, 10.0, 10.0]);
        structure.add_atom(r2, &record, allocator.allocate());
        structure
    }

    #[test]
    fn construction_assigns_dense_indices_and_parent_links() {
        for kind in [StorageKind::Objects, StorageKind::Packed] {
            let structure = two_residue_structure(kind);
            assert_eq!(structure.storage_kind(), kind);
            assert_eq!(structure.atom_count(), 5);
            assert_eq!(structure.residue_count(), 2);
            assert_eq!(structure.chain_count(), 1);
            assert_eq!(structure.model_count(), 1);

            let water = structure.residue(ResidueIndex(1));
            assert_eq!(water.atoms(), &[AtomIndex(4)]);
            assert_eq!(water.chain(), ChainIndex(0));
            assert_eq!(structure.residue_of(AtomIndex(4)).name(), "HOH");
            assert_eq!(structure.chain(ChainIndex(0)).residues().len(), 2);
            assert_eq!(structure.atom(AtomIndex(2)).global_index(), 2);
            assert_eq!(structure.find_atom_by_global_index(3), Some(AtomIndex(3)));
        }
    }

    #[test]
    #[should_panic(expected = "does not exist")]
    fn adding_a_residue_to_a_missing_chain_panics() {
        let mut structure = Structure::new("bad", StorageKind::Objects);
        structure.add_residue(ChainIndex(3), 1, "ALA");
    }

    #[test]
    #[should_panic(expected = "does not exist")]
    fn adding_an_atom_to_a_missing_residue_panics() {
        let mut structure = Structure::new("bad", StorageKind::Objects);
        let record = AtomRecord::new("A", 1, "ALA", "CA", [0.0; 3]);
        structure.add_atom(ResidueIndex(0), &record, 0);
    }

    #[test]
    fn secondary_structure_cascades_to_atoms() {
        for kind in [StorageKind::Objects, StorageKind::Packed] {
            let mut structure = two_residue_structure(kind);
            structure.set_residue_secondary_structure(ResidueIndex(0), SecondaryStructure::Sheet);
            assert_eq!(
                structure.residue(ResidueIndex(0)).secondary_structure(),
                SecondaryStructure::Sheet
            );
            for i in 0..4 {
                assert_eq!(
                    structure.atom(AtomIndex(i)).secondary_structure(),
                    SecondaryStructure::Sheet
                );
            }
            assert_eq!(
                structure.atom(AtomIndex(4)).secondary_structure(),
                SecondaryStructure::Unassigned
            );
        }
    }

    #[test]
    fn renaming_a_chain_renames_its_atoms() {
        let mut structure = two_residue_structure(StorageKind::Packed);
        structure.set_chain_name(ChainIndex(0), "Q");
        assert_eq!(structure.chain(ChainIndex(0)).name(), "Q");
        assert!(structure.atoms().all(|atom| atom.chain_name() == "Q"));
    }

    #[test]
    fn bonds_are_shared_by_both_endpoints() {
        let mut structure = two_residue_structure(StorageKind::Objects);
        let bond = structure.add_bond(AtomIndex(1), AtomIndex(0), BondOrder::Single);
        assert_eq!(structure.atom_bonds(AtomIndex(0)), &[bond]);
        assert_eq!(structure.atom_bonds(AtomIndex(1)), &[bond]);
        assert_eq!(structure.add_bond(AtomIndex(0), AtomIndex(1), BondOrder::Double), bond);
        assert_eq!(structure.bond_count(), 1);
    }

    #[test]
    fn geometry_tracks_the_bounding_box_center() {
        let mut structure = two_residue_structure(StorageKind::Objects);
        assert_eq!(structure.center(), Point3::origin());
        structure.refresh_geometry();
        let bbox = structure.bounding_box().unwrap();
        assert_eq!(bbox.min, Point3::new(0.0, 0.0, 0.0));
        assert_eq!(bbox.max, Point3::new(10.0, 10.0, 10.0));
        assert_eq!(structure.center(), Point3::new(5.0, 5.0, 5.0));
    }

    #[test]
    fn frames_validate_length_and_apply_positions() {
        let mut structure = two_residue_structure(StorageKind::Packed);
        assert_eq!(
            structure.add_frame(vec![0.0; 3]),
            Err(FrameError::LengthMismatch {
                expected: 15,
                found: 3
            })
        );
        let shifted: Vec<f32> = structure.flat_positions().iter().map(|c| c + 1.0).collect();
        let index = structure.add_frame(shifted).unwrap();
        structure.apply_frame(index).unwrap();
        assert_eq!(structure.atom(AtomIndex(0)).position(), Point3::new(1.0, 1.0, 1.0));
        assert_eq!(
            structure.apply_frame(5),
            Err(FrameError::OutOfRange { index: 5, count: 1 })
        );
    }

    #[test]
    fn connectivity_uses_covalent_radii() {
        let structure = two_residue_structure(StorageKind::Objects);
        let criteria = ConnectivityCriteria::default();
        assert!(structure.atoms_connected(AtomIndex(0), AtomIndex(1), &criteria));
        assert!(!structure.atoms_connected(AtomIndex(0), AtomIndex(2), &criteria));
    }
}
