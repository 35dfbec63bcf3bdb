use super::array::StorageKind;
use super::atom::AtomRecord;
use super::ids::{AtomIndex, BondIndex, ChainIndex, GlobalIndexAllocator, ModelIndex, ResidueIndex};
use super::structure::Structure;
use super::topology::BondOrder;
use std::collections::HashMap;
use tracing::trace;

/// Assembles a [`Structure`] from an ordered stream of [`AtomRecord`]s.
///
/// Records for one model, chain and residue are expected to be contiguous:
///
/// - a change of model index starts a new model;
/// - a change of chain name switches chain, re-opening a chain of the same
///   name seen earlier in the current model;
/// - a change of residue number or name, or a chain switch, starts a new
///   residue, so a residue repeated later in the stream becomes a second
///   residue.
pub struct StructureBuilder<'a> {
    structure: Structure,
    allocator: &'a mut GlobalIndexAllocator,

    // --- Builder-specific state for grouping the record stream ---
    serial_map: HashMap<i32, AtomIndex>,
    chain_map: HashMap<String, ChainIndex>,
    current_model: Option<(usize, ModelIndex)>,
    current_chain: Option<ChainIndex>,
    current_residue: Option<ResidueIndex>,
}

impl<'a> StructureBuilder<'a> {
    pub fn new(name: &str, storage: StorageKind, allocator: &'a mut GlobalIndexAllocator) -> Self {
        Self::with_capacity(name, storage, 0, allocator)
    }

    pub fn with_capacity(
        name: &str,
        storage: StorageKind,
        atom_capacity: usize,
        allocator: &'a mut GlobalIndexAllocator,
    ) -> Self {
        Self {
            structure: Structure::with_capacity(name, storage, atom_capacity),
            allocator,
            serial_map: HashMap::new(),
            chain_map: HashMap::new(),
            current_model: None,
            current_chain: None,
            current_residue: None,
        }
    }

    /// Picks the storage from the expected atom count: packed storage above
    /// `threshold` atoms.
    pub fn for_atom_count(
        name: &str,
        atom_count: usize,
        threshold: usize,
        allocator: &'a mut GlobalIndexAllocator,
    ) -> Self {
        let storage = StorageKind::for_atom_count(atom_count, threshold);
        Self::with_capacity(name, storage, atom_count, allocator)
    }

    pub fn structure(&self) -> &Structure {
        &self.structure
    }

    pub fn atom_count(&self) -> usize {
        self.structure.atom_count()
    }

    fn enter_model(&mut self, model_index: usize) -> ModelIndex {
        if let Some((current, index)) = self.current_model {
            if current == model_index {
                return index;
            }
        }
        let index = self.structure.add_model();
        trace!(model = model_index, "Starting model {}", index);
        self.current_model = Some((model_index, index));
        self.chain_map.clear();
        self.current_chain = None;
        self.current_residue = None;
        index
    }

    fn enter_chain(&mut self, model: ModelIndex, name: &str) -> ChainIndex {
        let name = name.trim();
        if let Some(current) = self.current_chain {
            if self.structure.chain(current).name() == name {
                return current;
            }
        }
        let index = match self.chain_map.get(name) {
            Some(&existing) => existing,
            None => {
                let index = self.structure.add_chain(model, name);
                self.chain_map.insert(name.to_string(), index);
                index
            }
        };
        self.current_chain = Some(index);
        self.current_residue = None;
        index
    }

    fn enter_residue(&mut self, chain: ChainIndex, number: i32, name: &str) -> ResidueIndex {
        if let Some(current) = self.current_residue {
            let residue = self.structure.residue(current);
            if residue.number() == number && residue.name() == name.trim() {
                return current;
            }
        }
        let index = self.structure.add_residue(chain, number, name);
        self.current_residue = Some(index);
        index
    }

    /// Places one record in the hierarchy and returns its atom index.
    pub fn add_record(&mut self, record: &AtomRecord) -> AtomIndex {
        let model = self.enter_model(record.model_index);
        let chain = self.enter_chain(model, &record.chain_name);
        let residue = self.enter_residue(chain, record.residue_number, &record.residue_name);
        let global_index = self.allocator.allocate();
        let atom = self.structure.add_atom(residue, record, global_index);
        self.serial_map.insert(record.serial, atom);
        atom
    }

    pub fn add_records<'r, I>(&mut self, records: I) -> &mut Self
    where
        I: IntoIterator<Item = &'r AtomRecord>,
    {
        for record in records {
            self.add_record(record);
        }
        self
    }

    /// Adds a bond between two atoms identified by their record serials.
    ///
    /// Returns `None` when either serial is unknown or both name the same atom.
    pub fn add_bond(&mut self, serial1: i32, serial2: i32, order: BondOrder) -> Option<BondIndex> {
        let a = *self.serial_map.get(&serial1)?;
        let b = *self.serial_map.get(&serial2)?;
        if a == b {
            return None;
        }
        Some(self.structure.add_bond(a, b, order))
    }

    /// Finishes construction and computes the center and bounding box.
    pub fn build(mut self) -> Structure {
        self.structure.refresh_geometry();
        self.structure
    }
}
