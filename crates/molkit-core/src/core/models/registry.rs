use super::array::StorageKind;
use super::atom::{AtomRecord, AtomView};
use super::builder::StructureBuilder;
use super::ids::{GlobalIndexAllocator, StructureId};
use super::structure::Structure;
use slotmap::SlotMap;
use tracing::debug;

/// Owns loaded structures under stable ids, together with the allocator
/// that hands out their global atom indices.
///
/// Every structure built through the registry draws from the same
/// allocator, so global indices are unique across all of them.
#[derive(Debug, Default)]
pub struct StructureRegistry {
    structures: SlotMap<StructureId, Structure>,
    allocator: GlobalIndexAllocator,
}

impl StructureRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allocator_mut(&mut self) -> &mut GlobalIndexAllocator {
        &mut self.allocator
    }

    /// Starts a builder drawing from this registry's allocator.
    pub fn builder(&mut self, name: &str, storage: StorageKind) -> StructureBuilder<'_> {
        StructureBuilder::new(name, storage, &mut self.allocator)
    }

    /// Builds a structure from records and stores it.
    pub fn build_from_records(
        &mut self,
        name: &str,
        records: &[AtomRecord],
        packed_threshold: usize,
    ) -> StructureId {
        let mut builder =
            StructureBuilder::for_atom_count(name, records.len(), packed_threshold, &mut self.allocator);
        builder.add_records(records);
        let structure = builder.build();
        self.insert(structure)
    }

    /// Stores a structure, reserving its global indices so later builds
    /// never reuse them.
    pub fn insert(&mut self, structure: Structure) -> StructureId {
        if let Some(max) = structure.atoms().map(|atom| atom.global_index()).max() {
            self.allocator.reserve_through(max);
        }
        let id = self.structures.insert(structure);
        debug!(?id, "Registered structure");
        id
    }

    pub fn get(&self, id: StructureId) -> Option<&Structure> {
        self.structures.get(id)
    }

    pub fn get_mut(&mut self, id: StructureId) -> Option<&mut Structure> {
        self.structures.get_mut(id)
    }

    /// Disposes of a structure; its id is never handed out again.
    pub fn remove(&mut self, id: StructureId) -> Option<Structure> {
        self.structures.remove(id)
    }

    pub fn len(&self) -> usize {
        self.structures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.structures.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (StructureId, &Structure)> {
        self.structures.iter()
    }
}
