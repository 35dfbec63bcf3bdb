//! Packed structure-of-arrays atom storage.
//!
//! Large structures keep their atoms in an [`AtomArray`]: one flat buffer per
//! field, with names stored as fixed-width byte codes. Individual atoms are
//! read through [`ProxyAtom`], a borrowed (array, index) pair. Small structures
//! use plain [`Atom`] values instead; [`AtomStorage`] hides the difference and
//! is chosen once, when the structure is created.

use super::atom::{Atom, AtomRecord, AtomView};
use super::ids::{AtomIndex, ModelIndex, ResidueIndex};
use super::secondary::SecondaryStructure;
use crate::core::utils::elements;
use nalgebra::Point3;
use serde::{Deserialize, Serialize};

pub const ATOM_NAME_WIDTH: usize = 4;
pub const RESIDUE_NAME_WIDTH: usize = 5;
pub const CHAIN_NAME_WIDTH: usize = 4;
pub const ELEMENT_WIDTH: usize = 3;

/// Number of atoms above which new structures use packed storage.
pub const DEFAULT_PACKED_THRESHOLD: usize = 1000;

/// A column of names stored as fixed-width, zero-padded byte codes.
///
/// Names that are longer than `W` bytes or not plain ASCII are kept whole in
/// a side table of `(row, name)` pairs sorted by row, so reading a row always
/// returns the name that was written.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NameColumn<const W: usize> {
    codes: Vec<u8>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    overflow: Vec<(usize, String)>,
}

impl<const W: usize> NameColumn<W> {
    pub fn with_capacity(rows: usize) -> Self {
        Self {
            codes: Vec::with_capacity(rows * W),
            overflow: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.codes.len() / W
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    fn fits(value: &str) -> bool {
        value.len() <= W && value.bytes().all(|b| b.is_ascii() && b != 0)
    }

    fn overflow_slot(&self, row: usize) -> Result<usize, usize> {
        self.overflow.binary_search_by_key(&row, |(r, _)| *r)
    }

    fn set_overflow(&mut self, row: usize, value: Option<&str>) {
        match (self.overflow_slot(row), value) {
            (Ok(slot), Some(value)) => self.overflow[slot].1 = value.to_string(),
            (Ok(slot), None) => {
                self.overflow.remove(slot);
            }
            (Err(slot), Some(value)) => self.overflow.insert(slot, (row, value.to_string())),
            (Err(_), None) => {}
        }
    }

    pub fn push(&mut self, value: &str) {
        let value = value.trim();
        let row = self.len();
        let start = self.codes.len();
        if Self::fits(value) {
            self.codes.extend_from_slice(value.as_bytes());
        } else {
            self.overflow.push((row, value.to_string()));
        }
        self.codes.resize(start + W, 0);
    }

    pub fn set(&mut self, row: usize, value: &str) {
        let value = value.trim();
        let slot = &mut self.codes[row * W..(row + 1) * W];
        slot.fill(0);
        if Self::fits(value) {
            slot[..value.len()].copy_from_slice(value.as_bytes());
            self.set_overflow(row, None);
        } else {
            self.set_overflow(row, Some(value));
        }
    }

    pub fn get(&self, row: usize) -> &str {
        if let Ok(slot) = self.overflow_slot(row) {
            return &self.overflow[slot].1;
        }
        let slot = &self.codes[row * W..(row + 1) * W];
        let len = slot.iter().position(|&b| b == 0).unwrap_or(W);
        std::str::from_utf8(&slot[..len]).unwrap_or("")
    }

    /// Checks that the column holds exactly `rows` rows and that its side
    /// table is sorted, unique and in range.
    ///
    /// On failure returns the expected and found sizes: code bytes for a
    /// short code buffer, rows for a bad side-table entry.
    pub(crate) fn check_rows(&self, rows: usize) -> Result<(), (usize, usize)> {
        if self.codes.len() != rows * W {
            return Err((rows * W, self.codes.len()));
        }
        let ordered = self.overflow.windows(2).all(|pair| pair[0].0 < pair[1].0);
        match self.overflow.last() {
            Some(&(row, _)) if row >= rows || !ordered => Err((rows, row + 1)),
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AtomArray {
    pub(crate) global_index: Vec<u64>,
    pub(crate) residue: Vec<ResidueIndex>,
    pub(crate) x: Vec<f32>,
    pub(crate) y: Vec<f32>,
    pub(crate) z: Vec<f32>,
    pub(crate) atom_name: NameColumn<ATOM_NAME_WIDTH>,
    pub(crate) residue_name: NameColumn<RESIDUE_NAME_WIDTH>,
    pub(crate) chain_name: NameColumn<CHAIN_NAME_WIDTH>,
    pub(crate) element: NameColumn<ELEMENT_WIDTH>,
    pub(crate) residue_number: Vec<i32>,
    pub(crate) serial: Vec<i32>,
    pub(crate) covalent_radius: Vec<f32>,
    pub(crate) vdw_radius: Vec<f32>,
    pub(crate) b_factor: Vec<f32>,
    pub(crate) alt_loc: Vec<Option<char>>,
    pub(crate) hetero: Vec<u8>,
    pub(crate) secondary_structure: Vec<u8>,
    pub(crate) model_index: Vec<u32>,
}

impl AtomArray {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            global_index: Vec::with_capacity(capacity),
            residue: Vec::with_capacity(capacity),
            x: Vec::with_capacity(capacity),
            y: Vec::with_capacity(capacity),
            z: Vec::with_capacity(capacity),
            atom_name: NameColumn::with_capacity(capacity),
            residue_name: NameColumn::with_capacity(capacity),
            chain_name: NameColumn::with_capacity(capacity),
            element: NameColumn::with_capacity(capacity),
            residue_number: Vec::with_capacity(capacity),
            serial: Vec::with_capacity(capacity),
            covalent_radius: Vec::with_capacity(capacity),
            vdw_radius: Vec::with_capacity(capacity),
            b_factor: Vec::with_capacity(capacity),
            alt_loc: Vec::with_capacity(capacity),
            hetero: Vec::with_capacity(capacity),
            secondary_structure: Vec::with_capacity(capacity),
            model_index: Vec::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    pub fn push(
        &mut self,
        record: &AtomRecord,
        global_index: u64,
        residue: ResidueIndex,
        model: ModelIndex,
    ) {
        let element = record.resolved_element();
        self.global_index.push(global_index);
        self.residue.push(residue);
        self.x.push(record.x);
        self.y.push(record.y);
        self.z.push(record.z);
        self.atom_name.push(&record.atom_name);
        self.residue_name.push(&record.residue_name);
        self.chain_name.push(&record.chain_name);
        self.element.push(&element);
        self.residue_number.push(record.residue_number);
        self.serial.push(record.serial);
        self.covalent_radius.push(
            record
                .covalent_radius
                .unwrap_or_else(|| elements::covalent_radius(&element)),
        );
        self.vdw_radius.push(
            record
                .vdw_radius
                .unwrap_or_else(|| elements::vdw_radius(&element)),
        );
        self.b_factor.push(record.b_factor);
        self.alt_loc
            .push(record.alt_loc.filter(|c| !c.is_whitespace()));
        self.hetero.push(u8::from(record.hetero));
        self.secondary_structure.push(0);
        self.model_index.push(model.get() as u32);
    }

    /// Appends a copy of an atom held in another storage.
    pub(crate) fn push_view(&mut self, atom: &dyn AtomView, residue: ResidueIndex, model: ModelIndex) {
        self.global_index.push(atom.global_index());
        self.residue.push(residue);
        let position = atom.position();
        self.x.push(position.x as f32);
        self.y.push(position.y as f32);
        self.z.push(position.z as f32);
        self.atom_name.push(atom.name());
        self.residue_name.push(atom.residue_name());
        self.chain_name.push(atom.chain_name());
        self.element.push(atom.element());
        self.residue_number.push(atom.residue_number());
        self.serial.push(atom.serial());
        self.covalent_radius.push(atom.covalent_radius());
        self.vdw_radius.push(atom.vdw_radius());
        self.b_factor.push(atom.b_factor());
        self.alt_loc.push(atom.alt_loc());
        self.hetero.push(u8::from(atom.is_hetero()));
        self.secondary_structure
            .push(encode_secondary(atom.secondary_structure()));
        self.model_index.push(model.get() as u32);
    }

    pub fn get(&self, index: AtomIndex) -> ProxyAtom<'_> {
        debug_assert!(index.get() < self.len());
        ProxyAtom { array: self, index }
    }
}

fn encode_secondary(ss: SecondaryStructure) -> u8 {
    match ss {
        SecondaryStructure::Unassigned => 0,
        other => other.code() as u8,
    }
}

fn decode_secondary(code: u8) -> SecondaryStructure {
    if code == 0 {
        SecondaryStructure::Unassigned
    } else {
        SecondaryStructure::from_code(code as char)
    }
}

/// A lightweight view of one atom inside an [`AtomArray`].
#[derive(Debug, Clone, Copy)]
pub struct ProxyAtom<'a> {
    array: &'a AtomArray,
    index: AtomIndex,
}

impl AtomView for ProxyAtom<'_> {
    fn index(&self) -> AtomIndex {
        self.index
    }
    fn global_index(&self) -> u64 {
        self.array.global_index[self.index.get()]
    }
    fn residue(&self) -> ResidueIndex {
        self.array.residue[self.index.get()]
    }
    fn position(&self) -> Point3<f64> {
        let i = self.index.get();
        Point3::new(
            self.array.x[i] as f64,
            self.array.y[i] as f64,
            self.array.z[i] as f64,
        )
    }
    fn name(&self) -> &str {
        self.array.atom_name.get(self.index.get())
    }
    fn residue_name(&self) -> &str {
        self.array.residue_name.get(self.index.get())
    }
    fn chain_name(&self) -> &str {
        self.array.chain_name.get(self.index.get())
    }
    fn residue_number(&self) -> i32 {
        self.array.residue_number[self.index.get()]
    }
    fn serial(&self) -> i32 {
        self.array.serial[self.index.get()]
    }
    fn element(&self) -> &str {
        self.array.element.get(self.index.get())
    }
    fn covalent_radius(&self) -> f32 {
        self.array.covalent_radius[self.index.get()]
    }
    fn vdw_radius(&self) -> f32 {
        self.array.vdw_radius[self.index.get()]
    }
    fn b_factor(&self) -> f32 {
        self.array.b_factor[self.index.get()]
    }
    fn alt_loc(&self) -> Option<char> {
        self.array.alt_loc[self.index.get()]
    }
    fn is_hetero(&self) -> bool {
        self.array.hetero[self.index.get()] != 0
    }
    fn secondary_structure(&self) -> SecondaryStructure {
        decode_secondary(self.array.secondary_structure[self.index.get()])
    }
    fn model_index(&self) -> usize {
        self.array.model_index[self.index.get()] as usize
    }
}

/// Which representation a structure keeps its atoms in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StorageKind {
    /// One [`Atom`] value per atom.
    #[default]
    Objects,
    /// A packed [`AtomArray`].
    Packed,
}

impl StorageKind {
    /// Picks packed storage when the expected atom count exceeds `threshold`.
    pub fn for_atom_count(atom_count: usize, threshold: usize) -> Self {
        if atom_count > threshold {
            Self::Packed
        } else {
            Self::Objects
        }
    }
}

/// The atoms of one structure, in exactly one of the two representations.
#[derive(Debug, Clone, PartialEq)]
pub enum AtomStorage {
    Objects(Vec<Atom>),
    Packed(AtomArray),
}

impl AtomStorage {
    pub fn new(kind: StorageKind, capacity: usize) -> Self {
        match kind {
            StorageKind::Objects => Self::Objects(Vec::with_capacity(capacity)),
            StorageKind::Packed => Self::Packed(AtomArray::with_capacity(capacity)),
        }
    }

    pub fn kind(&self) -> StorageKind {
        match self {
            Self::Objects(_) => StorageKind::Objects,
            Self::Packed(_) => StorageKind::Packed,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Objects(atoms) => atoms.len(),
            Self::Packed(array) => array.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn push_record(
        &mut self,
        record: &AtomRecord,
        global_index: u64,
        residue: ResidueIndex,
        model: ModelIndex,
    ) -> AtomIndex {
        let index = AtomIndex(self.len());
        match self {
            Self::Objects(atoms) => {
                atoms.push(Atom::from_record(record, index, global_index, residue, model))
            }
            Self::Packed(array) => array.push(record, global_index, residue, model),
        }
        index
    }

    /// Appends a copy of an atom from another storage under new parents.
    pub(crate) fn push_copy(
        &mut self,
        atom: &dyn AtomView,
        residue: ResidueIndex,
        model: ModelIndex,
    ) -> AtomIndex {
        let index = AtomIndex(self.len());
        match self {
            Self::Objects(atoms) => atoms.push(Atom {
                index,
                global_index: atom.global_index(),
                residue,
                position: atom.position().cast(),
                name: atom.name().to_string(),
                residue_name: atom.residue_name().to_string(),
                chain_name: atom.chain_name().to_string(),
                residue_number: atom.residue_number(),
                serial: atom.serial(),
                element: atom.element().to_string(),
                covalent_radius: atom.covalent_radius(),
                vdw_radius: atom.vdw_radius(),
                b_factor: atom.b_factor(),
                alt_loc: atom.alt_loc(),
                hetero: atom.is_hetero(),
                secondary_structure: atom.secondary_structure(),
                model_index: model.get(),
            }),
            Self::Packed(array) => array.push_view(atom, residue, model),
        }
        index
    }

    pub fn get(&self, index: AtomIndex) -> AtomRef<'_> {
        match self {
            Self::Objects(atoms) => AtomRef::Object(&atoms[index.get()]),
            Self::Packed(array) => AtomRef::Proxy(array.get(index)),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = AtomRef<'_>> + '_ {
        (0..self.len()).map(move |i| self.get(AtomIndex(i)))
    }

    pub fn set_position(&mut self, index: AtomIndex, position: &Point3<f64>) {
        match self {
            Self::Objects(atoms) => atoms[index.get()].position = position.cast(),
            Self::Packed(array) => {
                let i = index.get();
                array.x[i] = position.x as f32;
                array.y[i] = position.y as f32;
                array.z[i] = position.z as f32;
            }
        }
    }

    pub fn set_secondary_structure(&mut self, index: AtomIndex, ss: SecondaryStructure) {
        match self {
            Self::Objects(atoms) => atoms[index.get()].secondary_structure = ss,
            Self::Packed(array) => array.secondary_structure[index.get()] = encode_secondary(ss),
        }
    }

    pub fn set_chain_name(&mut self, index: AtomIndex, name: &str) {
        match self {
            Self::Objects(atoms) => atoms[index.get()].chain_name = name.to_string(),
            Self::Packed(array) => array.chain_name.set(index.get(), name),
        }
    }
}

/// A borrowed atom from either storage representation.
#[derive(Debug, Clone, Copy)]
pub enum AtomRef<'a> {
    Object(&'a Atom),
    Proxy(ProxyAtom<'a>),
}

macro_rules! delegate_atom_view {
    ($($method:ident -> $ret:ty),* $(,)?) => {
        impl<'a> AtomView for AtomRef<'a> {
            $(
                #[inline]
                fn $method(&self) -> $ret {
                    match self {
                        AtomRef::Object(atom) => atom.$method(),
                        AtomRef::Proxy(proxy) => proxy.$method(),
                    }
                }
            )*
        }
    };
}

delegate_atom_view! {
    index -> AtomIndex,
    global_index -> u64,
    residue -> ResidueIndex,
    position -> Point3<f64>,
    name -> &str,
    residue_name -> &str,
    chain_name -> &str,
    residue_number -> i32,
    serial -> i32,
    element -> &str,
    covalent_radius -> f32,
    vdw_radius -> f32,
    b_factor -> f32,
    alt_loc -> Option<char>,
    is_hetero -> bool,
    secondary_structure -> SecondaryStructure,
    model_index -> usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_record() -> AtomRecord {
        let mut record = AtomRecord::new("A", 12, "GLU", "OE1", [1.5, -2.0, 3.25]);
        record.serial = 99;
        record.b_factor = 17.5;
        record.alt_loc = Some('B');
        record.hetero = true;
        record
    }

    #[test]
    fn packed_and_object_storage_expose_identical_views() {
        let record = sample_record();
        let mut objects = AtomStorage::new(StorageKind::Objects, 1);
        let mut packed = AtomStorage::new(StorageKind::Packed, 1);
        objects.push_record(&record, 7, ResidueIndex(3), ModelIndex(0));
        packed.push_record(&record, 7, ResidueIndex(3), ModelIndex(0));

        let a = objects.get(AtomIndex(0));
        let b = packed.get(AtomIndex(0));
        assert_eq!(a.name(), b.name());
        assert_eq!(a.residue_name(), b.residue_name());
        assert_eq!(a.chain_name(), b.chain_name());
        assert_eq!(a.element(), b.element());
        assert_eq!(a.position(), b.position());
        assert_eq!(a.serial(), b.serial());
        assert_eq!(a.alt_loc(), b.alt_loc());
        assert_eq!(a.is_hetero(), b.is_hetero());
        assert_eq!(a.global_index(), b.global_index());
        assert_eq!(a.residue(), b.residue());
        assert_eq!(a.covalent_radius(), b.covalent_radius());
    }

    #[test]
    fn long_names_survive_packed_storage() {
        let record = AtomRecord::new("LONGCHAIN", 1, "ABCDEFG", "HHHHHH", [0.0; 3]);
        let mut array = AtomArray::with_capacity(1);
        array.push(&record, 0, ResidueIndex(0), ModelIndex(0));
        let atom = array.get(AtomIndex(0));
        assert_eq!(atom.name(), "HHHHHH");
        assert_eq!(atom.residue_name(), "ABCDEFG");
        assert_eq!(atom.chain_name(), "LONGCHAIN");
    }

    #[test]
    fn names_sharing_a_prefix_stay_distinct_in_both_storages() {
        let records = [
            AtomRecord::new("A", 1, "LIG", "C1234", [0.0; 3]),
            AtomRecord::new("A", 1, "LIG", "C1235", [1.0, 0.0, 0.0]),
            AtomRecord::new("Ä", 1, "LIGÅ", "Cα", [2.0, 0.0, 0.0]).with_alt_loc('β'),
        ];
        let mut objects = AtomStorage::new(StorageKind::Objects, records.len());
        let mut packed = AtomStorage::new(StorageKind::Packed, records.len());
        for (i, record) in records.iter().enumerate() {
            objects.push_record(record, i as u64, ResidueIndex(0), ModelIndex(0));
            packed.push_record(record, i as u64, ResidueIndex(0), ModelIndex(0));
        }

        for (a, b) in objects.iter().zip(packed.iter()) {
            assert_eq!(a.name(), b.name());
            assert_eq!(a.residue_name(), b.residue_name());
            assert_eq!(a.chain_name(), b.chain_name());
            assert_eq!(a.alt_loc(), b.alt_loc());
        }
        assert_eq!(packed.get(AtomIndex(0)).name(), "C1234");
        assert_eq!(packed.get(AtomIndex(1)).name(), "C1235");
        assert_eq!(packed.get(AtomIndex(2)).name(), "Cα");
        assert_eq!(packed.get(AtomIndex(2)).alt_loc(), Some('β'));
    }

    #[test]
    fn rewriting_a_name_replaces_any_overflow() {
        let mut column = NameColumn::<4>::with_capacity(2);
        column.push("CHAIN_A");
        column.push("B");
        column.set(0, "A");
        column.set(1, "CHAIN_B");
        assert_eq!(column.get(0), "A");
        assert_eq!(column.get(1), "CHAIN_B");
        assert_eq!(column.len(), 2);
        assert!(column.check_rows(2).is_ok());
        assert!(column.check_rows(3).is_err());

        column.overflow.push((5, "STRAY".to_string()));
        assert_eq!(column.check_rows(2), Err((2, 6)));
    }

    #[test]
    fn writes_are_visible_through_views() {
        for kind in [StorageKind::Objects, StorageKind::Packed] {
            let mut storage = AtomStorage::new(kind, 1);
            storage.push_record(&sample_record(), 0, ResidueIndex(0), ModelIndex(0));
            storage.set_position(AtomIndex(0), &Point3::new(4.0, 5.0, 6.0));
            storage.set_secondary_structure(AtomIndex(0), SecondaryStructure::Sheet);
            storage.set_chain_name(AtomIndex(0), "Z");

            let atom = storage.get(AtomIndex(0));
            assert_eq!(atom.position(), Point3::new(4.0, 5.0, 6.0));
            assert_eq!(atom.secondary_structure(), SecondaryStructure::Sheet);
            assert_eq!(atom.chain_name(), "Z");
        }
    }

    #[test]
    fn packed_storage_starts_unassigned() {
        let mut storage = AtomStorage::new(StorageKind::Packed, 1);
        storage.push_record(&sample_record(), 0, ResidueIndex(0), ModelIndex(0));
        assert_eq!(
            storage.get(AtomIndex(0)).secondary_structure(),
            SecondaryStructure::Unassigned
        );
    }

    #[test]
    fn storage_kind_switches_above_threshold() {
        assert_eq!(StorageKind::for_atom_count(1000, 1000), StorageKind::Objects);
        assert_eq!(StorageKind::for_atom_count(1001, 1000), StorageKind::Packed);
    }

    #[test]
    fn copies_preserve_fields_across_representations() {
        let mut objects = AtomStorage::new(StorageKind::Objects, 1);
        objects.push_record(&sample_record(), 5, ResidueIndex(0), ModelIndex(0));
        objects.set_secondary_structure(AtomIndex(0), SecondaryStructure::AlphaHelix);

        let mut packed = AtomStorage::new(StorageKind::Packed, 1);
        packed.push_copy(&objects.get(AtomIndex(0)), ResidueIndex(9), ModelIndex(2));
        let copy = packed.get(AtomIndex(0));
        assert_eq!(copy.residue(), ResidueIndex(9));
        assert_eq!(copy.model_index(), 2);
        assert_eq!(copy.global_index(), 5);
        assert_eq!(copy.secondary_structure(), SecondaryStructure::AlphaHelix);
        assert_eq!(copy.name(), "OE1");
    }
}
