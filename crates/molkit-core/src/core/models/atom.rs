use super::ids::{AtomIndex, ModelIndex, ResidueIndex};
use super::secondary::SecondaryStructure;
use crate::core::utils::elements;
use nalgebra::Point3;
use serde::{Deserialize, Serialize};

/// A raw atom as produced by an external file reader.
///
/// Records are consumed in order by the
/// [`StructureBuilder`](super::builder::StructureBuilder); missing chemistry
/// (element, radii) is filled in from the element tables when the record is
/// added.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AtomRecord {
    pub model_index: usize,
    pub chain_name: String,
    pub residue_number: i32,
    pub residue_name: String,
    pub atom_name: String,
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub element: String,
    pub covalent_radius: Option<f32>,
    pub vdw_radius: Option<f32>,
    pub hetero: bool,
    pub serial: i32,
    pub b_factor: f32,
    pub alt_loc: Option<char>,
}

impl AtomRecord {
    /// Creates a record with the naming fields set and everything else defaulted.
    pub fn new(
        chain_name: &str,
        residue_number: i32,
        residue_name: &str,
        atom_name: &str,
        position: [f32; 3],
    ) -> Self {
        Self {
            chain_name: chain_name.to_string(),
            residue_number,
            residue_name: residue_name.to_string(),
            atom_name: atom_name.to_string(),
            x: position[0],
            y: position[1],
            z: position[2],
            ..Self::default()
        }
    }

    pub fn with_model(mut self, model_index: usize) -> Self {
        self.model_index = model_index;
        self
    }

    pub fn with_alt_loc(mut self, alt_loc: char) -> Self {
        self.alt_loc = Some(alt_loc);
        self
    }

    pub fn with_hetero(mut self, hetero: bool) -> Self {
        self.hetero = hetero;
        self
    }

    pub fn with_element(mut self, element: &str) -> Self {
        self.element = element.to_string();
        self
    }

    /// The element symbol, guessed from the atom name when the record has none.
    pub fn resolved_element(&self) -> String {
        let element = self.element.trim();
        if element.is_empty() {
            elements::guess_element(&self.atom_name)
        } else {
            element.to_ascii_uppercase()
        }
    }
}

/// Read access to the fields of one atom, independent of how atoms are stored.
///
/// Structures keep their atoms either as individual [`Atom`] values or in a
/// packed [`AtomArray`](super::array::AtomArray); both hand out values
/// implementing this trait.
pub trait AtomView {
    fn index(&self) -> AtomIndex;
    fn global_index(&self) -> u64;
    fn residue(&self) -> ResidueIndex;
    fn position(&self) -> Point3<f64>;
    fn name(&self) -> &str;
    fn residue_name(&self) -> &str;
    fn chain_name(&self) -> &str;
    fn residue_number(&self) -> i32;
    fn serial(&self) -> i32;
    fn element(&self) -> &str;
    fn covalent_radius(&self) -> f32;
    fn vdw_radius(&self) -> f32;
    fn b_factor(&self) -> f32;
    fn alt_loc(&self) -> Option<char>;
    fn is_hetero(&self) -> bool;
    fn secondary_structure(&self) -> SecondaryStructure;
    fn model_index(&self) -> usize;

    fn distance_squared(&self, other: &dyn AtomView) -> f64 {
        nalgebra::distance_squared(&self.position(), &other.position())
    }

    /// Two atoms can coexist in one conformer when either has no alt-loc tag
    /// or both carry the same tag.
    fn has_compatible_alt_loc(&self, other: &dyn AtomView) -> bool {
        match (self.alt_loc(), other.alt_loc()) {
            (Some(a), Some(b)) => a == b,
            _ => true,
        }
    }
}

/// An individually stored atom, used by structures below the packed-storage
/// threshold.
#[derive(Debug, Clone, PartialEq)]
pub struct Atom {
    pub index: AtomIndex,
    pub global_index: u64,
    pub residue: ResidueIndex,
    pub position: Point3<f32>,
    pub name: String,
    pub residue_name: String,
    pub chain_name: String,
    pub residue_number: i32,
    pub serial: i32,
    pub element: String,
    pub covalent_radius: f32,
    pub vdw_radius: f32,
    pub b_factor: f32,
    pub alt_loc: Option<char>,
    pub hetero: bool,
    pub secondary_structure: SecondaryStructure,
    pub model_index: usize,
}

impl Atom {
    /// Creates an atom from a record, resolving element and radii.
    ///
    /// # Arguments
    ///
    /// * `record` - The raw atom record.
    /// * `index` - The local index the atom receives in its structure.
    /// * `global_index` - The identity handed out by the structure's allocator.
    /// * `residue` - The owning residue.
    /// * `model` - The structure model the residue belongs to; it replaces the
    ///   record's file-level model number.
    pub fn from_record(
        record: &AtomRecord,
        index: AtomIndex,
        global_index: u64,
        residue: ResidueIndex,
        model: ModelIndex,
    ) -> Self {
        let element = record.resolved_element();
        Self {
            index,
            global_index,
            residue,
            position: Point3::new(record.x, record.y, record.z),
            name: record.atom_name.trim().to_string(),
            residue_name: record.residue_name.trim().to_string(),
            chain_name: record.chain_name.trim().to_string(),
            residue_number: record.residue_number,
            serial: record.serial,
            covalent_radius: record
                .covalent_radius
                .unwrap_or_else(|| elements::covalent_radius(&element)),
            vdw_radius: record
                .vdw_radius
                .unwrap_or_else(|| elements::vdw_radius(&element)),
            element,
            b_factor: record.b_factor,
            alt_loc: record.alt_loc.filter(|c| !c.is_whitespace()),
            hetero: record.hetero,
            secondary_structure: SecondaryStructure::Unassigned,
            model_index: model.get(),
        }
    }
}

impl AtomView for Atom {
    fn index(&self) -> AtomIndex {
        self.index
    }
    fn global_index(&self) -> u64 {
        self.global_index
    }
    fn residue(&self) -> ResidueIndex {
        self.residue
    }
    fn position(&self) -> Point3<f64> {
        self.position.cast()
    }
    fn name(&self) -> &str {
        &self.name
    }
    fn residue_name(&self) -> &str {
        &self.residue_name
    }
    fn chain_name(&self) -> &str {
        &self.chain_name
    }
    fn residue_number(&self) -> i32 {
        self.residue_number
    }
    fn serial(&self) -> i32 {
        self.serial
    }
    fn element(&self) -> &str {
        &self.element
    }
    fn covalent_radius(&self) -> f32 {
        self.covalent_radius
    }
    fn vdw_radius(&self) -> f32 {
        self.vdw_radius
    }
    fn b_factor(&self) -> f32 {
        self.b_factor
    }
    fn alt_loc(&self) -> Option<char> {
        self.alt_loc
    }
    fn is_hetero(&self) -> bool {
        self.hetero
    }
    fn secondary_structure(&self) -> SecondaryStructure {
        self.secondary_structure
    }
    fn model_index(&self) -> usize {
        self.model_index
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str) -> AtomRecord {
        AtomRecord::new("A", 1, "ALA", name, [1.0, 2.0, 3.0])
    }

    #[test]
    fn from_record_resolves_element_and_radii() {
        let atom = Atom::from_record(&record("CA"), AtomIndex(0), 42, ResidueIndex(0), ModelIndex(0));
        assert_eq!(atom.element, "C");
        assert_eq!(atom.covalent_radius, 0.76);
        assert_eq!(atom.vdw_radius, 1.7);
        assert_eq!(atom.global_index, 42);
        assert_eq!(atom.position(), Point3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn explicit_record_values_take_precedence() {
        let mut rec = record("CA").with_element("ca");
        rec.covalent_radius = Some(1.0);
        let atom = Atom::from_record(&rec, AtomIndex(0), 0, ResidueIndex(0), ModelIndex(0));
        assert_eq!(atom.element, "CA");
        assert_eq!(atom.covalent_radius, 1.0);
        assert_eq!(atom.vdw_radius, 2.31);
    }

    #[test]
    fn blank_alt_loc_is_treated_as_missing() {
        let rec = record("N").with_alt_loc(' ');
        let atom = Atom::from_record(&rec, AtomIndex(0), 0, ResidueIndex(0), ModelIndex(0));
        assert_eq!(atom.alt_loc(), None);
    }

    #[test]
    fn alt_loc_compatibility_follows_tags() {
        let a = Atom::from_record(&record("N").with_alt_loc('A'), AtomIndex(0), 0, ResidueIndex(0), ModelIndex(0));
        let b = Atom::from_record(&record("N").with_alt_loc('B'), AtomIndex(1), 1, ResidueIndex(0), ModelIndex(0));
        let plain = Atom::from_record(&record("N"), AtomIndex(2), 2, ResidueIndex(0), ModelIndex(0));
        assert!(!a.has_compatible_alt_loc(&b));
        assert!(a.has_compatible_alt_loc(&plain));
        assert!(a.has_compatible_alt_loc(&a.clone()));
    }
}
