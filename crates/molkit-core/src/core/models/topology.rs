use super::ids::{AtomIndex, BondIndex};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum BondOrder {
    #[default]
    Single = 1,
    Double = 2,
    Triple = 3,
    Aromatic = 4,
}

impl BondOrder {
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            1 => Some(Self::Single),
            2 => Some(Self::Double),
            3 => Some(Self::Triple),
            4 => Some(Self::Aromatic),
            _ => None,
        }
    }
}

#[derive(Debug, Error)]
#[error("Invalid bond order string")]
pub struct ParseBondOrderError;

impl FromStr for BondOrder {
    type Err = ParseBondOrderError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "1" | "s" | "single" => Ok(Self::Single),
            "2" | "d" | "double" => Ok(Self::Double),
            "3" | "t" | "triple" => Ok(Self::Triple),
            "4" | "ar" | "aromatic" => Ok(Self::Aromatic),
            _ => Err(ParseBondOrderError),
        }
    }
}

impl fmt::Display for BondOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Self::Single => "Single",
                Self::Double => "Double",
                Self::Triple => "Triple",
                Self::Aromatic => "Aromatic",
            }
        )
    }
}

/// A bond between two atoms of the same structure, stored low index first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Bond {
    pub atom1: AtomIndex,
    pub atom2: AtomIndex,
    pub order: BondOrder,
}

impl Bond {
    pub fn new(a: AtomIndex, b: AtomIndex, order: BondOrder) -> Self {
        let (atom1, atom2) = if a <= b { (a, b) } else { (b, a) };
        Self {
            atom1,
            atom2,
            order,
        }
    }

    pub fn contains(&self, atom: AtomIndex) -> bool {
        self.atom1 == atom || self.atom2 == atom
    }

    /// The endpoint opposite `atom`, if `atom` is part of this bond.
    pub fn partner(&self, atom: AtomIndex) -> Option<AtomIndex> {
        if self.atom1 == atom {
            Some(self.atom2)
        } else if self.atom2 == atom {
            Some(self.atom1)
        } else {
            None
        }
    }
}

/// All bonds of a structure plus, per atom, the list of bonds it takes part in.
///
/// Both endpoint lists reference the same [`BondIndex`], so a bond looked up
/// from either atom is the same bond.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BondSet {
    bonds: Vec<Bond>,
    atom_bonds: Vec<Vec<BondIndex>>,
}

impl BondSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.bonds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bonds.is_empty()
    }

    pub fn bonds(&self) -> &[Bond] {
        &self.bonds
    }

    pub fn get(&self, index: BondIndex) -> Option<&Bond> {
        self.bonds.get(index.get())
    }

    pub fn iter(&self) -> impl Iterator<Item = (BondIndex, &Bond)> {
        self.bonds
            .iter()
            .enumerate()
            .map(|(i, bond)| (BondIndex(i), bond))
    }

    /// Bonds the given atom takes part in.
    pub fn atom_bonds(&self, atom: AtomIndex) -> &[BondIndex] {
        self.atom_bonds
            .get(atom.get())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn find(&self, a: AtomIndex, b: AtomIndex) -> Option<BondIndex> {
        self.atom_bonds(a)
            .iter()
            .copied()
            .find(|&index| self.bonds[index.get()].partner(a) == Some(b))
    }

    /// Inserts a bond and links it into both endpoint lists.
    ///
    /// Adding a pair that is already bonded leaves the set unchanged and
    /// returns the existing bond.
    ///
    /// # Panics
    ///
    /// Panics when both endpoints are the same atom.
    pub fn add_bond(&mut self, a: AtomIndex, b: AtomIndex, order: BondOrder) -> BondIndex {
        assert_ne!(a, b, "An atom cannot be bonded to itself");
        if let Some(existing) = self.find(a, b) {
            return existing;
        }

        let bond = Bond::new(a, b, order);
        let index = BondIndex(self.bonds.len());
        let needed = bond.atom2.get() + 1;
        if self.atom_bonds.len() < needed {
            self.atom_bonds.resize_with(needed, Vec::new);
        }
        self.atom_bonds[bond.atom1.get()].push(index);
        self.atom_bonds[bond.atom2.get()].push(index);
        self.bonds.push(bond);
        index
    }

    /// Bonded neighbors of an atom, in bond insertion order.
    pub fn neighbors(&self, atom: AtomIndex) -> impl Iterator<Item = AtomIndex> + '_ {
        self.atom_bonds(atom)
            .iter()
            .filter_map(move |index| self.bonds[index.get()].partner(atom))
    }

    pub fn clear(&mut self) {
        self.bonds.clear();
        self.atom_bonds.clear();
    }
}
