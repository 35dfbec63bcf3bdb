use serde::{Deserialize, Serialize};
use std::fmt;

/// Secondary-structure state of a residue, shared by all of its atoms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SecondaryStructure {
    /// Alpha helix (`h`).
    AlphaHelix,
    /// 3-10 helix (`g`).
    ThreeTenHelix,
    /// Pi helix (`i`).
    PiHelix,
    /// Beta strand / sheet (`s`).
    Sheet,
    /// Turn (`t`).
    Turn,
    /// Coil (`c`).
    Coil,
    /// No assignment has been made.
    #[default]
    Unassigned,
}

impl SecondaryStructure {
    /// The single-character code; unassigned residues use a space.
    pub fn code(self) -> char {
        match self {
            Self::AlphaHelix => 'h',
            Self::ThreeTenHelix => 'g',
            Self::PiHelix => 'i',
            Self::Sheet => 's',
            Self::Turn => 't',
            Self::Coil => 'c',
            Self::Unassigned => ' ',
        }
    }

    /// Parses a code; anything unknown is treated as unassigned.
    pub fn from_code(code: char) -> Self {
        match code.to_ascii_lowercase() {
            'h' => Self::AlphaHelix,
            'g' => Self::ThreeTenHelix,
            'i' => Self::PiHelix,
            's' => Self::Sheet,
            't' => Self::Turn,
            'c' => Self::Coil,
            _ => Self::Unassigned,
        }
    }

    pub fn is_helix(self) -> bool {
        matches!(self, Self::AlphaHelix | Self::ThreeTenHelix | Self::PiHelix)
    }

    pub fn is_sheet(self) -> bool {
        self == Self::Sheet
    }

    /// Maps a PDB `HELIX` record class (1-10) to a helix state.
    ///
    /// Classes 3 (pi) and 5 (3-10) are distinguished; everything else,
    /// including a missing class, is an alpha helix.
    pub fn from_helix_class(class: Option<u8>) -> Self {
        match class {
            Some(3) => Self::PiHelix,
            Some(5) => Self::ThreeTenHelix,
            _ => Self::AlphaHelix,
        }
    }
}

impl fmt::Display for SecondaryStructure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_survive_a_trip_through_characters() {
        for ss in [
            SecondaryStructure::AlphaHelix,
            SecondaryStructure::ThreeTenHelix,
            SecondaryStructure::PiHelix,
            SecondaryStructure::Sheet,
            SecondaryStructure::Turn,
            SecondaryStructure::Coil,
            SecondaryStructure::Unassigned,
        ] {
            assert_eq!(SecondaryStructure::from_code(ss.code()), ss);
        }
    }

    #[test]
    fn helix_family_includes_all_helix_kinds() {
        assert!(SecondaryStructure::AlphaHelix.is_helix());
        assert!(SecondaryStructure::ThreeTenHelix.is_helix());
        assert!(SecondaryStructure::PiHelix.is_helix());
        assert!(!SecondaryStructure::Sheet.is_helix());
        assert!(SecondaryStructure::Sheet.is_sheet());
    }

    #[test]
    fn helix_class_mapping_matches_pdb_conventions() {
        assert_eq!(SecondaryStructure::from_helix_class(Some(1)), SecondaryStructure::AlphaHelix);
        assert_eq!(SecondaryStructure::from_helix_class(Some(3)), SecondaryStructure::PiHelix);
        assert_eq!(SecondaryStructure::from_helix_class(Some(5)), SecondaryStructure::ThreeTenHelix);
        assert_eq!(SecondaryStructure::from_helix_class(None), SecondaryStructure::AlphaHelix);
    }
}
