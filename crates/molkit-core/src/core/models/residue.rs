use super::ids::{AtomIndex, ChainIndex, ModelIndex, ResidueIndex};
use super::secondary::SecondaryStructure;
use crate::core::utils::identifiers;
use std::collections::HashMap;

const MAX_COARSE_GRAINED_ATOMS: usize = 5;

/// Broad chemical class of a residue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResidueType {
    Protein,
    Nucleic,
    CoarseGrained,
    Water,
    Unknown,
}

/// Kind of backbone a residue contributes to a fiber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackboneType {
    Protein,
    Rna,
    Dna,
    CoarseGrained,
    Unknown,
}

/// Which backbone atoms must be present for a residue to count as having a
/// backbone at a given place in a fiber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackboneSpan {
    /// Start atom plus both direction atoms (first residue of a link).
    Outgoing,
    /// Both direction atoms only.
    Direction,
    /// End atom plus both direction atoms (second residue of a link).
    Incoming,
    /// Start, end and both direction atoms.
    Complete,
}

struct BackboneAtomNames {
    trace: &'static [&'static str],
    direction1: &'static [&'static str],
    direction2: &'static [&'static str],
    start: &'static [&'static str],
    end: &'static [&'static str],
}

const PROTEIN_BACKBONE: BackboneAtomNames = BackboneAtomNames {
    trace: &["CA"],
    direction1: &["C"],
    direction2: &["O", "OC1", "O1"],
    start: &["C"],
    end: &["N"],
};

const RNA_BACKBONE: BackboneAtomNames = BackboneAtomNames {
    trace: &["C4'", "C4*"],
    direction1: &["C1'", "C1*"],
    direction2: &["C3'", "C3*"],
    start: &["O3'", "O3*"],
    end: &["P"],
};

const DNA_BACKBONE: BackboneAtomNames = BackboneAtomNames {
    trace: &["C3'", "C3*"],
    direction1: &["C2'", "C2*"],
    direction2: &["O4'", "O4*"],
    start: &["O3'", "O3*"],
    end: &["P"],
};

const COARSE_GRAINED_BACKBONE: BackboneAtomNames = BackboneAtomNames {
    trace: &["CA", "BB"],
    direction1: &[],
    direction2: &[],
    start: &["CA", "BB"],
    end: &["CA", "BB"],
};

const UNKNOWN_BACKBONE: BackboneAtomNames = BackboneAtomNames {
    trace: &["CA"],
    direction1: &[],
    direction2: &[],
    start: &["CA"],
    end: &["CA"],
};

impl BackboneType {
    fn atom_names(self) -> &'static BackboneAtomNames {
        match self {
            Self::Protein => &PROTEIN_BACKBONE,
            Self::Rna => &RNA_BACKBONE,
            Self::Dna => &DNA_BACKBONE,
            Self::CoarseGrained => &COARSE_GRAINED_BACKBONE,
            Self::Unknown => &UNKNOWN_BACKBONE,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Residue {
    pub(crate) index: ResidueIndex,
    pub(crate) chain: ChainIndex,
    pub(crate) model: ModelIndex,
    pub(crate) number: i32,
    pub(crate) name: String,
    pub(crate) secondary_structure: SecondaryStructure,
    pub(crate) atoms: Vec<AtomIndex>,
    atom_name_map: HashMap<String, AtomIndex>,
}

impl Residue {
    pub(crate) fn new(
        index: ResidueIndex,
        chain: ChainIndex,
        model: ModelIndex,
        number: i32,
        name: &str,
    ) -> Self {
        Self {
            index,
            chain,
            model,
            number,
            name: name.trim().to_string(),
            secondary_structure: SecondaryStructure::Unassigned,
            atoms: Vec::new(),
            atom_name_map: HashMap::new(),
        }
    }

    /// Registers an atom; the first atom carrying a name wins name lookups.
    pub(crate) fn add_atom(&mut self, atom_name: &str, atom: AtomIndex) {
        self.atoms.push(atom);
        self.atom_name_map
            .entry(atom_name.to_string())
            .or_insert(atom);
    }

    pub fn index(&self) -> ResidueIndex {
        self.index
    }

    pub fn chain(&self) -> ChainIndex {
        self.chain
    }

    pub fn model(&self) -> ModelIndex {
        self.model
    }

    pub fn number(&self) -> i32 {
        self.number
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn secondary_structure(&self) -> SecondaryStructure {
        self.secondary_structure
    }

    pub fn atoms(&self) -> &[AtomIndex] {
        &self.atoms
    }

    pub fn atom_count(&self) -> usize {
        self.atoms.len()
    }

    pub fn atom_by_name(&self, name: &str) -> Option<AtomIndex> {
        self.atom_name_map.get(name).copied()
    }

    /// The earliest atom (in residue order) whose name is one of `names`.
    pub fn atom_by_any_name(&self, names: &[&str]) -> Option<AtomIndex> {
        names
            .iter()
            .filter_map(|name| self.atom_name_map.get(*name))
            .min()
            .copied()
    }

    fn has_all(&self, groups: &[&[&str]]) -> bool {
        groups
            .iter()
            .all(|names| self.atom_by_any_name(names).is_some())
    }

    pub fn is_protein(&self) -> bool {
        ["CA", "C", "N"]
            .iter()
            .all(|name| self.atom_name_map.contains_key(*name))
    }

    pub fn is_coarse_grained(&self) -> bool {
        !self.is_protein()
            && self.atom_by_any_name(&["CA", "BB"]).is_some()
            && self.atoms.len() <= MAX_COARSE_GRAINED_ATOMS
            && identifiers::is_amino_acid_name(&self.name)
    }

    pub fn is_nucleic(&self) -> bool {
        identifiers::is_nucleic_name(&self.name)
    }

    pub fn is_rna(&self) -> bool {
        identifiers::is_rna_name(&self.name)
    }

    pub fn is_dna(&self) -> bool {
        identifiers::is_dna_name(&self.name)
    }

    pub fn is_water(&self) -> bool {
        identifiers::is_water_name(&self.name)
    }

    pub fn is_polymer(&self) -> bool {
        self.is_protein() || self.is_nucleic() || self.is_coarse_grained()
    }

    pub fn residue_type(&self) -> ResidueType {
        if self.is_protein() {
            ResidueType::Protein
        } else if self.is_nucleic() {
            ResidueType::Nucleic
        } else if self.is_coarse_grained() {
            ResidueType::CoarseGrained
        } else if self.is_water() {
            ResidueType::Water
        } else {
            ResidueType::Unknown
        }
    }

    fn has_span(&self, names: &BackboneAtomNames, span: BackboneSpan) -> bool {
        match span {
            BackboneSpan::Outgoing => self.has_all(&[names.start, names.direction1, names.direction2]),
            BackboneSpan::Direction => self.has_all(&[names.direction1, names.direction2]),
            BackboneSpan::Incoming => self.has_all(&[names.end, names.direction1, names.direction2]),
            BackboneSpan::Complete => self.has_all(&[
                names.start,
                names.end,
                names.direction1,
                names.direction2,
            ]),
        }
    }

    fn has_protein_backbone(&self, span: BackboneSpan) -> bool {
        self.is_protein() && self.has_span(&PROTEIN_BACKBONE, span)
    }

    fn has_rna_backbone(&self, span: BackboneSpan) -> bool {
        self.is_rna() && self.has_span(&RNA_BACKBONE, span)
    }

    fn has_dna_backbone(&self, span: BackboneSpan) -> bool {
        self.is_dna() && self.has_span(&DNA_BACKBONE, span)
    }

    pub fn has_backbone(&self, span: BackboneSpan) -> bool {
        self.has_protein_backbone(span)
            || self.is_coarse_grained()
            || self.has_rna_backbone(span)
            || self.has_dna_backbone(span)
    }

    pub fn backbone_type(&self, span: BackboneSpan) -> BackboneType {
        if self.has_protein_backbone(span) {
            BackboneType::Protein
        } else if self.has_rna_backbone(span) {
            BackboneType::Rna
        } else if self.has_dna_backbone(span) {
            BackboneType::Dna
        } else if self.is_coarse_grained() {
            BackboneType::CoarseGrained
        } else {
            BackboneType::Unknown
        }
    }

    pub fn trace_atom(&self) -> Option<AtomIndex> {
        let names = self.backbone_type(BackboneSpan::Direction).atom_names();
        self.atom_by_any_name(names.trace)
    }

    pub fn direction_atoms(&self) -> (Option<AtomIndex>, Option<AtomIndex>) {
        let names = self.backbone_type(BackboneSpan::Direction).atom_names();
        (
            self.atom_by_any_name(names.direction1),
            self.atom_by_any_name(names.direction2),
        )
    }

    /// The atom that links this residue to the next one (protein `C`, nucleic `O3'`).
    pub fn backbone_start_atom(&self) -> Option<AtomIndex> {
        let names = self.backbone_type(BackboneSpan::Outgoing).atom_names();
        self.atom_by_any_name(names.start)
    }

    /// The atom that links this residue to the previous one (protein `N`, nucleic `P`).
    pub fn backbone_end_atom(&self) -> Option<AtomIndex> {
        let names = self.backbone_type(BackboneSpan::Incoming).atom_names();
        self.atom_by_any_name(names.end)
    }

    /// One-letter amino acid code, `?` when the name has none.
    pub fn one_letter_code(&self) -> char {
        identifiers::one_letter_code(&self.name.to_ascii_uppercase())
            .and_then(|code| code.chars().next())
            .unwrap_or('?')
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn residue_with(name: &str, atoms: &[&str]) -> Residue {
        let mut residue = Residue::new(ResidueIndex(0), ChainIndex(0), ModelIndex(0), 1, name);
        for (i, atom) in atoms.iter().enumerate() {
            residue.add_atom(atom, AtomIndex(i));
        }
        residue
    }

    #[test]
    fn full_amino_acid_is_protein_with_complete_backbone() {
        let residue = residue_with("ALA", &["N", "CA", "C", "O", "CB"]);
        assert!(residue.is_protein());
        assert!(!residue.is_coarse_grained());
        assert_eq!(residue.residue_type(), ResidueType::Protein);
        assert!(residue.has_backbone(BackboneSpan::Complete));
        assert_eq!(residue.backbone_type(BackboneSpan::Complete), BackboneType::Protein);
        assert_eq!(residue.backbone_start_atom(), Some(AtomIndex(2)));
        assert_eq!(residue.backbone_end_atom(), Some(AtomIndex(0)));
        assert_eq!(residue.trace_atom(), Some(AtomIndex(1)));
    }

    #[test]
    fn protein_without_oxygen_lacks_backbone_directions() {
        let residue = residue_with("GLY", &["N", "CA", "C"]);
        assert!(residue.is_protein());
        assert!(!residue.has_backbone(BackboneSpan::Direction));
        assert_eq!(residue.backbone_type(BackboneSpan::Complete), BackboneType::Unknown);
        assert_eq!(residue.backbone_start_atom(), Some(AtomIndex(1)));
    }

    #[test]
    fn terminal_oxygen_variants_satisfy_direction2() {
        let residue = residue_with("SER", &["N", "CA", "C", "OC1", "OC2"]);
        assert!(residue.has_backbone(BackboneSpan::Complete));
        assert_eq!(residue.direction_atoms(), (Some(AtomIndex(2)), Some(AtomIndex(3))));
    }

    #[test]
    fn coarse_grained_residue_is_detected_by_bead_names() {
        let residue = residue_with("LEU", &["BB", "SC1"]);
        assert!(residue.is_coarse_grained());
        assert_eq!(residue.residue_type(), ResidueType::CoarseGrained);
        assert_eq!(residue.backbone_type(BackboneSpan::Outgoing), BackboneType::CoarseGrained);
        assert_eq!(residue.backbone_start_atom(), Some(AtomIndex(0)));
    }

    #[test]
    fn coarse_grained_requires_known_amino_acid_and_few_atoms() {
        assert!(!residue_with("XYZ", &["CA"]).is_coarse_grained());
        assert!(!residue_with("LEU", &["CA", "A", "B", "C", "D", "E"]).is_coarse_grained());
    }

    #[test]
    fn nucleotides_get_rna_or_dna_backbone() {
        let rna = residue_with("U", &["P", "O5'", "C4'", "C3'", "O3'", "C1'"]);
        assert!(rna.is_nucleic());
        assert_eq!(rna.backbone_type(BackboneSpan::Complete), BackboneType::Rna);
        assert_eq!(rna.backbone_start_atom(), Some(AtomIndex(4)));
        assert_eq!(rna.backbone_end_atom(), Some(AtomIndex(0)));
        assert_eq!(rna.trace_atom(), Some(AtomIndex(2)));

        let dna = residue_with("DA", &["P", "C3'", "C2'", "O4'", "O3*"]);
        assert_eq!(dna.backbone_type(BackboneSpan::Complete), BackboneType::Dna);
        assert_eq!(dna.backbone_start_atom(), Some(AtomIndex(4)));
    }

    #[test]
    fn water_residue_type() {
        let residue = residue_with("HOH", &["O"]);
        assert!(residue.is_water());
        assert!(!residue.is_polymer());
        assert_eq!(residue.residue_type(), ResidueType::Water);
    }

    #[test]
    fn first_atom_with_a_name_wins_lookups() {
        let residue = residue_with("ALA", &["CA", "CA"]);
        assert_eq!(residue.atom_by_name("CA"), Some(AtomIndex(0)));
        assert_eq!(residue.atom_by_any_name(&["O", "CA"]), Some(AtomIndex(0)));
    }

    #[test]
    fn one_letter_code_falls_back_to_question_mark() {
        assert_eq!(residue_with("TRP", &[]).one_letter_code(), 'W');
        assert_eq!(residue_with("UNK", &[]).one_letter_code(), '?');
        assert_eq!(residue_with("HOH", &[]).one_letter_code(), '?');
    }
}
