use phf::{Map, Set, phf_map, phf_set};

static ONE_LETTER_CODES: Map<&'static str, &'static str> = phf_map! {
    "HIS" => "H", "ARG" => "R", "LYS" => "K", "ILE" => "I", "PHE" => "F",
    "LEU" => "L", "TRP" => "W", "ALA" => "A", "MET" => "M", "PRO" => "P",
    "CYS" => "C", "ASN" => "N", "VAL" => "V", "GLY" => "G", "SER" => "S",
    "GLN" => "Q", "TYR" => "Y", "ASP" => "D", "GLU" => "E", "THR" => "T",
    "ASH" => "D", "GLH" => "E",
    "UNK" => "",
};

static NUCLEIC_RESIDUE_NAMES: Set<&'static str> = phf_set! {
    "A", "C", "T", "G", "U", "DA", "DC", "DT", "DG", "DU",
};

static RNA_RESIDUE_NAMES: Set<&'static str> = phf_set! { "A", "C", "T", "G", "U" };

static DNA_RESIDUE_NAMES: Set<&'static str> = phf_set! { "DA", "DC", "DT", "DG", "DU" };

static WATER_RESIDUE_NAMES: Set<&'static str> = phf_set! { "SOL", "WAT", "HOH", "H2O", "W" };

static PROTEIN_BACKBONE_ATOM_NAMES: Set<&'static str> = phf_set! {
    "CA", "C", "N", "O", "O1", "O2", "OC1", "OC2", "H", "H1", "H2", "H3", "HA",
};

static NUCLEIC_BACKBONE_ATOM_NAMES: Set<&'static str> = phf_set! {
    "P", "O3'", "O5'", "C5'", "C4'", "C3'", "OP1", "OP2",
    "O3*", "O5*", "C5*", "C4*", "C3*",
};

static COARSE_GRAINED_BACKBONE_ATOM_NAMES: Set<&'static str> = phf_set! { "CA", "BB" };

/// One-letter code of a residue name, `None` for names outside the amino acid table.
///
/// `UNK` maps to an empty code.
pub fn one_letter_code(residue_name: &str) -> Option<&'static str> {
    ONE_LETTER_CODES.get(residue_name).copied()
}

pub fn is_amino_acid_name(residue_name: &str) -> bool {
    ONE_LETTER_CODES.contains_key(residue_name)
}

pub fn is_nucleic_name(residue_name: &str) -> bool {
    NUCLEIC_RESIDUE_NAMES.contains(residue_name)
}

pub fn is_rna_name(residue_name: &str) -> bool {
    RNA_RESIDUE_NAMES.contains(residue_name)
}

pub fn is_dna_name(residue_name: &str) -> bool {
    DNA_RESIDUE_NAMES.contains(residue_name)
}

pub fn is_water_name(residue_name: &str) -> bool {
    WATER_RESIDUE_NAMES.contains(residue_name)
}

pub fn is_protein_backbone_atom(atom_name: &str) -> bool {
    PROTEIN_BACKBONE_ATOM_NAMES.contains(atom_name)
}

pub fn is_nucleic_backbone_atom(atom_name: &str) -> bool {
    NUCLEIC_BACKBONE_ATOM_NAMES.contains(atom_name)
}

pub fn is_coarse_grained_backbone_atom(atom_name: &str) -> bool {
    COARSE_GRAINED_BACKBONE_ATOM_NAMES.contains(atom_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_letter_code_covers_standard_and_protonation_variants() {
        assert_eq!(one_letter_code("ALA"), Some("A"));
        assert_eq!(one_letter_code("TRP"), Some("W"));
        assert_eq!(one_letter_code("ASH"), Some("D"));
        assert_eq!(one_letter_code("GLH"), Some("E"));
        assert_eq!(one_letter_code("UNK"), Some(""));
        assert_eq!(one_letter_code("HOH"), None);
    }

    #[test]
    fn nucleic_tables_split_rna_and_dna() {
        assert!(is_nucleic_name("A"));
        assert!(is_nucleic_name("DG"));
        assert!(is_rna_name("U"));
        assert!(!is_rna_name("DU"));
        assert!(is_dna_name("DT"));
        assert!(!is_dna_name("T"));
    }

    #[test]
    fn water_names_are_recognized() {
        for name in ["SOL", "WAT", "HOH", "H2O", "W"] {
            assert!(is_water_name(name), "{name} should be water");
        }
        assert!(!is_water_name("ALA"));
    }

    #[test]
    fn backbone_tables_are_case_sensitive() {
        assert!(is_protein_backbone_atom("CA"));
        assert!(is_protein_backbone_atom("OC2"));
        assert!(!is_protein_backbone_atom("ca"));
        assert!(!is_protein_backbone_atom("OXT"));
        assert!(is_nucleic_backbone_atom("O3'"));
        assert!(is_nucleic_backbone_atom("C4*"));
        assert!(is_coarse_grained_backbone_atom("BB"));
    }
}
