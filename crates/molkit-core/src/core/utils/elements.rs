use phf::{Map, phf_map};

pub const DEFAULT_VDW_RADIUS: f32 = 2.0;
pub const DEFAULT_COVALENT_RADIUS: f32 = 1.6;

// Alvarez 2013, https://doi.org/10.1021/jp8111556
static VDW_RADII: Map<&'static str, f32> = phf_map! {
    "H" => 1.1, "HE" => 1.4, "LI" => 1.81, "BE" => 1.53, "B" => 1.92, "C" => 1.7,
    "N" => 1.55, "O" => 1.52, "F" => 1.47, "NE" => 1.54, "NA" => 2.27, "MG" => 1.73, "AL" => 1.84,
    "SI" => 2.1, "P" => 1.8, "S" => 1.8, "CL" => 1.75, "AR" => 1.88, "K" => 2.75, "CA" => 2.31,
    "SC" => 2.3, "TI" => 2.15, "V" => 2.05, "CR" => 2.05, "MN" => 2.05, "FE" => 2.05, "CO" => 2.0,
    "NI" => 2.0, "CU" => 2.0, "ZN" => 2.1, "GA" => 1.87, "GE" => 2.11, "AS" => 1.85, "SE" => 1.9,
    "BR" => 1.83, "KR" => 2.02, "RB" => 3.03, "SR" => 2.49, "Y" => 2.4, "ZR" => 2.3, "NB" => 2.15,
    "MO" => 2.1, "TC" => 2.05, "RU" => 2.05, "RH" => 2.0, "PD" => 2.05, "AG" => 2.1, "CD" => 2.2,
    "IN" => 2.2, "SN" => 1.93, "SB" => 2.17, "TE" => 2.06, "I" => 1.98, "XE" => 2.16, "CS" => 3.43,
    "BA" => 2.68, "LA" => 2.5, "CE" => 2.48, "PR" => 2.47, "ND" => 2.45, "PM" => 2.43, "SM" => 2.42,
    "EU" => 2.4, "GD" => 2.38, "TB" => 2.37, "DY" => 2.35, "HO" => 2.33, "ER" => 2.32, "TM" => 2.3,
    "YB" => 2.28, "LU" => 2.27, "HF" => 2.25, "TA" => 2.2, "W" => 2.1, "RE" => 2.05, "OS" => 2.0,
    "IR" => 2.0, "PT" => 2.05, "AU" => 2.1, "HG" => 2.05, "TL" => 1.96, "PB" => 2.02, "BI" => 2.07,
    "PO" => 1.97, "AT" => 2.02, "RN" => 2.2, "FR" => 3.48, "RA" => 2.83, "AC" => 2.0, "TH" => 2.4,
    "PA" => 2.0, "U" => 2.3, "NP" => 2.0, "PU" => 2.0, "AM" => 2.0, "CM" => 2.0, "BK" => 2.0,
    "CF" => 2.0, "ES" => 2.0, "FM" => 2.0, "MD" => 2.0, "NO" => 2.0, "LR" => 2.0, "RF" => 2.0,
    "DB" => 2.0, "SG" => 2.0, "BH" => 2.0, "HS" => 2.0, "MT" => 2.0, "DS" => 2.0, "RG" => 2.0,
    "CN" => 2.0, "UUT" => 2.0, "FL" => 2.0, "UUP" => 2.0, "LV" => 2.0, "UUH" => 2.0,
};

// Cordero 2008, https://doi.org/10.1039/b801115j
static COVALENT_RADII: Map<&'static str, f32> = phf_map! {
    "H" => 0.31, "HE" => 0.28, "LI" => 1.28, "BE" => 0.96, "B" => 0.84, "C" => 0.76,
    "N" => 0.71, "O" => 0.66, "F" => 0.57, "NE" => 0.58, "NA" => 1.66, "MG" => 1.41, "AL" => 1.21,
    "SI" => 1.11, "P" => 1.07, "S" => 1.05, "CL" => 1.02, "AR" => 1.06, "K" => 2.03, "CA" => 1.76,
    "SC" => 1.7, "TI" => 1.6, "V" => 1.53, "CR" => 1.39, "MN" => 1.39, "FE" => 1.32, "CO" => 1.26,
    "NI" => 1.24, "CU" => 1.32, "ZN" => 1.22, "GA" => 1.22, "GE" => 1.2, "AS" => 1.19, "SE" => 1.2,
    "BR" => 1.2, "KR" => 1.16, "RB" => 2.2, "SR" => 1.95, "Y" => 1.9, "ZR" => 1.75, "NB" => 1.64,
    "MO" => 1.54, "TC" => 1.47, "RU" => 1.46, "RH" => 1.42, "PD" => 1.39, "AG" => 1.45, "CD" => 1.44,
    "IN" => 1.42, "SN" => 1.39, "SB" => 1.39, "TE" => 1.38, "I" => 1.39, "XE" => 1.4, "CS" => 2.44,
    "BA" => 2.15, "LA" => 2.07, "CE" => 2.04, "PR" => 2.03, "ND" => 2.01, "PM" => 1.99, "SM" => 1.98,
    "EU" => 1.98, "GD" => 1.96, "TB" => 1.94, "DY" => 1.92, "HO" => 1.92, "ER" => 1.89, "TM" => 1.9,
    "YB" => 1.87, "LU" => 1.87, "HF" => 1.75, "TA" => 1.7, "W" => 1.62, "RE" => 1.51, "OS" => 1.44,
    "IR" => 1.41, "PT" => 1.36, "AU" => 1.36, "HG" => 1.32, "TL" => 1.45, "PB" => 1.46, "BI" => 1.48,
    "PO" => 1.4, "AT" => 1.5, "RN" => 1.5, "FR" => 2.6, "RA" => 2.21, "AC" => 2.15, "TH" => 2.06,
    "PA" => 2.0, "U" => 1.96, "NP" => 1.9, "PU" => 1.87, "AM" => 1.8, "CM" => 1.69, "BK" => 1.6,
    "CF" => 1.6, "ES" => 1.6, "FM" => 1.6, "MD" => 1.6, "NO" => 1.6, "LR" => 1.6, "RF" => 1.6,
    "DB" => 1.6, "SG" => 1.6, "BH" => 1.6, "HS" => 1.6, "MT" => 1.6, "DS" => 1.6, "RG" => 1.6,
    "CN" => 1.6, "UUT" => 1.6, "FL" => 1.6, "UUP" => 1.6, "LV" => 1.6, "UUH" => 1.6,
};

const SINGLE_LETTER_ELEMENTS: [char; 6] = ['H', 'C', 'O', 'N', 'S', 'P'];
const TWO_LETTER_ELEMENTS: [&str; 2] = ["NA", "CL"];

/// Van der Waals radius of an element symbol in Angstroms.
///
/// Lookup is case-insensitive; unknown symbols fall back to
/// [`DEFAULT_VDW_RADIUS`].
pub fn vdw_radius(element: &str) -> f32 {
    VDW_RADII
        .get(element.trim().to_ascii_uppercase().as_str())
        .copied()
        .unwrap_or(DEFAULT_VDW_RADIUS)
}

/// Covalent radius of an element symbol in Angstroms.
///
/// Lookup is case-insensitive; unknown symbols fall back to
/// [`DEFAULT_COVALENT_RADIUS`].
pub fn covalent_radius(element: &str) -> f32 {
    COVALENT_RADII
        .get(element.trim().to_ascii_uppercase().as_str())
        .copied()
        .unwrap_or(DEFAULT_COVALENT_RADIUS)
}

/// Guesses the element symbol of an atom from its name.
///
/// A single leading digit (`1HB`, `2HG1`) is ignored. One-letter names are
/// taken verbatim, `NA` and `CL` are recognized as two-letter elements, and
/// otherwise the first character is used when it is one of `H C O N S P`.
///
/// # Return
///
/// The uppercase element symbol, or an empty string when no guess is possible.
pub fn guess_element(atom_name: &str) -> String {
    let mut name = atom_name.trim().to_ascii_uppercase();
    if name.starts_with(|c: char| matches!(c, '1'..='9')) {
        name.remove(0);
    }

    let first = name.chars().next();
    match name.len() {
        0 => String::new(),
        1 => name,
        2 if TWO_LETTER_ELEMENTS.contains(&name.as_str()) => name,
        _ => match first {
            Some(c) if SINGLE_LETTER_ELEMENTS.contains(&c) => c.to_string(),
            _ => String::new(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn radii_lookup_is_case_insensitive() {
        assert_eq!(vdw_radius("C"), 1.7);
        assert_eq!(vdw_radius("c"), 1.7);
        assert_eq!(covalent_radius("Fe"), 1.32);
    }

    #[test]
    fn unknown_elements_use_default_radii() {
        assert_eq!(vdw_radius("XX"), DEFAULT_VDW_RADIUS);
        assert_eq!(covalent_radius(""), DEFAULT_COVALENT_RADIUS);
    }

    #[test]
    fn guess_element_handles_common_atom_names() {
        assert_eq!(guess_element("CA"), "C");
        assert_eq!(guess_element(" N "), "N");
        assert_eq!(guess_element("OXT"), "O");
        assert_eq!(guess_element("SG"), "S");
        assert_eq!(guess_element("NA"), "NA");
        assert_eq!(guess_element("cl"), "CL");
    }

    #[test]
    fn guess_element_strips_leading_digit() {
        assert_eq!(guess_element("1HB"), "H");
        assert_eq!(guess_element("2HG1"), "H");
    }

    #[test]
    fn guess_element_returns_empty_when_unknown() {
        assert_eq!(guess_element(""), "");
        assert_eq!(guess_element("ZN1"), "");
        assert_eq!(guess_element("BB"), "");
    }
}
