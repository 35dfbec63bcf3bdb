use super::checked_selection;
use crate::cli::SelectArgs;
use crate::error::Result;
use crate::input;
use crate::utils::progress::CliProgressHandler;
use molkit::core::models::atom::AtomView;
use molkit::core::models::ids::GlobalIndexAllocator;
use molkit::core::models::structure::Structure;
use molkit::core::models::view::AtomHandle;
use molkit::core::selection::Selection;
use molkit::engine::config::ProcessingConfig;
use molkit::engine::progress::ProgressReporter;
use tracing::info;

pub fn run(args: SelectArgs, config: &ProcessingConfig, progress: &CliProgressHandler) -> Result<()> {
    let selection = checked_selection(&args.selection)?;
    let reporter = ProgressReporter::with_callback(progress.callback());
    let mut allocator = GlobalIndexAllocator::new();
    let structure = input::load_structure(&args.structure, config, &mut allocator, &reporter)?;

    let counts = SelectionCounts::of(&structure, &selection);
    info!(
        atoms = counts.atoms,
        residues = counts.residues,
        bonds = counts.bonds,
        "Selection '{}' evaluated.",
        args.selection
    );
    if args.count {
        println!(
            "atoms: {}\nresidues: {}\nbonds: {}",
            counts.atoms, counts.residues, counts.bonds
        );
    } else {
        structure.each_atom(Some(&selection), |atom| println!("{}", atom_line(&atom)));
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionCounts {
    pub atoms: usize,
    pub residues: usize,
    pub bonds: usize,
}

impl SelectionCounts {
    pub fn of(structure: &Structure, selection: &Selection) -> Self {
        let mut bonds = 0;
        structure.each_bond(Some(selection), |_, _| bonds += 1);
        Self {
            atoms: structure.atom_indices(Some(selection)).len(),
            residues: structure.residue_indices(Some(selection)).len(),
            bonds,
        }
    }
}

/// `/model:chain RESnum.NAME  serial  x y z`
pub fn atom_line(atom: &AtomHandle) -> String {
    let p = atom.position();
    format!(
        "/{}:{} {}{}.{:<4} {:>6} {:>9.3} {:>9.3} {:>9.3}",
        atom.model_index(),
        atom.chain_name(),
        atom.residue_name(),
        atom.residue_number(),
        atom.name(),
        atom.serial(),
        p.x,
        p.y,
        p.z
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use molkit::core::models::atom::AtomRecord;
    use molkit::engine::progress::ProgressReporter;
    use molkit::workflows::build::{self, StructureInput};

    fn dipeptide() -> Structure {
        let coords = [
            ("GLY", 1, "N", [0.000, 0.000, 0.000]),
            ("GLY", 1, "CA", [1.458, 0.000, 0.000]),
            ("GLY", 1, "C", [2.009, 1.420, 0.000]),
            ("GLY", 1, "O", [1.251, 2.390, 0.000]),
            ("ALA", 2, "N", [3.332, 1.536, 0.000]),
            ("ALA", 2, "CA", [3.970, 2.846, 0.000]),
            ("ALA", 2, "C", [5.486, 2.711, 0.000]),
            ("ALA", 2, "O", [6.009, 1.597, 0.000]),
            ("ALA", 2, "CB", [3.500, 3.650, 1.220]),
        ];
        let records: Vec<AtomRecord> = coords
            .iter()
            .enumerate()
            .map(|(i, (res, num, name, pos))| {
                let mut record = AtomRecord::new("A", *num, res, name, *pos);
                record.serial = i as i32 + 1;
                record
            })
            .collect();
        build::run(
            &StructureInput::new("dipeptide", &records),
            &ProcessingConfig::default(),
            &mut GlobalIndexAllocator::new(),
            &ProgressReporter::new(),
        )
        .unwrap()
    }

    #[test]
    fn counts_cover_atoms_residues_and_bonds() {
        let structure = dipeptide();
        let counts = SelectionCounts::of(&structure, &Selection::new("backbone"));
        assert_eq!(counts.atoms, 8);
        assert_eq!(counts.residues, 2);
        assert_eq!(counts.bonds, 7);

        let ala = SelectionCounts::of(&structure, &Selection::new("ALA"));
        assert_eq!((ala.atoms, ala.residues), (5, 1));
    }

    #[test]
    fn atom_lines_carry_the_hierarchy() {
        let structure = dipeptide();
        let line = atom_line(&structure.atom_handle(structure.atom_indices(Some(&Selection::new("2 and .CB")))[0]));
        assert!(line.starts_with("/0:A ALA2.CB"));
        assert!(line.contains("     9"));
        assert!(line.ends_with("1.220"));
    }

    #[test]
    fn invalid_selection_is_rejected_before_loading() {
        assert!(checked_selection("1-2-3").is_err());
        assert!(checked_selection("").is_ok());
    }
}
