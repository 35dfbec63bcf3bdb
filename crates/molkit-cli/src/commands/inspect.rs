use super::checked_selection;
use crate::cli::InspectArgs;
use crate::error::Result;
use crate::input;
use crate::utils::progress::CliProgressHandler;
use molkit::core::models::ids::GlobalIndexAllocator;
use molkit::core::models::structure::Structure;
use molkit::core::selection::Selection;
use molkit::engine::config::ProcessingConfig;
use molkit::engine::progress::ProgressReporter;
use std::fmt::Write;

pub fn run(args: InspectArgs, config: &ProcessingConfig, progress: &CliProgressHandler) -> Result<()> {
    let selection = args.selection.as_deref().map(checked_selection).transpose()?;
    let reporter = ProgressReporter::with_callback(progress.callback());
    let mut allocator = GlobalIndexAllocator::new();
    let structure = input::load_structure(&args.structure, config, &mut allocator, &reporter)?;
    println!("{}", summary(&structure, selection.as_ref()));
    Ok(())
}

/// Human-readable overview of a structure, restricted to `selection` when given.
pub fn summary(structure: &Structure, selection: Option<&Selection>) -> String {
    let mut out = String::new();
    let atoms = structure.atom_indices(selection).len();
    let residues = structure.residue_indices(selection);
    let mut bonds = 0;
    structure.each_bond(selection, |_, _| bonds += 1);

    let _ = writeln!(out, "name: {}", structure.name);
    let _ = writeln!(out, "storage: {:?}", structure.storage_kind());
    let _ = writeln!(
        out,
        "models: {}  chains: {}  residues: {}  atoms: {}  bonds: {}",
        structure.model_count(),
        structure.chain_count(),
        residues.len(),
        atoms,
        bonds
    );

    let _ = writeln!(out, "chains:");
    structure.each_chain(selection, |chain| {
        let name = match chain.name() {
            "" => "-",
            name => name,
        };
        let _ = writeln!(
            out,
            "  /{}:{}  {} residues",
            chain.model(),
            name,
            chain.residue_count()
        );
    });

    let _ = writeln!(out, "sequence: {}", structure.sequence(selection));
    let secondary: String = residues
        .iter()
        .map(|&r| structure.residue(r).secondary_structure().code())
        .collect();
    let _ = writeln!(out, "secondary structure: {}", secondary);

    let center = structure.center();
    let _ = write!(
        out,
        "center: ({:.3}, {:.3}, {:.3})",
        center.x, center.y, center.z
    );
    if let Some(bbox) = structure.compute_bounding_box(selection) {
        let _ = write!(
            out,
            "\nbounds: ({:.3}, {:.3}, {:.3}) - ({:.3}, {:.3}, {:.3})",
            bbox.min.x, bbox.min.y, bbox.min.z, bbox.max.x, bbox.max.y, bbox.max.z
        );
    }
    out
}
