use crate::cli::StructureArgs;
use crate::error::{CliError, Result};
use molkit::core::models::atom::{AtomRecord, AtomView};
use molkit::core::models::ids::GlobalIndexAllocator;
use molkit::core::models::structure::Structure;
use molkit::engine::config::ProcessingConfig;
use molkit::engine::progress::ProgressReporter;
use molkit::workflows::build::{self, ExplicitBond, StructureInput};
use serde::de::DeserializeOwned;
use std::path::Path;
use tracing::{debug, info};

fn read_rows<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let parse_error = |e: csv::Error| CliError::FileParsing {
        path: path.to_path_buf(),
        source: e.into(),
    };
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(parse_error)?;
    reader
        .deserialize()
        .collect::<std::result::Result<Vec<T>, _>>()
        .map_err(parse_error)
}

/// Reads atom records from a CSV table whose header names
/// [`AtomRecord`] fields (`chain_name`, `residue_number`, `atom_name`,
/// `x`, ...). Missing columns take their default values.
pub fn read_records(path: &Path) -> Result<Vec<AtomRecord>> {
    let records: Vec<AtomRecord> = read_rows(path)?;
    debug!(path = %path.display(), records = records.len(), "Read atom records");
    Ok(records)
}

/// Reads `serial1,serial2[,order]` rows; `order` is `Single`, `Double`,
/// `Triple` or `Aromatic`, and `Single` when the column is absent.
pub fn read_bonds(path: &Path) -> Result<Vec<ExplicitBond>> {
    read_rows(path)
}

fn structure_name(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "structure".to_string())
}

/// Reads the files named by `args` and runs the build workflow on them.
pub fn load_structure(
    args: &StructureArgs,
    config: &ProcessingConfig,
    allocator: &mut GlobalIndexAllocator,
    reporter: &ProgressReporter,
) -> Result<Structure> {
    load_structure_from(&args.input, args.bonds.as_deref(), config, allocator, reporter)
}

pub fn load_structure_from(
    input: &Path,
    bonds: Option<&Path>,
    config: &ProcessingConfig,
    allocator: &mut GlobalIndexAllocator,
    reporter: &ProgressReporter,
) -> Result<Structure> {
    info!("Loading structure from {:?}", input);
    let records = read_records(input)?;
    let bonds = match bonds {
        Some(path) => read_bonds(path)?,
        None => Vec::new(),
    };
    let name = structure_name(input);
    let structure_input = StructureInput::new(&name, &records).with_bonds(&bonds);
    Ok(build::run(&structure_input, config, allocator, reporter)?)
}

/// The record a reader would have produced for this atom in its current position.
fn to_record<A: AtomView + ?Sized>(atom: &A) -> AtomRecord {
    let p = atom.position();
    AtomRecord {
        model_index: atom.model_index(),
        chain_name: atom.chain_name().to_string(),
        residue_number: atom.residue_number(),
        residue_name: atom.residue_name().to_string(),
        atom_name: atom.name().to_string(),
        x: p.x as f32,
        y: p.y as f32,
        z: p.z as f32,
        element: atom.element().to_string(),
        covalent_radius: Some(atom.covalent_radius()),
        vdw_radius: Some(atom.vdw_radius()),
        hetero: atom.is_hetero(),
        serial: atom.serial(),
        b_factor: atom.b_factor(),
        alt_loc: atom.alt_loc(),
    }
}

/// Writes every atom of `structure` as a CSV table readable by [`read_records`].
pub fn write_records(structure: &Structure, path: &Path) -> Result<()> {
    let write_error = |e: csv::Error| CliError::FileParsing {
        path: path.to_path_buf(),
        source: e.into(),
    };
    let mut writer = csv::Writer::from_path(path).map_err(write_error)?;
    for atom in structure.atoms() {
        writer.serialize(to_record(&atom)).map_err(write_error)?;
    }
    writer.flush()?;
    info!(atoms = structure.atom_count(), "Wrote {:?}", path);
    Ok(())
}
