use crate::core::models::atom::AtomRecord;
use crate::core::models::builder::StructureBuilder;
use crate::core::models::ids::GlobalIndexAllocator;
use crate::core::models::structure::Structure;
use crate::core::models::topology::BondOrder;
use crate::engine::batch::Batches;
use crate::engine::config::ProcessingConfig;
use crate::engine::context::ProcessingContext;
use crate::engine::error::EngineError;
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::tasks::secondary::SecondaryStructureRecord;
use crate::engine::tasks::{bonding, chain_naming, secondary};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

/// A bond given explicitly by the input, addressed by atom serial numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExplicitBond {
    pub serial1: i32,
    pub serial2: i32,
    #[serde(default)]
    pub order: BondOrder,
}

/// Everything a file reader hands over for one structure.
#[derive(Debug, Clone, Copy)]
pub struct StructureInput<'a> {
    pub name: &'a str,
    pub records: &'a [AtomRecord],
    pub bonds: &'a [ExplicitBond],
    pub secondary_structure: &'a [SecondaryStructureRecord],
}

impl<'a> StructureInput<'a> {
    pub fn new(name: &'a str, records: &'a [AtomRecord]) -> Self {
        Self {
            name,
            records,
            bonds: &[],
            secondary_structure: &[],
        }
    }

    pub fn with_bonds(mut self, bonds: &'a [ExplicitBond]) -> Self {
        self.bonds = bonds;
        self
    }

    pub fn with_secondary_structure(mut self, records: &'a [SecondaryStructureRecord]) -> Self {
        self.secondary_structure = records;
        self
    }
}

/// Assembles a structure from raw records and post-processes it.
///
/// Records are consumed in batches of `config.batching.batch_size`, with one
/// progress step per batch. The structure then gets explicit bonds, perceived
/// bonds, secondary structure (from the input's helix/sheet records when
/// there are any, otherwise from geometry) and, when the input names no
/// chain, automatic chain names.
///
/// # Errors
///
/// Returns [`EngineError::Config`] for an invalid configuration and
/// [`EngineError::EmptyStructure`] when there are no records.
#[instrument(skip_all, name = "build_workflow", fields(name = input.name))]
pub fn run(
    input: &StructureInput,
    config: &ProcessingConfig,
    allocator: &mut GlobalIndexAllocator,
    reporter: &ProgressReporter,
) -> Result<Structure, EngineError> {
    config.validate()?;
    if input.records.is_empty() {
        return Err(EngineError::EmptyStructure {
            name: input.name.to_string(),
        });
    }

    // === Phase 1: Assembly ===
    reporter.report(Progress::PhaseStart {
        name: "Assembling Structure",
    });
    let batches = Batches::new(input.records.len(), config.batching.batch_size);
    reporter.report(Progress::TaskStart {
        total_steps: batches.batch_count() as u64,
    });
    let mut builder = StructureBuilder::for_atom_count(
        input.name,
        input.records.len(),
        config.storage.packed_threshold,
        allocator,
    );
    for range in batches {
        builder.add_records(&input.records[range]);
        reporter.report(Progress::TaskIncrement);
    }
    reporter.report(Progress::TaskFinish);

    for bond in input.bonds {
        if builder.add_bond(bond.serial1, bond.serial2, bond.order).is_none() {
            warn!(
                serial1 = bond.serial1,
                serial2 = bond.serial2,
                "Skipping bond with an unknown or repeated atom serial."
            );
        }
    }
    let mut structure = builder.build();
    reporter.report(Progress::PhaseFinish);
    info!(
        atoms = structure.atom_count(),
        residues = structure.residue_count(),
        chains = structure.chain_count(),
        models = structure.model_count(),
        storage = ?structure.storage_kind(),
        "Structure assembled."
    );

    let context = ProcessingContext::new(config, reporter);

    // === Phase 2: Bonds ===
    reporter.phase("Perceiving Bonds", || bonding::run(&mut structure, &context));

    // === Phase 3: Secondary structure ===
    reporter.phase("Assigning Secondary Structure", || {
        if input.secondary_structure.is_empty() {
            secondary::run(&mut structure, &context)
        } else {
            secondary::apply_records(&mut structure, input.secondary_structure)
        }
    });

    // === Phase 4: Chain names ===
    if chain_naming::needs_names(&structure) {
        reporter.phase("Naming Chains", || chain_naming::run(&mut structure, &context));
    }

    info!(bonds = structure.bond_count(), "Structure ready.");
    Ok(structure)
}
