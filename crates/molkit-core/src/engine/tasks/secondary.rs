use crate::core::models::ids::ResidueIndex;
use crate::core::models::secondary::SecondaryStructure;
use crate::core::models::structure::Structure;
use crate::core::utils::geometry::helix_axis;
use crate::engine::config::SecondaryStructureConfig;
use crate::engine::context::ProcessingContext;
use crate::engine::progress::Progress;
use nalgebra::Point3;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

/// A helix or sheet range read from a structure file.
///
/// Only the start chain is matched; `end_chain` is kept for reporting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecondaryStructureRecord {
    pub kind: SecondaryStructure,
    pub start_chain: String,
    pub start_residue: i32,
    pub end_chain: String,
    pub end_residue: i32,
}

impl SecondaryStructureRecord {
    /// A helix of PDB class `class` (see [`SecondaryStructure::from_helix_class`]).
    pub fn helix(chain: &str, start: i32, end: i32, class: Option<u8>) -> Self {
        Self::new(SecondaryStructure::from_helix_class(class), chain, start, end)
    }

    pub fn sheet(chain: &str, start: i32, end: i32) -> Self {
        Self::new(SecondaryStructure::Sheet, chain, start, end)
    }

    fn new(kind: SecondaryStructure, chain: &str, start: i32, end: i32) -> Self {
        Self {
            kind,
            start_chain: chain.to_string(),
            start_residue: start,
            end_chain: chain.to_string(),
            end_residue: end,
        }
    }
}

/// Writes file-provided helix and sheet ranges onto every matching residue
/// of every model. Sheets are applied after helices and win on overlap.
///
/// Returns the number of residue assignments made.
#[instrument(skip_all, name = "secondary_structure_records")]
pub fn apply_records(structure: &mut Structure, records: &[SecondaryStructureRecord]) -> usize {
    let (helices, sheets): (Vec<_>, Vec<_>) = records.iter().partition(|r| r.kind.is_helix());

    let mut assigned = 0;
    for record in helices.into_iter().chain(sheets) {
        let targets: Vec<ResidueIndex> = structure
            .residues()
            .iter()
            .filter(|residue| {
                structure.chain(residue.chain()).name() == record.start_chain
                    && (record.start_residue..=record.end_residue).contains(&residue.number())
            })
            .map(|residue| residue.index())
            .collect();
        for residue in &targets {
            structure.set_residue_secondary_structure(*residue, record.kind);
        }
        assigned += targets.len();
    }
    debug!(records = records.len(), assigned, "Applied secondary-structure records");
    assigned
}

enum FiberKind {
    Protein,
    CoarseGrained,
}

struct FiberTrace {
    kind: FiberKind,
    residues: Vec<ResidueIndex>,
    trace: Vec<Option<Point3<f64>>>,
}

/// Assigns secondary structure from backbone geometry.
///
/// Protein fibers are classified residue by residue with the Zhang-Skolnick
/// distance test; coarse-grained fibers from the local helix axis. Fibers
/// shorter than the configured minimum are left untouched. Protein fibers
/// are left without any helix or sheet run of a single residue. In
/// coarse-grained fibers only helical residues are written; the others keep
/// their current code.
///
/// Returns the number of residues classified.
#[instrument(skip_all, name = "secondary_structure_task")]
pub fn run(structure: &mut Structure, context: &ProcessingContext) -> usize {
    let config = &context.config.secondary_structure;
    let criteria = context.criteria();

    let mut fibers = Vec::new();
    structure.each_fiber_with(None, &criteria, |fiber| {
        if fiber.residue_count() < config.min_fiber_length {
            return;
        }
        let kind = if fiber.is_protein() {
            FiberKind::Protein
        } else if fiber.is_coarse_grained() {
            FiberKind::CoarseGrained
        } else {
            return;
        };
        fibers.push(FiberTrace {
            kind,
            residues: fiber.residue_indices().to_vec(),
            trace: fiber.trace_positions(),
        });
    });

    context.reporter.report(Progress::TaskStart {
        total_steps: fibers.len() as u64,
    });
    let (mut classified, mut helix, mut sheet) = (0, 0, 0);
    for fiber in &fibers {
        let assignment = match fiber.kind {
            FiberKind::Protein => {
                let mut assignment = classify_protein(&fiber.trace, config);
                collapse_isolated(&mut assignment);
                Some(assignment)
            }
            FiberKind::CoarseGrained => {
                let current: Vec<SecondaryStructure> = fiber
                    .residues
                    .iter()
                    .map(|&r| structure.residue(r).secondary_structure())
                    .collect();
                classify_coarse_grained(&fiber.trace, &current, config)
            }
        };
        if let Some(assignment) = assignment {
            for (&residue, &ss) in fiber.residues.iter().zip(&assignment) {
                structure.set_residue_secondary_structure(residue, ss);
            }
            classified += assignment.len();
            helix += assignment.iter().filter(|ss| ss.is_helix()).count();
            sheet += assignment.iter().filter(|ss| ss.is_sheet()).count();
        }
        context.reporter.report(Progress::TaskIncrement);
    }
    context.reporter.report(Progress::TaskFinish);

    info!(
        fibers = fibers.len(),
        classified, helix, sheet, "Secondary-structure assignment complete."
    );
    classified
}

fn classify_protein(
    trace: &[Option<Point3<f64>>],
    config: &SecondaryStructureConfig,
) -> Vec<SecondaryStructure> {
    (0..trace.len())
        .map(|i| {
            if matches_reference(trace, i, &config.helix_distances, config.helix_tolerance) {
                SecondaryStructure::AlphaHelix
            } else if matches_reference(trace, i, &config.sheet_distances, config.sheet_tolerance)
            {
                SecondaryStructure::Sheet
            } else {
                SecondaryStructure::Coil
            }
        })
        .collect()
}

/// Zhang-Skolnick test: every trace distance from residues `i - 2 ..= i` to
/// the residues 2, 3 and 4 further along must be within `tolerance` of the
/// reference. Pairs running past the end of the fiber are skipped; a
/// missing trace atom fails the test.
fn matches_reference(
    trace: &[Option<Point3<f64>>],
    i: usize,
    reference: &[f64; 3],
    tolerance: f64,
) -> bool {
    for j in i.saturating_sub(2)..=i {
        for k in 2..5 {
            if j + k >= trace.len() {
                continue;
            }
            let (Some(a), Some(b)) = (trace[j], trace[j + k]) else {
                return false;
            };
            let d = nalgebra::distance(&a, &b);
            if d.is_nan() || (d - reference[k - 2]).abs() > tolerance {
                return false;
            }
        }
    }
    true
}

/// Marks both residues of a step helical when the axis centers are
/// `center_distance_range` apart (exclusive) and the axis bends less than
/// the limit. Other residues keep their entry in `current`. `None` when a
/// trace atom is missing.
fn classify_coarse_grained(
    trace: &[Option<Point3<f64>>],
    current: &[SecondaryStructure],
    config: &SecondaryStructureConfig,
) -> Option<Vec<SecondaryStructure>> {
    let points: Vec<Point3<f64>> = trace.iter().copied().collect::<Option<_>>()?;
    let axis = helix_axis(&points)?;
    let (low, high) = config.center_distance_range;

    let mut assignment = current.to_vec();
    for i in 0..points.len() - 1 {
        let d = nalgebra::distance(&axis.centers[i], &axis.centers[i + 1]);
        if d > low && d < high && axis.bending[i] < config.max_bending_degrees {
            assignment[i] = SecondaryStructure::AlphaHelix;
            assignment[i + 1] = SecondaryStructure::AlphaHelix;
        }
    }
    Some(assignment)
}

/// Turns helix and sheet runs of length one into coil.
fn collapse_isolated(assignment: &mut [SecondaryStructure]) {
    let mut start = 0;
    while start < assignment.len() {
        let ss = assignment[start];
        let end = assignment[start..]
            .iter()
            .position(|&other| other != ss)
            .map_or(assignment.len(), |offset| start + offset);
        if end - start == 1 && (ss.is_helix() || ss.is_sheet()) {
            assignment[start] = SecondaryStructure::Coil;
        }
        start = end;
    }
}
