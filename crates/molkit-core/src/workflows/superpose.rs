use crate::core::align::{Aligner, Alignment};
use crate::core::models::atom::AtomView;
use crate::core::models::ids::AtomIndex;
use crate::core::models::structure::Structure;
use crate::core::models::view::AtomHandle;
use crate::core::selection::Selection;
use crate::core::utils::superposition::{self, Superposition};
use crate::engine::error::EngineError;
use crate::engine::progress::{Progress, ProgressReporter};
use nalgebra::Point3;
use tracing::{debug, info, instrument};

/// How matched atoms are chosen for a whole-structure superposition.
///
/// Without alignment, the `CA` atoms selected by each selection are paired
/// in order. With alignment, the sequences of the selected residues are
/// aligned and the `CA` atoms of every gap-free column are paired. When
/// both filters are set, a pair survives only if its mobile atom passes
/// `mobile_filter` and its target atom passes `target_filter`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SuperposeOptions {
    pub align: bool,
    pub mobile_selection: String,
    pub target_selection: String,
    pub mobile_filter: String,
    pub target_filter: String,
}

#[derive(Debug, Clone)]
pub struct SuperposeReport {
    pub superposition: Superposition,
    /// The sequence alignment used for pairing, when requested.
    pub alignment: Option<Alignment>,
    /// Matched `(mobile, target)` atoms, in pairing order.
    pub pairs: Vec<(AtomIndex, AtomIndex)>,
}

/// Moves `mobile` onto `target` by least-squares superposition of matched
/// `CA` atoms, then refreshes the mobile structure's center and bounds.
///
/// # Errors
///
/// Returns [`EngineError::Selection`] when a selection fails to parse,
/// [`EngineError::Alignment`] when the alignment traceback fails and
/// [`EngineError::Superposition`] when the matched atoms cannot be
/// superposed (fewer than three pairs, unequal counts, degenerate
/// geometry). `mobile` is left untouched on error.
#[instrument(skip_all, name = "superpose_workflow")]
pub fn run(
    mobile: &mut Structure,
    target: &Structure,
    options: &SuperposeOptions,
    aligner: &Aligner,
    reporter: &ProgressReporter,
) -> Result<SuperposeReport, EngineError> {
    reporter.report(Progress::PhaseStart {
        name: "Superposition",
    });

    let (mut pairs, alignment) = if options.align {
        let mobile_selection = parse(&options.mobile_selection)?;
        let target_selection = parse(&options.target_selection)?;
        let (sequence1, trace1) = sequence_trace(mobile, &mobile_selection);
        let (sequence2, trace2) = sequence_trace(target, &target_selection);

        let alignment = aligner.align(&sequence1, &sequence2)?;
        debug!(
            score = alignment.score,
            identity = alignment.identity(),
            "Aligned {} against {}",
            mobile.name,
            target.name
        );
        let pairs: Vec<_> = alignment
            .matched_pairs()
            .map(|(i, j)| (trace1[i], trace2[j]))
            .collect();
        (pairs, Some(alignment))
    } else {
        let mobile_atoms = mobile.atom_indices(Some(&parse_ca(&options.mobile_selection)?));
        let target_atoms = target.atom_indices(Some(&parse_ca(&options.target_selection)?));
        if mobile_atoms.len() != target_atoms.len() {
            return Err(superposition::SuperpositionError::LengthMismatch {
                mobile: mobile_atoms.len(),
                target: target_atoms.len(),
            }
            .into());
        }
        (mobile_atoms.into_iter().zip(target_atoms).collect::<Vec<_>>(), None)
    };

    if !options.mobile_filter.is_empty() && !options.target_filter.is_empty() {
        let filter1 = parse(&options.mobile_filter)?;
        let filter2 = parse(&options.target_filter)?;
        let before = pairs.len();
        pairs.retain(|&(a1, a2)| {
            passes(&filter1, &AtomHandle::new(&*mobile, a1))
                && passes(&filter2, &AtomHandle::new(target, a2))
        });
        debug!(before, after = pairs.len(), "Filtered matched atoms");
    }

    let mobile_points: Vec<Point3<f64>> =
        pairs.iter().map(|&(a, _)| mobile.atom(a).position()).collect();
    let target_points: Vec<Point3<f64>> =
        pairs.iter().map(|&(_, b)| target.atom(b).position()).collect();
    let superposition = superposition::superpose(&mobile_points, &target_points)?;

    mobile.transform_positions(|p| superposition.transform_point(p));
    mobile.refresh_geometry();
    reporter.report(Progress::PhaseFinish);

    info!(
        pairs = superposition.pair_count,
        rmsd_before = superposition.rmsd_before,
        rmsd_after = superposition.rmsd_after,
        "Superposed {} onto {}.",
        mobile.name,
        target.name
    );
    Ok(SuperposeReport {
        superposition,
        alignment,
        pairs,
    })
}

fn parse(string: &str) -> Result<Selection, EngineError> {
    let selection = Selection::new(string);
    match selection.error() {
        Some(error) => Err(EngineError::Selection {
            selection: string.to_string(),
            source: error.clone(),
        }),
        None => Ok(selection),
    }
}

fn parse_ca(string: &str) -> Result<Selection, EngineError> {
    parse(string)?;
    Ok(Selection::with_extra(string, ".CA"))
}

fn passes(selection: &Selection, atom: &AtomHandle) -> bool {
    selection.atom_test().is_none_or(|test| test.passes(atom))
}

/// One-letter sequence and `CA` atom of every selected residue that has a
/// `CA`, in the same order.
fn sequence_trace(structure: &Structure, selection: &Selection) -> (String, Vec<AtomIndex>) {
    let mut sequence = String::new();
    let mut trace = Vec::new();
    structure.each_residue(Some(selection), |residue| {
        if let Some(ca) = residue.atom_by_name("CA") {
            sequence.push(residue.one_letter_code());
            trace.push(ca);
        }
    });
    (sequence, trace)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::atom::AtomRecord;
    use crate::core::utils::geometry::calculate_rmsd;
    use crate::core::utils::superposition::SuperpositionError;
    use crate::engine::tasks::fixtures;
    use nalgebra::{Rotation3, Vector3};

    const NAMES: [&str; 10] = ["MET", "LYS", "THR", "ALA", "TYR", "ILE", "GLN", "ARG", "TRP", "HIS"];

    fn named_helix() -> Vec<AtomRecord> {
        let mut records = fixtures::backbone_records("A", 1, &fixtures::helix_trace(10));
        for record in &mut records {
            record.residue_name = NAMES[(record.residue_number - 1) as usize].to_string();
        }
        records
    }

    fn moved(records: &[AtomRecord]) -> Vec<AtomRecord> {
        let rotation = Rotation3::from_axis_angle(&Vector3::x_axis(), 0.8)
            * Rotation3::from_axis_angle(&Vector3::z_axis(), -1.1);
        let shift = Vector3::new(12.0, -3.0, 7.5);
        records
            .iter()
            .map(|record| {
                let p = Point3::new(record.x as f64, record.y as f64, record.z as f64);
                let q = rotation * p + shift;
                AtomRecord {
                    x: q.x as f32,
                    y: q.y as f32,
                    z: q.z as f32,
                    ..record.clone()
                }
            })
            .collect()
    }

    fn superpose_records(
        mobile: &[AtomRecord],
        target: &[AtomRecord],
        options: &SuperposeOptions,
    ) -> (Structure, Structure, Result<SuperposeReport, EngineError>) {
        let mut mobile = fixtures::build(mobile);
        let target = fixtures::build(target);
        let result = run(
            &mut mobile,
            &target,
            options,
            &Aligner::default(),
            &ProgressReporter::new(),
        );
        (mobile, target, result)
    }

    fn max_deviation(a: &Structure, b: &Structure) -> f64 {
        a.atoms()
            .zip(b.atoms())
            .map(|(x, y)| nalgebra::distance(&x.position(), &y.position()))
            .fold(0.0, f64::max)
    }

    #[test]
    fn direct_pairing_restores_a_moved_copy() {
        let target = named_helix();
        let (mobile, target, result) =
            superpose_records(&moved(&target), &target, &SuperposeOptions::default());
        let report = result.unwrap();

        assert_eq!(report.pairs.len(), 10);
        assert!(report.alignment.is_none());
        assert!(report.superposition.rmsd_before > 1.0);
        assert!(report.superposition.rmsd_after < 1e-3);
        assert!(max_deviation(&mobile, &target) < 1e-3);
        assert!(nalgebra::distance(&mobile.center(), &target.center()) < 1e-3);
    }

    #[test]
    fn undoing_the_fit_restores_the_mobile_structure() {
        let target = named_helix();
        let mobile_records: Vec<_> = moved(&target)
            .into_iter()
            .enumerate()
            .map(|(i, record)| AtomRecord {
                x: record.x + 0.04 * (i % 3) as f32,
                ..record
            })
            .collect();
        let (mut mobile, _, result) =
            superpose_records(&mobile_records, &target, &SuperposeOptions::default());
        let report = result.unwrap();
        assert!(report.superposition.rmsd_after > 1e-3);

        let inverse = report.superposition.inverse();
        mobile.transform_positions(|p| inverse.transform_point(p));
        let original = fixtures::build(&mobile_records);
        assert!(max_deviation(&mobile, &original) < 1e-4);

        let matched = |structure: &Structure| -> Vec<Point3<f64>> {
            report
                .pairs
                .iter()
                .map(|&(a, _)| structure.atom(a).position())
                .collect()
        };
        assert!(calculate_rmsd(&matched(&mobile), &matched(&original)).unwrap() < 1e-4);
    }

    #[test]
    fn aligned_pairing_skips_the_inserted_residue() {
        let target = named_helix();
        let mobile: Vec<_> = moved(&target)
            .into_iter()
            .filter(|record| record.residue_number != 6)
            .collect();
        let options = SuperposeOptions {
            align: true,
            ..SuperposeOptions::default()
        };
        let (_, _, result) = superpose_records(&mobile, &target, &options);
        let report = result.unwrap();

        let alignment = report.alignment.as_ref().unwrap();
        assert_eq!(alignment.aligned1, "MKTAY-QRWH");
        assert_eq!(alignment.aligned2, "MKTAYIQRWH");
        assert_eq!(report.pairs.len(), 9);
        assert!(report.superposition.rmsd_after < 1e-3);
    }

    #[test]
    fn filters_keep_only_pairs_passing_both() {
        let target = named_helix();
        let options = SuperposeOptions {
            mobile_filter: "1-4".to_string(),
            target_filter: "1-5".to_string(),
            ..SuperposeOptions::default()
        };
        let (_, _, result) = superpose_records(&moved(&target), &target, &options);
        assert_eq!(result.unwrap().superposition.pair_count, 4);
    }

    #[test]
    fn too_few_pairs_leave_the_mobile_structure_in_place() {
        let target = named_helix();
        let mobile_records = moved(&target);
        let options = SuperposeOptions {
            mobile_selection: "1-2".to_string(),
            target_selection: "1-2".to_string(),
            ..SuperposeOptions::default()
        };
        let (mobile, _, result) = superpose_records(&mobile_records, &target, &options);

        assert!(matches!(
            result,
            Err(EngineError::Superposition {
                source: SuperpositionError::TooFewPairs { found: 2 }
            })
        ));
        assert!(max_deviation(&mobile, &fixtures::build(&mobile_records)) < 1e-9);
    }

    #[test]
    fn unequal_direct_selections_are_a_length_mismatch() {
        let target = named_helix();
        let options = SuperposeOptions {
            mobile_selection: "1-5".to_string(),
            ..SuperposeOptions::default()
        };
        let (_, _, result) = superpose_records(&moved(&target), &target, &options);
        assert!(matches!(
            result,
            Err(EngineError::Superposition {
                source: SuperpositionError::LengthMismatch { mobile: 5, target: 10 }
            })
        ));
    }

    #[test]
    fn invalid_selections_are_reported() {
        let target = named_helix();
        let options = SuperposeOptions {
            mobile_selection: "1-2-3".to_string(),
            ..SuperposeOptions::default()
        };
        let (_, _, result) = superpose_records(&moved(&target), &target, &options);
        assert!(matches!(result, Err(EngineError::Selection { .. })));
    }
}
