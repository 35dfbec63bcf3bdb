use crate::cli::SuperposeArgs;
use crate::error::Result;
use crate::input;
use crate::utils::progress::CliProgressHandler;
use molkit::core::models::ids::GlobalIndexAllocator;
use molkit::engine::config::ProcessingConfig;
use molkit::engine::progress::ProgressReporter;
use molkit::workflows::superpose::{self, SuperposeOptions, SuperposeReport};
use std::fmt::Write;

pub fn run(args: SuperposeArgs, config: &ProcessingConfig, progress: &CliProgressHandler) -> Result<()> {
    let reporter = ProgressReporter::with_callback(progress.callback());
    // Both structures share one allocator so their global indices stay distinct.
    let mut allocator = GlobalIndexAllocator::new();
    let mut mobile = input::load_structure_from(&args.mobile, None, config, &mut allocator, &reporter)?;
    let target = input::load_structure_from(&args.target, None, config, &mut allocator, &reporter)?;

    let options = options_from(&args);
    let report = superpose::run(&mut mobile, &target, &options, &config.alignment, &reporter)?;
    println!("{}", render(&report));

    if let Some(output) = &args.output {
        input::write_records(&mobile, output)?;
    }
    Ok(())
}

fn options_from(args: &SuperposeArgs) -> SuperposeOptions {
    SuperposeOptions {
        align: args.align,
        mobile_selection: args.mobile_selection.clone(),
        target_selection: args.target_selection.clone(),
        mobile_filter: args.mobile_filter.clone().unwrap_or_default(),
        target_filter: args.target_filter.clone().unwrap_or_default(),
    }
}

/// Pair count, RMSD before and after, and the 4x4 transform applied to the
/// mobile structure.
pub fn render(report: &SuperposeReport) -> String {
    let fit = &report.superposition;
    let mut out = String::new();
    if let Some(alignment) = &report.alignment {
        let _ = writeln!(
            out,
            "alignment score: {}\n{}\n{}",
            alignment.score, alignment.aligned1, alignment.aligned2
        );
    }
    let _ = writeln!(out, "pairs: {}", fit.pair_count);
    let _ = writeln!(out, "rmsd before: {:.4}", fit.rmsd_before);
    let _ = writeln!(out, "rmsd after: {:.4}", fit.rmsd_after);
    let _ = write!(out, "transform:");
    let matrix = fit.to_homogeneous();
    for row in matrix.row_iter() {
        let _ = write!(
            out,
            "\n  {:>10.5} {:>10.5} {:>10.5} {:>10.5}",
            row[0], row[1], row[2], row[3]
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use molkit::core::utils::superposition::Superposition;
    use nalgebra::{Matrix3, Point3};

    fn identity_report() -> SuperposeReport {
        SuperposeReport {
            superposition: Superposition {
                rotation: Matrix3::identity(),
                mobile_centroid: Point3::new(1.0, 0.0, 0.0),
                target_centroid: Point3::new(0.0, 0.0, 0.0),
                rmsd_before: 1.0,
                rmsd_after: 0.0,
                pair_count: 3,
            },
            alignment: None,
            pairs: Vec::new(),
        }
    }

    #[test]
    fn rendering_shows_rmsd_and_translation() {
        let text = render(&identity_report());
        assert!(text.contains("pairs: 3"));
        assert!(text.contains("rmsd before: 1.0000"));
        assert!(text.contains("rmsd after: 0.0000"));
        let rows: Vec<&str> = text.lines().skip_while(|l| *l != "transform:").skip(1).collect();
        assert_eq!(rows.len(), 4);
        assert!(rows[0].trim_end().ends_with("-1.00000"));
        assert!(rows[3].trim_end().ends_with("1.00000"));
    }

    #[test]
    fn filters_default_to_empty() {
        let args = SuperposeArgs {
            mobile: "a.csv".into(),
            target: "b.csv".into(),
            align: true,
            mobile_selection: ":A".to_string(),
            target_selection: String::new(),
            mobile_filter: None,
            target_filter: None,
            output: None,
        };
        let options = options_from(&args);
        assert!(options.align);
        assert_eq!(options.mobile_selection, ":A");
        assert!(options.mobile_filter.is_empty() && options.target_filter.is_empty());
    }
}
