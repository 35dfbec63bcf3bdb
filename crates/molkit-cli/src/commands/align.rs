use crate::cli::{AlignArgs, MatrixChoice};
use crate::error::Result;
use molkit::core::align::{Aligner, Alignment, SubstitutionMatrix};
use molkit::engine::config::ProcessingConfig;
use molkit::engine::error::EngineError;
use tracing::info;

pub fn run(args: AlignArgs, config: &ProcessingConfig) -> Result<()> {
    let aligner = aligner_for(&args, config);
    let alignment = aligner.align(&args.seq1, &args.seq2).map_err(EngineError::from)?;
    info!(
        score = alignment.score,
        columns = alignment.len(),
        "Aligned sequences of length {} and {}.",
        args.seq1.len(),
        args.seq2.len()
    );
    println!("{}", render(&alignment));
    Ok(())
}

/// The configured aligner with any command-line overrides applied.
fn aligner_for(args: &AlignArgs, config: &ProcessingConfig) -> Aligner {
    let base = config.alignment;
    let matrix = match args.matrix {
        Some(MatrixChoice::Blosum62) => SubstitutionMatrix::Blosum62,
        Some(MatrixChoice::Identity) => SubstitutionMatrix::Identity,
        None => base.matrix,
    };
    Aligner::new(
        matrix,
        args.gap_open.unwrap_or(base.gap_open),
        args.gap_extend.unwrap_or(base.gap_extend),
    )
}

pub fn render(alignment: &Alignment) -> String {
    let midline: String = alignment
        .aligned1
        .chars()
        .zip(alignment.aligned2.chars())
        .map(|(a, b)| if a == b && a != '-' { '|' } else { ' ' })
        .collect();
    format!(
        "score: {}\nidentity: {:.1}%\n\n{}\n{}\n{}",
        alignment.score,
        alignment.identity() * 100.0,
        alignment.aligned1,
        midline,
        alignment.aligned2
    )
}
