use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    version,
    about = "molkit - query, post-process and superpose molecular structures from atom-record tables.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Processing configuration in TOML format
    #[arg(short, long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Set a specific configuration value, overriding the config file.
    /// Can be used multiple times. Example: -S secondary-structure.helix-tolerance=1.5
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE", num_args(0..), global = true)]
    pub set_values: Vec<String>,

    /// Set the number of threads for parallel computation.
    /// Defaults to the number of available logical cores.
    #[arg(short = 'j', long, global = true, value_name = "NUM")]
    pub threads: Option<usize>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the atoms of a structure matching a selection.
    Select(SelectArgs),
    /// Parse a selection and print its rule tree.
    Parse(ParseArgs),
    /// Summarize a structure: counts, chains, sequence and secondary structure.
    Inspect(InspectArgs),
    /// Globally align two one-letter sequences.
    Align(AlignArgs),
    /// Superpose one structure onto another and report the RMSD.
    Superpose(SuperposeArgs),
}

/// Options shared by every command that reads a structure.
#[derive(Args, Debug, Clone)]
pub struct StructureArgs {
    /// CSV table of atom records, one row per atom, with a header row.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub input: PathBuf,

    /// Optional CSV table of explicit bonds (`serial1,serial2,order`).
    #[arg(long, value_name = "PATH")]
    pub bonds: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct SelectArgs {
    #[command(flatten)]
    pub structure: StructureArgs,

    /// Selection string, e.g. "10-15 or backbone and 30-35".
    #[arg(required = true)]
    pub selection: String,

    /// Print only the number of matching atoms, residues and bonds.
    #[arg(long)]
    pub count: bool,
}

#[derive(Args, Debug)]
pub struct ParseArgs {
    /// Selection string to parse.
    #[arg(required = true)]
    pub selection: String,
}

#[derive(Args, Debug)]
pub struct InspectArgs {
    #[command(flatten)]
    pub structure: StructureArgs,

    /// Restrict the summary to a selection.
    #[arg(short, long, value_name = "SELECTION")]
    pub selection: Option<String>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum MatrixChoice {
    Blosum62,
    Identity,
}

#[derive(Args, Debug)]
pub struct AlignArgs {
    #[arg(required = true)]
    pub seq1: String,

    #[arg(required = true)]
    pub seq2: String,

    /// Override the gap-open penalty (a negative score).
    #[arg(long, value_name = "INT", allow_hyphen_values = true)]
    pub gap_open: Option<i32>,

    /// Override the gap-extension penalty (a negative score).
    #[arg(long, value_name = "INT", allow_hyphen_values = true)]
    pub gap_extend: Option<i32>,

    /// Override the substitution matrix.
    #[arg(long, value_enum)]
    pub matrix: Option<MatrixChoice>,
}

#[derive(Args, Debug)]
pub struct SuperposeArgs {
    /// Structure to move.
    #[arg(long, required = true, value_name = "PATH")]
    pub mobile: PathBuf,

    /// Structure to superpose onto.
    #[arg(long, required = true, value_name = "PATH")]
    pub target: PathBuf,

    /// Pair CA atoms through a sequence alignment instead of in order.
    #[arg(long)]
    pub align: bool,

    #[arg(long, value_name = "SELECTION", default_value = "")]
    pub mobile_selection: String,

    #[arg(long, value_name = "SELECTION", default_value = "")]
    pub target_selection: String,

    /// Keep only pairs whose mobile atom matches; needs --target-filter too.
    #[arg(long, value_name = "SELECTION", requires = "target_filter")]
    pub mobile_filter: Option<String>,

    /// Keep only pairs whose target atom matches; needs --mobile-filter too.
    #[arg(long, value_name = "SELECTION", requires = "mobile_filter")]
    pub target_filter: Option<String>,

    /// Write the moved mobile atoms to this CSV file.
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn global_flags_are_accepted_after_the_subcommand() {
        let cli = Cli::parse_from([
            "molkit", "parse", "10-15", "-vv", "-S", "batching.batch-size=5",
        ]);
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.set_values, vec!["batching.batch-size=5"]);
        assert!(matches!(cli.command, Commands::Parse(ParseArgs { ref selection }) if selection == "10-15"));
    }

    #[test]
    fn quiet_conflicts_with_verbose() {
        let result = Cli::try_parse_from(["molkit", "-q", "-v", "parse", "CA"]);
        assert!(result.is_err());
    }

    #[test]
    fn align_accepts_negative_penalties() {
        let cli = Cli::parse_from([
            "molkit", "align", "ACDE", "ACE", "--gap-open", "-8", "--matrix", "identity",
        ]);
        let Commands::Align(args) = cli.command else {
            panic!("expected align");
        };
        assert_eq!(args.gap_open, Some(-8));
        assert_eq!(args.matrix, Some(MatrixChoice::Identity));
    }

    #[test]
    fn superpose_filters_come_in_pairs() {
        let result = Cli::try_parse_from([
            "molkit", "superpose", "--mobile", "a.csv", "--target", "b.csv",
            "--mobile-filter", "1-10",
        ]);
        assert!(result.is_err());
    }
}
