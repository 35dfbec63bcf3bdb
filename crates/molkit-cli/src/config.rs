use crate::error::{CliError, Result};
use molkit::core::align::SubstitutionMatrix;
use molkit::engine::config::{ProcessingConfig, ProcessingConfigBuilder};
use serde::Deserialize;
use std::path::Path;
use std::str::FromStr;
use tracing::debug;

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
struct PartialBondingConfig {
    tolerance: Option<f64>,
    #[serde(rename = "coarse-grained-cutoff-sq")]
    coarse_grained_cutoff_sq: Option<f64>,
    #[serde(rename = "duplicate-cutoff-sq")]
    duplicate_cutoff_sq: Option<f64>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
struct PartialSecondaryStructureConfig {
    #[serde(rename = "helix-distances")]
    helix_distances: Option<[f64; 3]>,
    #[serde(rename = "helix-tolerance")]
    helix_tolerance: Option<f64>,
    #[serde(rename = "sheet-distances")]
    sheet_distances: Option<[f64; 3]>,
    #[serde(rename = "sheet-tolerance")]
    sheet_tolerance: Option<f64>,
    #[serde(rename = "min-fiber-length")]
    min_fiber_length: Option<usize>,
    #[serde(rename = "center-distance-range")]
    center_distance_range: Option<(f64, f64)>,
    #[serde(rename = "max-bending-degrees")]
    max_bending_degrees: Option<f64>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
struct PartialAlignmentConfig {
    matrix: Option<SubstitutionMatrix>,
    #[serde(rename = "gap-open")]
    gap_open: Option<i32>,
    #[serde(rename = "gap-extend")]
    gap_extend: Option<i32>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
struct PartialStorageConfig {
    #[serde(rename = "packed-threshold")]
    packed_threshold: Option<usize>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
struct PartialBatchingConfig {
    #[serde(rename = "batch-size")]
    batch_size: Option<usize>,
}

/// The configuration file as written by the user: every key optional.
///
/// Keys left out fall back to [`ProcessingConfig::default`].
#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
pub struct PartialProcessingConfig {
    bonding: Option<PartialBondingConfig>,
    #[serde(rename = "secondary-structure")]
    secondary_structure: Option<PartialSecondaryStructureConfig>,
    alignment: Option<PartialAlignmentConfig>,
    storage: Option<PartialStorageConfig>,
    batching: Option<PartialBatchingConfig>,
}

impl PartialProcessingConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })
    }

    /// Reads `path` when given, otherwise starts from an empty file.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    /// Applies `-S KEY=VALUE` overrides on top of the file values and
    /// validates the result.
    pub fn merge_with_cli(mut self, set_values: &[String]) -> Result<ProcessingConfig> {
        self.apply_set_values(set_values)?;

        let mut builder = ProcessingConfigBuilder::from(ProcessingConfig::default());

        if let Some(bonding) = self.bonding {
            if let Some(v) = bonding.tolerance {
                builder = builder.bond_tolerance(v);
            }
            if let Some(v) = bonding.coarse_grained_cutoff_sq {
                builder = builder.coarse_grained_cutoff_sq(v);
            }
            if let Some(v) = bonding.duplicate_cutoff_sq {
                builder = builder.duplicate_cutoff_sq(v);
            }
        }
        if let Some(ss) = self.secondary_structure {
            if let Some(v) = ss.helix_distances {
                builder = builder.helix_distances(v);
            }
            if let Some(v) = ss.helix_tolerance {
                builder = builder.helix_tolerance(v);
            }
            if let Some(v) = ss.sheet_distances {
                builder = builder.sheet_distances(v);
            }
            if let Some(v) = ss.sheet_tolerance {
                builder = builder.sheet_tolerance(v);
            }
            if let Some(v) = ss.min_fiber_length {
                builder = builder.min_fiber_length(v);
            }
            if let Some((low, high)) = ss.center_distance_range {
                builder = builder.center_distance_range(low, high);
            }
            if let Some(v) = ss.max_bending_degrees {
                builder = builder.max_bending_degrees(v);
            }
        }
        if let Some(alignment) = self.alignment {
            if let Some(v) = alignment.matrix {
                builder = builder.substitution_matrix(v);
            }
            if let Some(v) = alignment.gap_open {
                builder = builder.gap_open(v);
            }
            if let Some(v) = alignment.gap_extend {
                builder = builder.gap_extend(v);
            }
        }
        if let Some(v) = self.storage.and_then(|s| s.packed_threshold) {
            builder = builder.packed_threshold(v);
        }
        if let Some(v) = self.batching.and_then(|b| b.batch_size) {
            builder = builder.batch_size(v);
        }

        builder.build().map_err(|e| CliError::Config(e.to_string()))
    }

    fn apply_set_values(&mut self, set_values: &[String]) -> Result<()> {
        for kv_pair in set_values {
            let Some((key, value_str)) = kv_pair.split_once('=') else {
                return Err(CliError::Config(format!(
                    "Invalid --set format: '{}'. Expected KEY=VALUE.",
                    kv_pair
                )));
            };

            match key {
                "bonding.tolerance" => {
                    self.bonding.get_or_insert_with(Default::default).tolerance =
                        Some(parse_value(key, value_str)?);
                }
                "secondary-structure.helix-tolerance" => {
                    self.secondary_structure
                        .get_or_insert_with(Default::default)
                        .helix_tolerance = Some(parse_value(key, value_str)?);
                }
                "secondary-structure.sheet-tolerance" => {
                    self.secondary_structure
                        .get_or_insert_with(Default::default)
                        .sheet_tolerance = Some(parse_value(key, value_str)?);
                }
                "secondary-structure.min-fiber-length" => {
                    self.secondary_structure
                        .get_or_insert_with(Default::default)
                        .min_fiber_length = Some(parse_value(key, value_str)?);
                }
                "secondary-structure.max-bending-degrees" => {
                    self.secondary_structure
                        .get_or_insert_with(Default::default)
                        .max_bending_degrees = Some(parse_value(key, value_str)?);
                }
                "alignment.matrix" => {
                    let matrix = match value_str {
                        "blosum62" => SubstitutionMatrix::Blosum62,
                        "identity" => SubstitutionMatrix::Identity,
                        _ => {
                            return Err(CliError::Config(format!(
                                "Invalid value for {}: {} (expected 'blosum62' or 'identity')",
                                key, value_str
                            )));
                        }
                    };
                    self.alignment.get_or_insert_with(Default::default).matrix = Some(matrix);
                }
                "alignment.gap-open" => {
                    self.alignment.get_or_insert_with(Default::default).gap_open =
                        Some(parse_value(key, value_str)?);
                }
                "alignment.gap-extend" => {
                    self.alignment.get_or_insert_with(Default::default).gap_extend =
                        Some(parse_value(key, value_str)?);
                }
                "storage.packed-threshold" => {
                    self.storage
                        .get_or_insert_with(Default::default)
                        .packed_threshold = Some(parse_value(key, value_str)?);
                }
                "batching.batch-size" => {
                    self.batching.get_or_insert_with(Default::default).batch_size =
                        Some(parse_value(key, value_str)?);
                }
                _ => {
                    return Err(CliError::Config(format!(
                        "Unsupported configuration key for --set: '{}'",
                        key
                    )));
                }
            }
        }
        Ok(())
    }
}

fn parse_value<T: FromStr>(key: &str, value_str: &str) -> Result<T> {
    value_str.trim().parse().map_err(|_| {
        CliError::Config(format!("Invalid value for {}: {}", key, value_str))
    })
}
