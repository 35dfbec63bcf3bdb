use crate::core::align::{Aligner, SubstitutionMatrix};
use crate::core::models::array::DEFAULT_PACKED_THRESHOLD;
use crate::core::models::connectivity::{
    ConnectivityCriteria, DEFAULT_BOND_TOLERANCE, DEFAULT_COARSE_GRAINED_CUTOFF_SQ,
    DEFAULT_DUPLICATE_CUTOFF_SQ,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_HELIX_DISTANCES: [f64; 3] = [5.45, 5.18, 6.37];
pub const DEFAULT_HELIX_TOLERANCE: f64 = 2.1;
pub const DEFAULT_SHEET_DISTANCES: [f64; 3] = [6.1, 10.4, 13.0];
pub const DEFAULT_SHEET_TOLERANCE: f64 = 1.42;
pub const DEFAULT_MIN_FIBER_LENGTH: usize = 4;
pub const DEFAULT_CENTER_DISTANCE_RANGE: (f64, f64) = (1.0, 2.0);
pub const DEFAULT_MAX_BENDING_DEGREES: f64 = 20.0;
pub const DEFAULT_BATCH_SIZE: usize = 10_000;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),

    #[error("Invalid value for '{key}': {reason}")]
    InvalidValue { key: &'static str, reason: String },

    #[error("Failed to parse configuration: {0}")]
    Parse(String),
}

/// Distance rules for bond perception.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct BondingConfig {
    pub tolerance: f64,
    pub coarse_grained_cutoff_sq: f64,
    pub duplicate_cutoff_sq: f64,
}

impl Default for BondingConfig {
    fn default() -> Self {
        Self {
            tolerance: DEFAULT_BOND_TOLERANCE,
            coarse_grained_cutoff_sq: DEFAULT_COARSE_GRAINED_CUTOFF_SQ,
            duplicate_cutoff_sq: DEFAULT_DUPLICATE_CUTOFF_SQ,
        }
    }
}

impl BondingConfig {
    pub fn criteria(&self) -> ConnectivityCriteria {
        ConnectivityCriteria {
            tolerance: self.tolerance,
            coarse_grained_cutoff_sq: self.coarse_grained_cutoff_sq,
            duplicate_cutoff_sq: self.duplicate_cutoff_sq,
        }
    }
}

/// Reference geometry for the automatic secondary-structure assignment.
///
/// `helix_distances` and `sheet_distances` are the expected trace-atom
/// distances between residues `i` and `i + 2`, `i + 3`, `i + 4`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct SecondaryStructureConfig {
    pub helix_distances: [f64; 3],
    pub helix_tolerance: f64,
    pub sheet_distances: [f64; 3],
    pub sheet_tolerance: f64,
    pub min_fiber_length: usize,
    pub center_distance_range: (f64, f64),
    pub max_bending_degrees: f64,
}

impl Default for SecondaryStructureConfig {
    fn default() -> Self {
        Self {
            helix_distances: DEFAULT_HELIX_DISTANCES,
            helix_tolerance: DEFAULT_HELIX_TOLERANCE,
            sheet_distances: DEFAULT_SHEET_DISTANCES,
            sheet_tolerance: DEFAULT_SHEET_TOLERANCE,
            min_fiber_length: DEFAULT_MIN_FIBER_LENGTH,
            center_distance_range: DEFAULT_CENTER_DISTANCE_RANGE,
            max_bending_degrees: DEFAULT_MAX_BENDING_DEGREES,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct StorageConfig {
    /// Structures with more atoms than this use packed storage.
    pub packed_threshold: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            packed_threshold: DEFAULT_PACKED_THRESHOLD,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct BatchConfig {
    pub batch_size: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

/// Every tunable of structure assembly and post-processing.
///
/// Loaded from TOML with kebab-case keys; sections that are left out keep
/// their defaults.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct ProcessingConfig {
    pub bonding: BondingConfig,
    pub secondary_structure: SecondaryStructureConfig,
    pub alignment: Aligner,
    pub storage: StorageConfig,
    pub batching: BatchConfig,
}

impl ProcessingConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        non_negative("bonding.tolerance", self.bonding.tolerance)?;
        non_negative(
            "bonding.coarse-grained-cutoff-sq",
            self.bonding.coarse_grained_cutoff_sq,
        )?;
        non_negative("bonding.duplicate-cutoff-sq", self.bonding.duplicate_cutoff_sq)?;

        let ss = &self.secondary_structure;
        for (key, distances) in [
            ("secondary-structure.helix-distances", ss.helix_distances),
            ("secondary-structure.sheet-distances", ss.sheet_distances),
        ] {
            for d in distances {
                non_negative(key, d)?;
            }
        }
        non_negative("secondary-structure.helix-tolerance", ss.helix_tolerance)?;
        non_negative("secondary-structure.sheet-tolerance", ss.sheet_tolerance)?;
        non_negative("secondary-structure.max-bending-degrees", ss.max_bending_degrees)?;
        let (low, high) = ss.center_distance_range;
        if !(low.is_finite() && high.is_finite() && low < high) {
            return Err(ConfigError::InvalidValue {
                key: "secondary-structure.center-distance-range",
                reason: format!("expected an increasing pair, got ({low}, {high})"),
            });
        }
        if ss.min_fiber_length == 0 {
            return Err(ConfigError::InvalidValue {
                key: "secondary-structure.min-fiber-length",
                reason: "must be at least 1".to_string(),
            });
        }

        if self.alignment.gap_open > 0 || self.alignment.gap_extend > 0 {
            return Err(ConfigError::InvalidValue {
                key: "alignment",
                reason: "gap penalties are scores and must not be positive".to_string(),
            });
        }
        if self.batching.batch_size == 0 {
            return Err(ConfigError::InvalidValue {
                key: "batching.batch-size",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

fn non_negative(key: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidValue {
            key,
            reason: format!("expected a finite non-negative number, got {value}"),
        })
    }
}

#[derive(Default)]
pub struct ProcessingConfigBuilder {
    bond_tolerance: Option<f64>,
    coarse_grained_cutoff_sq: Option<f64>,
    duplicate_cutoff_sq: Option<f64>,
    helix_distances: Option<[f64; 3]>,
    helix_tolerance: Option<f64>,
    sheet_distances: Option<[f64; 3]>,
    sheet_tolerance: Option<f64>,
    min_fiber_length: Option<usize>,
    center_distance_range: Option<(f64, f64)>,
    max_bending_degrees: Option<f64>,
    substitution_matrix: Option<SubstitutionMatrix>,
    gap_open: Option<i32>,
    gap_extend: Option<i32>,
    packed_threshold: Option<usize>,
    batch_size: Option<usize>,
}

impl ProcessingConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bond_tolerance(mut self, tolerance: f64) -> Self {
        self.bond_tolerance = Some(tolerance);
        self
    }
    pub fn coarse_grained_cutoff_sq(mut self, cutoff: f64) -> Self {
        self.coarse_grained_cutoff_sq = Some(cutoff);
        self
    }
    pub fn duplicate_cutoff_sq(mut self, cutoff: f64) -> Self {
        self.duplicate_cutoff_sq = Some(cutoff);
        self
    }
    pub fn helix_distances(mut self, distances: [f64; 3]) -> Self {
        self.helix_distances = Some(distances);
        self
    }
    pub fn helix_tolerance(mut self, tolerance: f64) -> Self {
        self.helix_tolerance = Some(tolerance);
        self
    }
    pub fn sheet_distances(mut self, distances: [f64; 3]) -> Self {
        self.sheet_distances = Some(distances);
        self
    }
    pub fn sheet_tolerance(mut self, tolerance: f64) -> Self {
        self.sheet_tolerance = Some(tolerance);
        self
    }
    pub fn min_fiber_length(mut self, length: usize) -> Self {
        self.min_fiber_length = Some(length);
        self
    }
    pub fn center_distance_range(mut self, low: f64, high: f64) -> Self {
        self.center_distance_range = Some((low, high));
        self
    }
    pub fn max_bending_degrees(mut self, degrees: f64) -> Self {
        self.max_bending_degrees = Some(degrees);
        self
    }
    pub fn substitution_matrix(mut self, matrix: SubstitutionMatrix) -> Self {
        self.substitution_matrix = Some(matrix);
        self
    }
    pub fn gap_open(mut self, penalty: i32) -> Self {
        self.gap_open = Some(penalty);
        self
    }
    pub fn gap_extend(mut self, penalty: i32) -> Self {
        self.gap_extend = Some(penalty);
        self
    }
    pub fn packed_threshold(mut self, threshold: usize) -> Self {
        self.packed_threshold = Some(threshold);
        self
    }
    pub fn batch_size(mut self, size: usize) -> Self {
        self.batch_size = Some(size);
        self
    }

    pub fn build(self) -> Result<ProcessingConfig, ConfigError> {
        let bonding = BondingConfig {
            tolerance: self
                .bond_tolerance
                .ok_or(ConfigError::MissingParameter("bond_tolerance"))?,
            coarse_grained_cutoff_sq: self
                .coarse_grained_cutoff_sq
                .ok_or(ConfigError::MissingParameter("coarse_grained_cutoff_sq"))?,
            duplicate_cutoff_sq: self
                .duplicate_cutoff_sq
                .ok_or(ConfigError::MissingParameter("duplicate_cutoff_sq"))?,
        };
        let secondary_structure = SecondaryStructureConfig {
            helix_distances: self
                .helix_distances
                .ok_or(ConfigError::MissingParameter("helix_distances"))?,
            helix_tolerance: self
                .helix_tolerance
                .ok_or(ConfigError::MissingParameter("helix_tolerance"))?,
            sheet_distances: self
                .sheet_distances
                .ok_or(ConfigError::MissingParameter("sheet_distances"))?,
            sheet_tolerance: self
                .sheet_tolerance
                .ok_or(ConfigError::MissingParameter("sheet_tolerance"))?,
            min_fiber_length: self
                .min_fiber_length
                .ok_or(ConfigError::MissingParameter("min_fiber_length"))?,
            center_distance_range: self
                .center_distance_range
                .ok_or(ConfigError::MissingParameter("center_distance_range"))?,
            max_bending_degrees: self
                .max_bending_degrees
                .ok_or(ConfigError::MissingParameter("max_bending_degrees"))?,
        };
        let alignment = Aligner {
            matrix: self
                .substitution_matrix
                .ok_or(ConfigError::MissingParameter("substitution_matrix"))?,
            gap_open: self
                .gap_open
                .ok_or(ConfigError::MissingParameter("gap_open"))?,
            gap_extend: self
                .gap_extend
                .ok_or(ConfigError::MissingParameter("gap_extend"))?,
        };
        let config = ProcessingConfig {
            bonding,
            secondary_structure,
            alignment,
            storage: StorageConfig {
                packed_threshold: self
                    .packed_threshold
                    .ok_or(ConfigError::MissingParameter("packed_threshold"))?,
            },
            batching: BatchConfig {
                batch_size: self
                    .batch_size
                    .ok_or(ConfigError::MissingParameter("batch_size"))?,
            },
        };
        config.validate()?;
        Ok(config)
    }
}

impl From<ProcessingConfig> for ProcessingConfigBuilder {
    fn from(config: ProcessingConfig) -> Self {
        let ss = config.secondary_structure;
        Self {
            bond_tolerance: Some(config.bonding.tolerance),
            coarse_grained_cutoff_sq: Some(config.bonding.coarse_grained_cutoff_sq),
            duplicate_cutoff_sq: Some(config.bonding.duplicate_cutoff_sq),
            helix_distances: Some(ss.helix_distances),
            helix_tolerance: Some(ss.helix_tolerance),
            sheet_distances: Some(ss.sheet_distances),
            sheet_tolerance: Some(ss.sheet_tolerance),
            min_fiber_length: Some(ss.min_fiber_length),
            center_distance_range: Some(ss.center_distance_range),
            max_bending_degrees: Some(ss.max_bending_degrees),
            substitution_matrix: Some(config.alignment.matrix),
            gap_open: Some(config.alignment.gap_open),
            gap_extend: Some(config.alignment.gap_extend),
            packed_threshold: Some(config.storage.packed_threshold),
            batch_size: Some(config.batching.batch_size),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_published_constants() {
        let config = ProcessingConfig::default();
        assert!((config.bonding.tolerance - 0.3).abs() < 1e-12);
        assert!((config.bonding.coarse_grained_cutoff_sq - 28.0).abs() < 1e-12);
        assert_eq!(config.secondary_structure.helix_distances, [5.45, 5.18, 6.37]);
        assert_eq!(config.secondary_structure.sheet_distances, [6.1, 10.4, 13.0]);
        assert_eq!(config.secondary_structure.min_fiber_length, 4);
        assert_eq!(config.alignment.gap_open, -10);
        assert_eq!(config.alignment.gap_extend, -1);
        assert_eq!(config.storage.packed_threshold, 1000);
        assert_eq!(config.batching.batch_size, 10_000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_toml_keeps_defaults_for_missing_keys() {
        let config = ProcessingConfig::from_toml_str(
            r#"
            [bonding]
            tolerance = 0.45

            [alignment]
            matrix = "identity"
            gap-open = -4

            [secondary-structure]
            center-distance-range = [0.5, 2.5]
            "#,
        )
        .unwrap();
        assert!((config.bonding.tolerance - 0.45).abs() < 1e-12);
        assert!((config.bonding.coarse_grained_cutoff_sq - 28.0).abs() < 1e-12);
        assert_eq!(config.alignment.matrix, SubstitutionMatrix::Identity);
        assert_eq!(config.alignment.gap_open, -4);
        assert_eq!(config.alignment.gap_extend, -1);
        assert_eq!(config.secondary_structure.center_distance_range, (0.5, 2.5));
        assert_eq!(config.batching.batch_size, 10_000);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let result = ProcessingConfig::from_toml_str("[bonding]\ntolerence = 0.4\n");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn invalid_values_are_reported_with_their_key() {
        let result = ProcessingConfig::from_toml_str("[batching]\nbatch-size = 0\n");
        assert_eq!(
            result,
            Err(ConfigError::InvalidValue {
                key: "batching.batch-size",
                reason: "must be at least 1".to_string(),
            })
        );

        let result = ProcessingConfig::from_toml_str("[alignment]\ngap-extend = 2\n");
        assert!(matches!(
            result,
            Err(ConfigError::InvalidValue { key: "alignment", .. })
        ));
    }

    #[test]
    fn builder_requires_every_parameter() {
        let result = ProcessingConfigBuilder::new().bond_tolerance(0.3).build();
        assert_eq!(
            result,
            Err(ConfigError::MissingParameter("coarse_grained_cutoff_sq"))
        );
    }

    #[test]
    fn builder_seeded_from_defaults_applies_overrides() {
        let config = ProcessingConfigBuilder::from(ProcessingConfig::default())
            .bond_tolerance(0.4)
            .batch_size(250)
            .center_distance_range(1.2, 1.8)
            .build()
            .unwrap();
        assert!((config.bonding.tolerance - 0.4).abs() < 1e-12);
        assert_eq!(config.batching.batch_size, 250);
        assert_eq!(config.secondary_structure.center_distance_range, (1.2, 1.8));
        assert_eq!(config.alignment, Aligner::default());
    }

    #[test]
    fn bonding_section_yields_matching_criteria() {
        let criteria = BondingConfig::default().criteria();
        assert_eq!(criteria, ConnectivityCriteria::default());
    }
}
