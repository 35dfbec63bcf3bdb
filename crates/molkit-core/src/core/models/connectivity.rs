use super::atom::AtomView;

/// Slack added to the summed covalent radii before comparing distances.
pub const DEFAULT_BOND_TOLERANCE: f64 = 0.3;
/// Squared distance under which two coarse-grained beads count as bonded.
pub const DEFAULT_COARSE_GRAINED_CUTOFF_SQ: f64 = 28.0;
/// Squared distance under which two atoms are treated as duplicates.
pub const DEFAULT_DUPLICATE_CUTOFF_SQ: f64 = 0.5;

/// Distance rules deciding whether two atoms are covalently connected.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConnectivityCriteria {
    pub tolerance: f64,
    pub coarse_grained_cutoff_sq: f64,
    pub duplicate_cutoff_sq: f64,
}

impl Default for ConnectivityCriteria {
    fn default() -> Self {
        Self {
            tolerance: DEFAULT_BOND_TOLERANCE,
            coarse_grained_cutoff_sq: DEFAULT_COARSE_GRAINED_CUTOFF_SQ,
            duplicate_cutoff_sq: DEFAULT_DUPLICATE_CUTOFF_SQ,
        }
    }
}

impl ConnectivityCriteria {
    /// Tests whether `a` and `b` are close enough to be bonded.
    ///
    /// `coarse_grained` reports whether `a` belongs to a coarse-grained
    /// residue, which switches to the flat bead cutoff. Conflicting alt-locs,
    /// non-finite positions and near-duplicate positions are never connected.
    pub fn connected(&self, a: &dyn AtomView, b: &dyn AtomView, coarse_grained: bool) -> bool {
        if !a.has_compatible_alt_loc(b) {
            return false;
        }

        let d2 = a.distance_squared(b);
        if coarse_grained && d2 < self.coarse_grained_cutoff_sq {
            return true;
        }
        if d2.is_nan() || d2 < self.duplicate_cutoff_sq {
            return false;
        }

        let reach = a.covalent_radius() as f64 + b.covalent_radius() as f64 + self.tolerance;
        d2 < reach * reach
    }
}
