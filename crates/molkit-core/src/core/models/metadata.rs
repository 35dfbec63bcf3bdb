use nalgebra::{Matrix3, Matrix4, Point3};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Name of the assembly a structure displays unless told otherwise.
pub const DEFAULT_ASSEMBLY_NAME: &str = "BU1";

/// Crystallographic unit cell: edge lengths in Å, angles in degrees.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitCell {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub alpha: f64,
    pub beta: f64,
    pub gamma: f64,
    #[serde(default)]
    pub space_group: String,
}

impl Default for UnitCell {
    fn default() -> Self {
        Self {
            a: 1.0,
            b: 1.0,
            c: 1.0,
            alpha: 90.0,
            beta: 90.0,
            gamma: 90.0,
            space_group: "P 1".to_string(),
        }
    }
}

impl UnitCell {
    pub fn new(a: f64, b: f64, c: f64, alpha: f64, beta: f64, gamma: f64) -> Self {
        Self {
            a,
            b,
            c,
            alpha,
            beta,
            gamma,
            ..Self::default()
        }
    }

    pub fn with_space_group(mut self, space_group: &str) -> Self {
        self.space_group = space_group.to_string();
        self
    }

    pub fn volume(&self) -> f64 {
        let (ca, cb, cg) = (
            self.alpha.to_radians().cos(),
            self.beta.to_radians().cos(),
            self.gamma.to_radians().cos(),
        );
        self.a
            * self.b
            * self.c
            * (1.0 - ca * ca - cb * cb - cg * cg + 2.0 * ca * cb * cg).sqrt()
    }

    /// Maps fractional coordinates to Cartesian ones (a along x, b in the xy plane).
    pub fn fractional_to_cartesian(&self) -> Matrix3<f64> {
        let alpha = self.alpha.to_radians();
        let beta = self.beta.to_radians();
        let gamma = self.gamma.to_radians();
        let (sin_g, cos_g) = gamma.sin_cos();
        Matrix3::new(
            self.a,
            self.b * cos_g,
            self.c * beta.cos(),
            0.0,
            self.b * sin_g,
            self.c * (alpha.cos() - beta.cos() * cos_g) / sin_g,
            0.0,
            0.0,
            self.volume() / (self.a * self.b * sin_g),
        )
    }

    /// Inverse of [`fractional_to_cartesian`](Self::fractional_to_cartesian);
    /// `None` for a degenerate cell.
    pub fn cartesian_to_fractional(&self) -> Option<Matrix3<f64>> {
        self.fractional_to_cartesian().try_inverse()
    }

    pub fn to_cartesian(&self, fractional: &Point3<f64>) -> Point3<f64> {
        self.fractional_to_cartesian() * fractional
    }
}

/// A biological assembly: named transforms applied to a set of chains.
///
/// An empty chain list applies the transforms to every chain.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Assembly {
    pub name: String,
    pub transforms: BTreeMap<String, Matrix4<f64>>,
    pub chain_names: Vec<String>,
}

impl Assembly {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    pub fn add_transform(&mut self, name: &str, matrix: Matrix4<f64>) {
        self.transforms.insert(name.to_string(), matrix);
    }

    pub fn add_chain(&mut self, chain_name: &str) {
        if !self.chain_names.iter().any(|c| c == chain_name) {
            self.chain_names.push(chain_name.to_string());
        }
    }

    pub fn applies_to_chain(&self, chain_name: &str) -> bool {
        self.chain_names.is_empty() || self.chain_names.iter().any(|c| c == chain_name)
    }
}
