//! Rigid-body least-squares superposition of matched coordinate sets.

use super::geometry::{calculate_rmsd, centroid};
use nalgebra::{Matrix3, Matrix4, Point3, Translation3};
use thiserror::Error;

pub const MIN_SUPERPOSITION_PAIRS: usize = 3;

const DEGENERACY_TOLERANCE: f64 = 1e-10;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum SuperpositionError {
    #[error("Coordinate sets differ in length (mobile: {mobile}, target: {target})")]
    LengthMismatch { mobile: usize, target: usize },
    #[error("At least 3 matched pairs are required, found {found}")]
    TooFewPairs { found: usize },
    #[error("Coordinates contain non-finite values")]
    NonFiniteCoordinates,
    #[error("Coordinates are collinear or coincident; the rotation is undetermined")]
    Degenerate,
    #[error("Singular value decomposition of the covariance matrix failed")]
    SvdFailed,
}

/// The optimal rigid transform mapping a mobile set onto a target set.
///
/// A point `p` of the mobile frame maps to
/// `rotation * (p - mobile_centroid) + target_centroid`.
#[derive(Debug, Clone, PartialEq)]
pub struct Superposition {
    pub rotation: Matrix3<f64>,
    pub mobile_centroid: Point3<f64>,
    pub target_centroid: Point3<f64>,
    pub rmsd_before: f64,
    pub rmsd_after: f64,
    pub pair_count: usize,
}

impl Superposition {
    pub fn transform_point(&self, point: &Point3<f64>) -> Point3<f64> {
        self.target_centroid + self.rotation * (point - self.mobile_centroid)
    }

    /// The transform mapping the target frame back onto the mobile frame:
    /// `rotationᵀ * (p - target_centroid) + mobile_centroid`.
    pub fn inverse(&self) -> Self {
        Self {
            rotation: self.rotation.transpose(),
            mobile_centroid: self.target_centroid,
            target_centroid: self.mobile_centroid,
            rmsd_before: self.rmsd_after,
            rmsd_after: self.rmsd_before,
            pair_count: self.pair_count,
        }
    }

    /// The same transform as a single homogeneous 4×4 matrix.
    pub fn to_homogeneous(&self) -> Matrix4<f64> {
        let to_origin = Translation3::from(-self.mobile_centroid.coords).to_homogeneous();
        let to_target = Translation3::from(self.target_centroid.coords).to_homogeneous();
        to_target * self.rotation.to_homogeneous() * to_origin
    }
}

/// Computes the rotation and translation minimising the RMSD between
/// `mobile` and `target` (Kabsch).
///
/// Both sets are centred on their centroids, the 3×3 cross-covariance
/// `H = Σ (t - t̄)(m - m̄)ᵀ` is decomposed as `U·W·Vᵀ` and the rotation is
/// `R = U·Vᵀ`. A reflection (`det R < 0`) is corrected by negating the
/// singular vector of the smallest singular value.
///
/// # Errors
///
/// Returns [`SuperpositionError`] for mismatched or too-short inputs,
/// non-finite coordinates, collinear/coincident point sets, or an SVD that
/// does not converge.
pub fn superpose(
    mobile: &[Point3<f64>],
    target: &[Point3<f64>],
) -> Result<Superposition, SuperpositionError> {
    if mobile.len() != target.len() {
        return Err(SuperpositionError::LengthMismatch {
            mobile: mobile.len(),
            target: target.len(),
        });
    }
    if mobile.len() < MIN_SUPERPOSITION_PAIRS {
        return Err(SuperpositionError::TooFewPairs {
            found: mobile.len(),
        });
    }
    if mobile
        .iter()
        .chain(target)
        .any(|p| !p.coords.iter().all(|c| c.is_finite()))
    {
        return Err(SuperpositionError::NonFiniteCoordinates);
    }

    let mobile_centroid = centroid(mobile).ok_or(SuperpositionError::TooFewPairs { found: 0 })?;
    let target_centroid = centroid(target).ok_or(SuperpositionError::TooFewPairs { found: 0 })?;

    let covariance = mobile
        .iter()
        .zip(target)
        .fold(Matrix3::zeros(), |acc, (m, t)| {
            acc + (t - target_centroid) * (m - mobile_centroid).transpose()
        });

    let svd = covariance.try_svd(true, true, f64::EPSILON, 0);
    let svd = svd.ok_or(SuperpositionError::SvdFailed)?;
    let singular = svd.singular_values;
    let mut u = svd.u.ok_or(SuperpositionError::SvdFailed)?;
    let v_t = svd.v_t.ok_or(SuperpositionError::SvdFailed)?;

    let mut sorted = [singular[0], singular[1], singular[2]];
    sorted.sort_by(|a, b| b.total_cmp(a));
    if sorted[0] <= 0.0 || sorted[1] <= DEGENERACY_TOLERANCE * sorted[0] {
        return Err(SuperpositionError::Degenerate);
    }

    if (u * v_t).determinant() < 0.0 {
        let smallest = singular.imin();
        u.column_mut(smallest).neg_mut();
    }
    let rotation = u * v_t;

    let result = Superposition {
        rotation,
        mobile_centroid,
        target_centroid,
        rmsd_before: 0.0,
        rmsd_after: 0.0,
        pair_count: mobile.len(),
    };
    let moved: Vec<Point3<f64>> = mobile.iter().map(|p| result.transform_point(p)).collect();

    Ok(Superposition {
        rmsd_before: calculate_rmsd(mobile, target).unwrap_or(f64::NAN),
        rmsd_after: calculate_rmsd(&moved, target).unwrap_or(f64::NAN),
        ..result
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::{Rotation3, Vector3};

    fn cloud() -> Vec<Point3<f64>> {
        vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.5, 0.2, -0.3),
            Point3::new(2.1, 1.4, 0.8),
            Point3::new(-0.7, 2.2, 1.9),
            Point3::new(0.4, -1.8, 2.6),
            Point3::new(3.3, -0.9, -1.2),
        ]
    }

    fn moved(points: &[Point3<f64>], rotation: &Rotation3<f64>, shift: Vector3<f64>) -> Vec<Point3<f64>> {
        points.iter().map(|p| rotation * p + shift).collect()
    }

    #[test]
    fn recovers_a_known_rigid_transform() {
        let rotation = Rotation3::from_axis_angle(&Vector3::z_axis(), 0.7)
            * Rotation3::from_axis_angle(&Vector3::x_axis(), -1.1);
        let mobile = cloud();
        let target = moved(&mobile, &rotation, Vector3::new(4.0, -2.0, 7.5));

        let fit = superpose(&mobile, &target).unwrap();
        assert!(fit.rmsd_before > 1.0);
        assert!(fit.rmsd_after < 1e-6);
        assert!((fit.rotation - rotation.matrix()).norm() < 1e-6);
        assert_eq!(fit.pair_count, 6);

        for (m, t) in mobile.iter().zip(&target) {
            assert!((fit.transform_point(m) - t).norm() < 1e-6);
        }
    }

    #[test]
    fn inverse_transform_returns_to_the_original_coordinates() {
        let rotation = Rotation3::from_axis_angle(&Vector3::y_axis(), -0.9)
            * Rotation3::from_axis_angle(&Vector3::z_axis(), 2.4);
        let mobile = cloud();
        // Noise keeps the fit inexact.
        let target: Vec<_> = moved(&mobile, &rotation, Vector3::new(-6.0, 1.0, 2.0))
            .into_iter()
            .enumerate()
            .map(|(i, p)| p + Vector3::new(0.05 * i as f64, -0.03, 0.02 * (i % 2) as f64))
            .collect();

        let fit = superpose(&mobile, &target).unwrap();
        assert!(fit.rmsd_after > 1e-3);
        let there: Vec<_> = mobile.iter().map(|p| fit.transform_point(p)).collect();

        let inverse = fit.inverse();
        assert!((inverse.rotation * fit.rotation - Matrix3::identity()).norm() < 1e-9);
        let back: Vec<_> = there.iter().map(|p| inverse.transform_point(p)).collect();
        assert!(calculate_rmsd(&back, &mobile).unwrap() < 1e-9);

        let matrix = inverse.to_homogeneous() * fit.to_homogeneous();
        assert!((matrix - Matrix4::identity()).norm() < 1e-9);
    }

    #[test]
    fn homogeneous_matrix_matches_point_transform() {
        let rotation = Rotation3::from_axis_angle(&Vector3::y_axis(), 2.0);
        let mobile = cloud();
        let target = moved(&mobile, &rotation, Vector3::new(-1.0, 0.5, 3.0));
        let fit = superpose(&mobile, &target).unwrap();

        let matrix = fit.to_homogeneous();
        for m in &mobile {
            let expected = fit.transform_point(m);
            let actual = matrix.transform_point(m);
            assert!((expected - actual).norm() < 1e-9);
        }
    }

    #[test]
    fn mirrored_input_still_yields_a_proper_rotation() {
        let mobile = cloud();
        let target: Vec<_> = mobile.iter().map(|p| Point3::new(-p.x, p.y, p.z)).collect();
        let fit = superpose(&mobile, &target).unwrap();
        assert!((fit.rotation.determinant() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn superposing_a_set_onto_itself_is_the_identity() {
        let points = cloud();
        let fit = superpose(&points, &points).unwrap();
        assert!((fit.rotation - Matrix3::identity()).norm() < 1e-9);
        assert!(fit.rmsd_after < 1e-9);
    }

    #[test]
    fn rejects_degenerate_inputs() {
        let points = cloud();
        assert_eq!(
            superpose(&points[..3], &points[..4]),
            Err(SuperpositionError::LengthMismatch { mobile: 3, target: 4 })
        );
        assert_eq!(
            superpose(&points[..2], &points[..2]),
            Err(SuperpositionError::TooFewPairs { found: 2 })
        );

        let mut with_nan = points.clone();
        with_nan[1].x = f64::NAN;
        assert_eq!(
            superpose(&with_nan, &points),
            Err(SuperpositionError::NonFiniteCoordinates)
        );

        let line: Vec<_> = (0..5).map(|i| Point3::new(i as f64, 0.0, 0.0)).collect();
        assert_eq!(superpose(&line, &line), Err(SuperpositionError::Degenerate));
    }
}
