use nalgebra::{Point3, Vector3};

/// Axis-aligned box enclosing a set of points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min: Point3<f64>,
    pub max: Point3<f64>,
}

impl BoundingBox {
    /// A degenerate box around a single point.
    pub fn around(point: &Point3<f64>) -> Self {
        Self {
            min: *point,
            max: *point,
        }
    }

    /// The smallest box containing every point, or `None` for an empty input.
    ///
    /// Points with non-finite coordinates are ignored.
    pub fn from_points<I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = Point3<f64>>,
    {
        let mut bbox: Option<Self> = None;
        for point in points {
            if !point.coords.iter().all(|c| c.is_finite()) {
                continue;
            }
            match bbox.as_mut() {
                Some(b) => b.expand(&point),
                None => bbox = Some(Self::around(&point)),
            }
        }
        bbox
    }

    pub fn expand(&mut self, point: &Point3<f64>) {
        self.min = self.min.inf(point);
        self.max = self.max.sup(point);
    }

    pub fn union(&self, other: &Self) -> Self {
        Self {
            min: self.min.inf(&other.min),
            max: self.max.sup(&other.max),
        }
    }

    pub fn center(&self) -> Point3<f64> {
        nalgebra::center(&self.min, &self.max)
    }

    pub fn size(&self) -> Vector3<f64> {
        self.max - self.min
    }

    pub fn contains(&self, point: &Point3<f64>) -> bool {
        (0..3).all(|i| point[i] >= self.min[i] && point[i] <= self.max[i])
    }
}

pub fn centroid(points: &[Point3<f64>]) -> Option<Point3<f64>> {
    if points.is_empty() {
        return None;
    }
    let sum = points
        .iter()
        .fold(Vector3::zeros(), |acc, p| acc + p.coords);
    Some(Point3::from(sum / points.len() as f64))
}

pub fn calculate_rmsd(coords1: &[Point3<f64>], coords2: &[Point3<f64>]) -> Option<f64> {
    if coords1.len() != coords2.len() || coords1.is_empty() {
        return None;
    }
    let n = coords1.len() as f64;
    let squared_dist_sum: f64 = coords1
        .iter()
        .zip(coords2.iter())
        .map(|(p1, p2)| (p1 - p2).norm_squared())
        .sum();
    Some((squared_dist_sum / n).sqrt())
}

/// Angle between two vectors in degrees; `NaN` when either has zero length.
pub fn angle_between_degrees(v1: &Vector3<f64>, v2: &Vector3<f64>) -> f64 {
    let denominator = v1.norm() * v2.norm();
    if denominator == 0.0 {
        return f64::NAN;
    }
    (v1.dot(v2) / denominator).clamp(-1.0, 1.0).acos().to_degrees()
}

/// Local helix geometry along a run of trace atoms.
///
/// `centers[i]` is the point on the helix axis closest to residue `i`,
/// `axes[i]` the local axis direction and `bending[i]` the angle in degrees
/// between the axes of residues `i` and `i + 1` (zero for the last residue).
#[derive(Debug, Clone, PartialEq)]
pub struct HelixAxis {
    pub centers: Vec<Point3<f64>>,
    pub axes: Vec<Vector3<f64>>,
    pub radii: Vec<f64>,
    pub bending: Vec<f64>,
}

/// Fits a local helix axis through every window of four consecutive trace
/// positions.
///
/// Each window `(a, b, c, d)` yields an axis direction from the cross product
/// of the bisector differences `(b - a) - (c - b)` and `(c - b) - (d - c)`,
/// a radius, and axis points for its two inner residues. Residues covered by
/// two windows get the mean of both axis points; the two terminal residues
/// copy their inner neighbour. Degenerate (straight) windows produce
/// non-finite values that callers treat as "not helical".
///
/// Returns `None` for fewer than four positions.
pub fn helix_axis(trace: &[Point3<f64>]) -> Option<HelixAxis> {
    let n = trace.len();
    if n < 4 {
        return None;
    }

    let windows = n - 3;
    let mut window_axes = Vec::with_capacity(windows);
    let mut center_sums = vec![Vector3::zeros(); n];
    let mut center_counts = vec![0usize; n];
    let mut radius_sums = vec![0.0; n];

    for w in 0..windows {
        let (a, b, c, d) = (trace[w], trace[w + 1], trace[w + 2], trace[w + 3]);
        let v1 = b - a;
        let v2 = c - b;
        let v3 = d - c;
        let diff13 = v1 - v2;
        let diff24 = v2 - v3;

        window_axes.push(diff13.cross(&diff24).normalize());

        let len1 = diff13.norm();
        let len2 = diff24.norm();
        let cos_angle = diff13.dot(&diff24) / (len1 * len2);
        let radius = (len1 * len2).sqrt() / (2.0 * (1.0 - cos_angle));

        let inner_b = b.coords - diff13.normalize() * radius;
        let inner_c = c.coords - diff24.normalize() * radius;
        for (residue, point) in [(w + 1, inner_b), (w + 2, inner_c)] {
            center_sums[residue] += point;
            center_counts[residue] += 1;
            radius_sums[residue] += radius;
        }
    }

    let mut centers: Vec<Point3<f64>> = (0..n)
        .map(|i| match center_counts[i] {
            0 => Point3::origin(),
            count => Point3::from(center_sums[i] / count as f64),
        })
        .collect();
    let mut radii: Vec<f64> = (0..n)
        .map(|i| match center_counts[i] {
            0 => 0.0,
            count => radius_sums[i] / count as f64,
        })
        .collect();
    centers[0] = centers[1];
    centers[n - 1] = centers[n - 2];
    radii[0] = radii[1];
    radii[n - 1] = radii[n - 2];

    let axes: Vec<Vector3<f64>> = (0..n)
        .map(|i| window_axes[i.saturating_sub(1).min(windows - 1)])
        .collect();
    let bending = (0..n)
        .map(|i| {
            if i + 1 < n {
                angle_between_degrees(&axes[i], &axes[i + 1])
            } else {
                0.0
            }
        })
        .collect();

    Some(HelixAxis {
        centers,
        axes,
        radii,
        bending,
    })
}
