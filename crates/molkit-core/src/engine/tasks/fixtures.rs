//! Synthetic backbones for task tests.

use crate::core::models::array::StorageKind;
use crate::core::models::atom::AtomRecord;
use crate::core::models::builder::StructureBuilder;
use crate::core::models::ids::GlobalIndexAllocator;
use crate::core::models::structure::Structure;
use nalgebra::{Point3, Vector3};

/// Trace of an ideal alpha helix: radius 2.3 Å, rise 1.5 Å, 100° per residue.
pub(crate) fn helix_trace(n: usize) -> Vec<Point3<f64>> {
    (0..n)
        .map(|i| {
            let t = (i as f64 * 100.0).to_radians();
            Point3::new(2.3 * t.cos(), 2.3 * t.sin(), 1.5 * i as f64)
        })
        .collect()
}

/// Trace of a flat extended strand zigzagging along x.
pub(crate) fn strand_trace(n: usize) -> Vec<Point3<f64>> {
    (0..n)
        .map(|i| {
            let y = if i % 2 == 0 { 0.94 } else { -0.94 };
            Point3::new(3.3 * i as f64, y, 0.0)
        })
        .collect()
}

fn record(chain: &str, number: i32, residue: &str, atom: &str, p: &Point3<f64>) -> AtomRecord {
    AtomRecord::new(chain, number, residue, atom, [p.x as f32, p.y as f32, p.z as f32])
}

/// Alanines with N, CA, C and O placed around a CA trace.
///
/// N and C sit 1.33 Å from CA along the trace, so each residue carries the
/// three bonds N-CA, CA-C and C-O and links to the next through C-N.
pub(crate) fn backbone_records(chain: &str, first_number: i32, trace: &[Point3<f64>]) -> Vec<AtomRecord> {
    let n = trace.len();
    let mut records = Vec::with_capacity(n * 4);
    for (i, ca) in trace.iter().enumerate() {
        let forward = if i + 1 < n {
            (trace[i + 1] - ca).normalize()
        } else {
            (ca - trace[i - 1]).normalize()
        };
        let backward = if i > 0 {
            (trace[i - 1] - ca).normalize()
        } else {
            -forward
        };
        let n_atom = ca + backward * 1.33;
        let c_atom = ca + forward * 1.33;
        let o_atom = c_atom + forward.cross(&Vector3::z()).normalize() * 1.23;

        let number = first_number + i as i32;
        records.push(record(chain, number, "ALA", "N", &n_atom));
        records.push(record(chain, number, "ALA", "CA", ca));
        records.push(record(chain, number, "ALA", "C", &c_atom));
        records.push(record(chain, number, "ALA", "O", &o_atom));
    }
    records
}

/// One-bead coarse-grained leucines along a trace.
pub(crate) fn coarse_grained_records(chain: &str, trace: &[Point3<f64>]) -> Vec<AtomRecord> {
    trace
        .iter()
        .enumerate()
        .map(|(i, p)| record(chain, i as i32 + 1, "LEU", "BB", p))
        .collect()
}

pub(crate) fn build(records: &[AtomRecord]) -> Structure {
    let mut allocator = GlobalIndexAllocator::new();
    let mut builder = StructureBuilder::new("fixture", StorageKind::Objects, &mut allocator);
    builder.add_records(records);
    builder.build()
}
