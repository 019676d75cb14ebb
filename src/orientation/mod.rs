//! Orientation helpers: crystal structures, the default misorientation
//! provider and quaternion accessors for the `Quats` array.
//!
//! Quaternions are stored `x, y, z, w` and describe the passive rotation from
//! the sample frame into the crystal frame. Computation runs in `f64`.

mod symmetry;

pub use symmetry::{CrystalStructure, LaueOps, Misorientation};

use nalgebra::{Quaternion, UnitQuaternion, Vector3};

/// Smallest quaternion norm accepted as a valid orientation.
const MIN_QUAT_NORM: f64 = 1e-6;

/// Reads the quaternion of tuple `idx` from a flat 4-component array.
///
/// Returns `None` for an out-of-range index or a (near) zero quaternion.
#[inline]
pub fn quat_at(data: &[f32], idx: usize) -> Option<UnitQuaternion<f64>> {
    let q = data.get(idx * 4..idx * 4 + 4)?;
    let raw = Quaternion::new(q[3] as f64, q[0] as f64, q[1] as f64, q[2] as f64);
    UnitQuaternion::try_new(raw, MIN_QUAT_NORM)
}

/// Writes `q` into tuple `idx` of a flat 4-component array (`x, y, z, w`).
#[inline]
pub fn store_quat(data: &mut [f32], idx: usize, q: &UnitQuaternion<f64>) {
    let c = q.quaternion().coords;
    let out = &mut data[idx * 4..idx * 4 + 4];
    out[0] = c[0] as f32;
    out[1] = c[1] as f32;
    out[2] = c[2] as f32;
    out[3] = c[3] as f32;
}

/// Crystal c-axis `[0 0 1]` expressed in the sample frame.
#[inline]
pub fn c_axis(q: &UnitQuaternion<f64>) -> Vector3<f64> {
    q.inverse_transform_vector(&Vector3::z())
}

/// Angle in `[0, pi/2]` between two axes treated as undirected lines.
#[inline]
pub fn axis_angle(a: &Vector3<f64>, b: &Vector3<f64>) -> f64 {
    let denom = a.norm() * b.norm();
    if denom <= 0.0 {
        return f64::INFINITY;
    }
    let w = (a.dot(b) / denom).clamp(-1.0, 1.0).acos();
    w.min(std::f64::consts::PI - w)
}
