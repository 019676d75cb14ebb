use nalgebra::{Matrix3, Rotation3, UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::sync::OnceLock;

/// Laue class of a phase. Discriminants follow the EBSD ensemble table ids.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CrystalStructure {
    /// 6/mmm
    Hexagonal = 0,
    /// m-3m
    Cubic = 1,
    /// -1
    Triclinic = 4,
    /// mmm
    OrthoRhombic = 6,
    /// 4/mmm
    Tetragonal = 8,
    #[default]
    Unknown = 999,
}

impl CrystalStructure {
    /// Maps an ensemble table id; unsupported ids become `Unknown`.
    pub fn from_id(id: u32) -> Self {
        match id {
            0 => Self::Hexagonal,
            1 => Self::Cubic,
            4 => Self::Triclinic,
            6 => Self::OrthoRhombic,
            8 => Self::Tetragonal,
            _ => Self::Unknown,
        }
    }

    pub fn id(self) -> u32 {
        self as u32
    }

    /// Proper rotations of the Laue group, identity first. Empty for `Unknown`.
    pub fn symmetry_ops(self) -> &'static [UnitQuaternion<f64>] {
        static CUBIC: OnceLock<Vec<UnitQuaternion<f64>>> = OnceLock::new();
        static HEXAGONAL: OnceLock<Vec<UnitQuaternion<f64>>> = OnceLock::new();
        static TETRAGONAL: OnceLock<Vec<UnitQuaternion<f64>>> = OnceLock::new();
        static ORTHORHOMBIC: OnceLock<Vec<UnitQuaternion<f64>>> = OnceLock::new();
        static TRICLINIC: OnceLock<Vec<UnitQuaternion<f64>>> = OnceLock::new();
        match self {
            Self::Cubic => CUBIC.get_or_init(cubic_ops),
            Self::Hexagonal => HEXAGONAL.get_or_init(|| dihedral_ops(6)),
            Self::Tetragonal => TETRAGONAL.get_or_init(|| dihedral_ops(4)),
            Self::OrthoRhombic => ORTHORHOMBIC.get_or_init(|| dihedral_ops(2)),
            Self::Triclinic => TRICLINIC.get_or_init(|| vec![UnitQuaternion::identity()]),
            Self::Unknown => &[],
        }
    }
}

/// The 24 proper rotations of the cube: signed permutation matrices with
/// determinant +1. The identity comes first.
fn cubic_ops() -> Vec<UnitQuaternion<f64>> {
    const PERMS: [[usize; 3]; 6] = [[0, 1, 2], [0, 2, 1], [1, 0, 2], [1, 2, 0], [2, 0, 1], [2, 1, 0]];
    let mut ops = Vec::with_capacity(24);
    for perm in PERMS {
        for signs in 0..8u8 {
            let mut m = Matrix3::zeros();
            for (row, &col) in perm.iter().enumerate() {
                m[(row, col)] = if signs & (1 << row) == 0 { 1.0 } else { -1.0 };
            }
            if m.determinant() > 0.0 {
                let rot = Rotation3::from_matrix_unchecked(m);
                ops.push(UnitQuaternion::from_rotation_matrix(&rot));
            }
        }
    }
    ops
}

/// Rotations of the dihedral group `n22`: `n` turns about z plus `n`
/// two-fold axes in the basal plane.
fn dihedral_ops(n: usize) -> Vec<UnitQuaternion<f64>> {
    let step = 2.0 * PI / n as f64;
    let mut ops = Vec::with_capacity(2 * n);
    for k in 0..n {
        ops.push(UnitQuaternion::from_axis_angle(&Vector3::z_axis(), step * k as f64));
    }
    for k in 0..n {
        let phi = step * 0.5 * k as f64;
        let axis = Vector3::new(phi.cos(), phi.sin(), 0.0);
        ops.push(UnitQuaternion::from_scaled_axis(axis * PI));
    }
    ops
}

/// Misorientation between two orientations, in radians.
///
/// Implementations return `f64::INFINITY` when the structures differ or are
/// unknown, or when either quaternion is degenerate. Callers treat phase ids
/// `<= 0` as invalid before asking.
pub trait Misorientation: Sync {
    fn misorientation(
        &self,
        q1: &UnitQuaternion<f64>,
        s1: CrystalStructure,
        q2: &UnitQuaternion<f64>,
        s2: CrystalStructure,
    ) -> f64;
}

impl<M: Misorientation + ?Sized> Misorientation for &M {
    fn misorientation(
        &self,
        q1: &UnitQuaternion<f64>,
        s1: CrystalStructure,
        q2: &UnitQuaternion<f64>,
        s2: CrystalStructure,
    ) -> f64 {
        (**self).misorientation(q1, s1, q2, s2)
    }
}

/// Default provider: minimum rotation angle over the proper rotations of the
/// shared Laue group.
#[derive(Clone, Copy, Debug, Default)]
pub struct LaueOps;

impl LaueOps {
    /// Smallest misorientation angle together with its rotation axis.
    ///
    /// The axis is a unit vector in the crystal frame of `q1`; `None` when
    /// the structures differ or are unknown. A zero rotation reports the
    /// z axis.
    pub fn misorientation_axis(
        &self,
        q1: &UnitQuaternion<f64>,
        s1: CrystalStructure,
        q2: &UnitQuaternion<f64>,
        s2: CrystalStructure,
    ) -> Option<(f64, Vector3<f64>)> {
        if s1 != s2 {
            return None;
        }
        let dq = q1.inverse() * q2;
        let best = s1
            .symmetry_ops()
            .iter()
            .map(|s| dq * s)
            .max_by(|a, b| {
                let (wa, wb) = (a.quaternion().scalar().abs(), b.quaternion().scalar().abs());
                wa.total_cmp(&wb)
            })?;
        let angle = 2.0 * best.quaternion().scalar().abs().min(1.0).acos();
        let axis = best.axis().map_or_else(Vector3::z, |a| a.into_inner());
        Some((angle, axis))
    }
}

impl Misorientation for LaueOps {
    fn misorientation(
        &self,
        q1: &UnitQuaternion<f64>,
        s1: CrystalStructure,
        q2: &UnitQuaternion<f64>,
        s2: CrystalStructure,
    ) -> f64 {
        if s1 != s2 {
            return f64::INFINITY;
        }
        let ops = s1.symmetry_ops();
        if ops.is_empty() {
            return f64::INFINITY;
        }
        let dq = q1.inverse() * q2;
        // Largest |w| over the equivalent rotations gives the smallest angle.
        let w = ops
            .iter()
            .map(|s| (dq * s).quaternion().scalar().abs())
            .fold(0.0f64, f64::max)
            .min(1.0);
        2.0 * w.acos()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn group_orders_match_laue_classes() {
        assert_eq!(CrystalStructure::Cubic.symmetry_ops().len(), 24);
        assert_eq!(CrystalStructure::Hexagonal.symmetry_ops().len(), 12);
        assert_eq!(CrystalStructure::Tetragonal.symmetry_ops().len(), 8);
        assert_eq!(CrystalStructure::OrthoRhombic.symmetry_ops().len(), 4);
        assert_eq!(CrystalStructure::Triclinic.symmetry_ops().len(), 1);
        assert!(CrystalStructure::Unknown.symmetry_ops().is_empty());
        for s in [CrystalStructure::Cubic, CrystalStructure::Hexagonal] {
            assert_relative_eq!(s.symmetry_ops()[0].angle(), 0.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn symmetric_equivalents_have_zero_misorientation() {
        let q = UnitQuaternion::from_euler_angles(0.4, 0.9, -1.3);
        let quarter = UnitQuaternion::from_axis_angle(&Vector3::y_axis(), PI / 2.0);
        let angle = LaueOps.misorientation(
            &q,
            CrystalStructure::Cubic,
            &(q * quarter),
            CrystalStructure::Cubic,
        );
        assert_relative_eq!(angle, 0.0, epsilon = 1e-6);

        // A quarter turn is not a symmetry of an orthorhombic crystal.
        let angle = LaueOps.misorientation(
            &q,
            CrystalStructure::OrthoRhombic,
            &(q * quarter),
            CrystalStructure::OrthoRhombic,
        );
        assert_relative_eq!(angle, PI / 2.0, epsilon = 1e-6);
    }

    #[test]
    fn small_rotations_are_reported_exactly() {
        let q = UnitQuaternion::from_euler_angles(0.1, 0.2, 0.3);
        let tilt = UnitQuaternion::from_axis_angle(&Vector3::x_axis(), 3f64.to_radians());
        for s in [CrystalStructure::Cubic, CrystalStructure::Hexagonal, CrystalStructure::Triclinic] {
            let angle = LaueOps.misorientation(&q, s, &(q * tilt), s);
            assert_relative_eq!(angle.to_degrees(), 3.0, epsilon = 1e-6);
        }
    }

    #[test]
    fn mismatched_or_unknown_structures_are_infinite() {
        let q = UnitQuaternion::identity();
        assert!(LaueOps
            .misorientation(&q, CrystalStructure::Cubic, &q, CrystalStructure::Hexagonal)
            .is_infinite());
        assert!(LaueOps
            .misorientation(&q, CrystalStructure::Unknown, &q, CrystalStructure::Unknown)
            .is_infinite());
    }

    #[test]
    fn misorientation_axis_reports_the_sigma3_rotation() {
        let q = UnitQuaternion::from_euler_angles(0.3, -0.5, 0.8);
        let axis = Vector3::new(1.0, 1.0, 1.0).normalize();
        let twin = q * UnitQuaternion::from_scaled_axis(axis * 60f64.to_radians());
        let (angle, found) = LaueOps
            .misorientation_axis(&q, CrystalStructure::Cubic, &twin, CrystalStructure::Cubic)
            .unwrap();
        assert_relative_eq!(angle.to_degrees(), 60.0, epsilon = 1e-6);
        for c in found.iter() {
            assert_relative_eq!(c.abs(), 1.0 / 3f64.sqrt(), epsilon = 1e-6);
        }
        assert!(LaueOps
            .misorientation_axis(&q, CrystalStructure::Cubic, &twin, CrystalStructure::Hexagonal)
            .is_none());
    }

    #[test]
    fn ids_round_trip() {
        for s in [
            CrystalStructure::Hexagonal,
            CrystalStructure::Cubic,
            CrystalStructure::Triclinic,
            CrystalStructure::OrthoRhombic,
            CrystalStructure::Tetragonal,
        ] {
            assert_eq!(CrystalStructure::from_id(s.id()), s);
        }
        assert_eq!(CrystalStructure::from_id(3), CrystalStructure::Unknown);
    }
}
