use super::engine::GroupingStrategy;
use super::seeds::FeatureSeeds;
use crate::features::FeatureStats;
use crate::orientation::{quat_at, CrystalStructure, LaueOps};
use nalgebra::Vector3;

/// Rotation angle of the cubic Σ3 twin, radians.
const SIGMA3_ANGLE: f64 = std::f64::consts::FRAC_PI_3;

/// Merges neighboring cubic features related by a Σ3 twin: a 60 degree
/// rotation about a `<111>` axis.
#[derive(Clone, Debug)]
pub struct TwinGrouping<'a> {
    avg_quats: &'a [f32],
    phases: &'a [i32],
    structures: &'a [CrystalStructure],
    axis_tolerance: f64,
    angle_tolerance: f64,
    seeds: FeatureSeeds,
}

impl<'a> TwinGrouping<'a> {
    /// Both tolerances are in radians and exclusive.
    pub fn new(
        avg_quats: &'a [f32],
        phases: &'a [i32],
        structures: &'a [CrystalStructure],
        axis_tolerance: f64,
        angle_tolerance: f64,
    ) -> Self {
        Self {
            avg_quats,
            phases,
            structures,
            axis_tolerance,
            angle_tolerance,
            seeds: FeatureSeeds::default(),
        }
    }

    pub fn from_stats(
        stats: &'a FeatureStats,
        structures: &'a [CrystalStructure],
        axis_tolerance: f64,
        angle_tolerance: f64,
    ) -> Self {
        Self::new(&stats.avg_quats, &stats.phases, structures, axis_tolerance, angle_tolerance)
    }

    pub fn with_seeds(mut self, seeds: FeatureSeeds) -> Self {
        self.seeds = seeds;
        self
    }

    fn is_cubic(&self, feature: usize) -> bool {
        let phase = self.phases.get(feature).copied().unwrap_or(0);
        phase > 0 && self.structures.get(phase as usize).copied() == Some(CrystalStructure::Cubic)
    }

    /// Deviation of the misorientation between two features from the Σ3
    /// relation as `(axis, angle)` offsets in radians. `None` unless both
    /// features are cubic with valid orientations.
    pub fn twin_deviation(&self, a: usize, b: usize) -> Option<(f64, f64)> {
        if !(self.is_cubic(a) && self.is_cubic(b)) {
            return None;
        }
        let (qa, qb) = (quat_at(self.avg_quats, a)?, quat_at(self.avg_quats, b)?);
        let (angle, axis) =
            LaueOps.misorientation_axis(&qa, CrystalStructure::Cubic, &qb, CrystalStructure::Cubic)?;
        let diagonal = Vector3::repeat(1.0 / 3f64.sqrt());
        let cos = axis.abs().dot(&diagonal).clamp(-1.0, 1.0);
        Some((cos.acos(), (angle - SIGMA3_ANGLE).abs()))
    }
}

impl GroupingStrategy for TwinGrouping<'_> {
    fn get_seed(&mut self, _new_parent: i32, parent_ids: &[i32]) -> Option<usize> {
        self.seeds.next_seed(parent_ids)
    }

    fn determine_grouping(
        &mut self,
        reference: usize,
        neighbor: usize,
        new_parent: i32,
        parent_ids: &mut [i32],
    ) -> bool {
        match self.twin_deviation(reference, neighbor) {
            Some((axis, angle)) if axis < self.axis_tolerance && angle < self.angle_tolerance => {
                parent_ids[neighbor] = new_parent;
                true
            }
            _ => false,
        }
    }
}
