use super::engine::GroupingPredicate;
use super::scalar::mask_allows;
use crate::orientation::{axis_angle, c_axis, quat_at, CrystalStructure};

/// Groups neighbors of the same hexagonal phase whose crystal c-axes, in the
/// sample frame, are within `tolerance` radians as undirected lines.
///
/// Rotation about the c-axis is ignored, so basal-plane texture variants of
/// one colony land in the same feature.
#[derive(Clone, Copy, Debug)]
pub struct CAxisComparator<'a> {
    quats: &'a [f32],
    phases: &'a [i32],
    structures: &'a [CrystalStructure],
    mask: Option<&'a [bool]>,
    tolerance: f64,
}

impl<'a> CAxisComparator<'a> {
    pub fn new(
        quats: &'a [f32],
        phases: &'a [i32],
        structures: &'a [CrystalStructure],
        tolerance: f64,
    ) -> Self {
        Self {
            quats,
            phases,
            structures,
            mask: None,
            tolerance,
        }
    }

    pub fn with_mask(mut self, mask: Option<&'a [bool]>) -> Self {
        self.mask = mask;
        self
    }

    fn is_hexagonal(&self, phase: i32) -> bool {
        usize::try_from(phase)
            .ok()
            .and_then(|p| self.structures.get(p).copied())
            == Some(CrystalStructure::Hexagonal)
    }

    /// Angle between the c-axes of two voxels in `[0, pi/2]`; infinite when
    /// the phases differ, are not hexagonal or a quaternion is degenerate.
    pub fn angle(&self, a: usize, b: usize) -> f64 {
        let (pa, pb) = (self.phases[a], self.phases[b]);
        if pa <= 0 || pa != pb || !self.is_hexagonal(pa) {
            return f64::INFINITY;
        }
        match (quat_at(self.quats, a), quat_at(self.quats, b)) {
            (Some(q1), Some(q2)) => axis_angle(&c_axis(&q1), &c_axis(&q2)),
            _ => f64::INFINITY,
        }
    }
}

impl GroupingPredicate for CAxisComparator<'_> {
    fn determine_grouping(
        &mut self,
        reference: usize,
        neighbor: usize,
        feature_id: i32,
        feature_ids: &mut [i32],
    ) -> bool {
        if feature_ids[neighbor] != 0 || !mask_allows(self.mask, neighbor) {
            return false;
        }
        if self.angle(reference, neighbor) <= self.tolerance {
            feature_ids[neighbor] = feature_id;
            true
        } else {
            false
        }
    }
}
