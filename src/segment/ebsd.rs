use super::engine::GroupingPredicate;
use super::scalar::mask_allows;
use crate::orientation::{quat_at, CrystalStructure, LaueOps, Misorientation};

/// Groups neighbors of the same phase whose orientations misorient by less
/// than `tolerance` radians.
///
/// Voxel indices handed to the predicate are local; `offset` is added before
/// reading quaternions, phases and mask so the comparator can label a single
/// slice of a larger volume.
#[derive(Clone, Copy, Debug)]
pub struct MisorientationComparator<'a, M = LaueOps> {
    quats: &'a [f32],
    phases: &'a [i32],
    structures: &'a [CrystalStructure],
    mask: Option<&'a [bool]>,
    tolerance: f64,
    offset: usize,
    provider: M,
}

impl<'a> MisorientationComparator<'a, LaueOps> {
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
            offset: 0,
            provider: LaueOps,
        }
    }
}

impl<'a, M: Misorientation> MisorientationComparator<'a, M> {
    /// Swaps in another misorientation provider.
    pub fn with_provider<N: Misorientation>(self, provider: N) -> MisorientationComparator<'a, N> {
        MisorientationComparator {
            quats: self.quats,
            phases: self.phases,
            structures: self.structures,
            mask: self.mask,
            tolerance: self.tolerance,
            offset: self.offset,
            provider,
        }
    }

    pub fn with_mask(mut self, mask: Option<&'a [bool]>) -> Self {
        self.mask = mask;
        self
    }

    pub fn with_offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    fn structure(&self, phase: i32) -> CrystalStructure {
        usize::try_from(phase)
            .ok()
            .and_then(|p| self.structures.get(p).copied())
            .unwrap_or(CrystalStructure::Unknown)
    }

    /// Misorientation between two global voxel indices; infinite when the
    /// phases differ or are not positive.
    pub fn misorientation(&self, a: usize, b: usize) -> f64 {
        let (pa, pb) = (self.phases[a], self.phases[b]);
        if pa != pb || pa <= 0 {
            return f64::INFINITY;
        }
        match (quat_at(self.quats, a), quat_at(self.quats, b)) {
            (Some(q1), Some(q2)) => {
                let s = self.structure(pa);
                self.provider.misorientation(&q1, s, &q2, s)
            }
            _ => f64::INFINITY,
        }
    }
}

impl<M: Misorientation> GroupingPredicate for MisorientationComparator<'_, M> {
    fn determine_grouping(
        &mut self,
        reference: usize,
        neighbor: usize,
        feature_id: i32,
        feature_ids: &mut [i32],
    ) -> bool {
        if feature_ids[neighbor] != 0 {
            return false;
        }
        let (a, b) = (self.offset + reference, self.offset + neighbor);
        if !mask_allows(self.mask, b) {
            return false;
        }
        if self.misorientation(a, b) < self.tolerance {
            feature_ids[neighbor] = feature_id;
            true
        } else {
            false
        }
    }
}
