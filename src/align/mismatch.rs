//! Mismatch scores for the greedy search: misorientation and mask.

use super::search::ShiftSearch;
use crate::orientation::{quat_at, CrystalStructure, Misorientation};

/// Arrays consulted by [`misorientation_score`].
pub(crate) struct OrientationField<'a, M> {
    pub quats: &'a [f32],
    pub phases: &'a [i32],
    pub structures: &'a [CrystalStructure],
    pub mask: Option<&'a [bool]>,
    pub tolerance: f64,
    pub provider: &'a M,
}

impl<M: Misorientation> OrientationField<'_, M> {
    fn structure(&self, phase: i32) -> CrystalStructure {
        usize::try_from(phase)
            .ok()
            .and_then(|p| self.structures.get(p).copied())
            .unwrap_or(CrystalStructure::Unknown)
    }

    /// Misorientation between two voxels, infinite when either phase is not
    /// positive or the quaternions are unusable.
    fn misorientation(&self, a: usize, b: usize) -> f64 {
        if self.phases[a] <= 0 || self.phases[b] <= 0 {
            return f64::INFINITY;
        }
        match (quat_at(self.quats, a), quat_at(self.quats, b)) {
            (Some(q1), Some(q2)) => self.provider.misorientation(
                &q1,
                self.structure(self.phases[a]),
                &q2,
                self.structure(self.phases[b]),
            ),
            _ => f64::INFINITY,
        }
    }
}

/// Fraction of sampled pairs that disagree, for shifting slice `moving`
/// onto slice `reference` by `(dx, dy)`.
///
/// A good pair counts when its misorientation exceeds the tolerance; with a
/// mask, a good/bad pair always counts and a bad/bad pair never does.
pub(crate) fn misorientation_score<M: Misorientation>(
    field: &OrientationField<'_, M>,
    search: &ShiftSearch,
    reference: usize,
    moving: usize,
    plane: usize,
    dx: i64,
    dy: i64,
) -> Option<f64> {
    let (ref_base, cur_base) = (reference * plane, moving * plane);
    let mut count = 0usize;
    let mut mismatches = 0usize;
    search.for_each_sample(dx, dy, |r, c| {
        let (r, c) = (ref_base + r, cur_base + c);
        count += 1;
        let good = field.mask.map_or(true, |m| m[r] && m[c]);
        if good && field.misorientation(r, c) > field.tolerance {
            mismatches += 1;
        }
        if let Some(m) = field.mask {
            if m[r] != m[c] {
                mismatches += 1;
            }
        }
    });
    (count > 0).then(|| mismatches as f64 / count as f64)
}

/// Fraction of sampled pairs whose mask values differ.
pub(crate) fn mask_score(
    mask: &[bool],
    search: &ShiftSearch,
    reference: usize,
    moving: usize,
    plane: usize,
    dx: i64,
    dy: i64,
) -> Option<f64> {
    let (ref_base, cur_base) = (reference * plane, moving * plane);
    let mut count = 0usize;
    let mut mismatches = 0usize;
    search.for_each_sample(dx, dy, |r, c| {
        count += 1;
        if mask[ref_base + r] != mask[cur_base + c] {
            mismatches += 1;
        }
    });
    (count > 0).then(|| mismatches as f64 / count as f64)
}
