use super::engine::GroupingPredicate;
use crate::data::AttributeArray;

/// Groups neighbors whose scalar values differ by at most `tolerance`.
///
/// Works on any single-component array through the runtime element type;
/// see [`crate::data::Element::within_tolerance`] for the per-type rules.
#[derive(Clone, Copy, Debug)]
pub struct ScalarComparator<'a> {
    array: &'a AttributeArray,
    tolerance: f64,
    mask: Option<&'a [bool]>,
}

impl<'a> ScalarComparator<'a> {
    pub fn new(array: &'a AttributeArray, tolerance: f64) -> Self {
        Self {
            array,
            tolerance,
            mask: None,
        }
    }

    /// Neighbors with a false mask entry are never grouped.
    pub fn with_mask(mut self, mask: Option<&'a [bool]>) -> Self {
        self.mask = mask;
        self
    }
}

impl GroupingPredicate for ScalarComparator<'_> {
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
        if self.array.within_tolerance(reference, neighbor, self.tolerance) {
            feature_ids[neighbor] = feature_id;
            true
        } else {
            false
        }
    }
}

#[inline]
pub(super) fn mask_allows(mask: Option<&[bool]>, idx: usize) -> bool {
    mask.map_or(true, |m| m.get(idx).copied().unwrap_or(false))
}
