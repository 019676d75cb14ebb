use super::options::GroupOptions;
use crate::cancel::CancelToken;
use crate::data::NeighborList;
use crate::error::{ReconError, ReconResult};
use log::debug;

/// Merge policy driven by [`group_features`].
///
/// Parent ids start at `-1` (unmerged). Implementations that accept a
/// neighbor write `new_parent` into `parent_ids[neighbor]` themselves.
pub trait GroupingStrategy {
    /// Next unmerged feature to seed group `new_parent`, or `None` when done.
    fn get_seed(&mut self, new_parent: i32, parent_ids: &[i32]) -> Option<usize>;

    /// Returns true iff `neighbor` joins group `new_parent`.
    fn determine_grouping(
        &mut self,
        reference: usize,
        neighbor: usize,
        new_parent: i32,
        parent_ids: &mut [i32],
    ) -> bool;

    /// Whether the finished group `parent` earns a second, looser pass.
    fn grow_patch(&mut self, _parent: i32, _members: &[usize]) -> bool {
        false
    }

    /// Acceptance test of the patch pass; same contract as
    /// [`Self::determine_grouping`].
    fn grow_grouping(
        &mut self,
        _reference: usize,
        _neighbor: usize,
        _parent: i32,
        _parent_ids: &mut [i32],
    ) -> bool {
        false
    }
}

/// Breadth-first queue that may grow while it is being walked.
#[derive(Clone, Debug, Default)]
pub struct Worklist {
    items: Vec<usize>,
    cursor: usize,
}

impl Worklist {
    pub fn new(seed: usize) -> Self {
        Self {
            items: vec![seed],
            cursor: 0,
        }
    }

    pub fn push(&mut self, feature: usize) {
        self.items.push(feature);
    }

    /// Next unvisited entry.
    pub fn advance(&mut self) -> Option<usize> {
        let item = self.items.get(self.cursor).copied()?;
        self.cursor += 1;
        Some(item)
    }

    /// Restarts the walk from the first entry, keeping every member.
    pub fn rewind(&mut self) {
        self.cursor = 0;
    }

    pub fn members(&self) -> &[usize] {
        &self.items
    }
}

/// Result of one grouping run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Grouping {
    /// Parent id per feature; `-1` for features never reached.
    pub parent_ids: Vec<i32>,
    /// `active[p]` for `p` in `0..=max_parent_id`; slot 0 is never active.
    pub active: Vec<bool>,
    pub cancelled: bool,
}

impl Grouping {
    pub fn num_groups(&self) -> usize {
        self.active.len().saturating_sub(1)
    }
}

/// Groups features over their neighbor graph.
///
/// Each group starts at a seed from the strategy and expands breadth-first:
/// contiguous neighbors first, then non-contiguous ones when
/// `options.use_non_contiguous` is set. Only unmerged neighbors are offered.
/// With `options.patch_grouping`, a group accepted by
/// [`GroupingStrategy::grow_patch`] is walked again from its first member
/// with [`GroupingStrategy::grow_grouping`] over contiguous neighbors.
pub fn group_features<G>(
    contiguous: &NeighborList,
    non_contiguous: Option<&NeighborList>,
    strategy: &mut G,
    options: &GroupOptions,
    cancel: &CancelToken,
) -> ReconResult<Grouping>
where
    G: GroupingStrategy + ?Sized,
{
    let num_features = contiguous.len();
    if let Some(list) = non_contiguous {
        if list.len() != num_features {
            return Err(ReconError::NeighborListMismatch {
                expected: num_features,
                actual: list.len(),
            });
        }
    }
    let non_contiguous = non_contiguous.filter(|_| options.use_non_contiguous);

    let mut parent_ids = vec![-1i32; num_features];
    if options.exclude_feature_zero && num_features > 0 {
        parent_ids[0] = 0;
    }
    let mut active = vec![false];
    let mut parent: i32 = 1;
    let mut patches = 0usize;
    let mut cancelled = false;

    loop {
        if cancel.is_cancelled() {
            cancelled = true;
            break;
        }
        let Some(seed) = strategy.get_seed(parent, &parent_ids) else {
            break;
        };
        debug_assert_eq!(parent_ids[seed], -1, "seed {seed} is already merged");
        parent_ids[seed] = parent;
        active.resize(parent as usize + 1, false);
        active[parent as usize] = true;

        let mut list = Worklist::new(seed);
        while let Some(reference) = list.advance() {
            let lists = std::iter::once(contiguous).chain(non_contiguous);
            for neighbors in lists {
                for &neighbor in neighbors.neighbors(reference) {
                    if parent_ids.get(neighbor) != Some(&-1) {
                        continue;
                    }
                    if strategy.determine_grouping(reference, neighbor, parent, &mut parent_ids) {
                        list.push(neighbor);
                    }
                }
            }
        }

        if options.patch_grouping && strategy.grow_patch(parent, list.members()) {
            patches += 1;
            list.rewind();
            while let Some(reference) = list.advance() {
                for &neighbor in contiguous.neighbors(reference) {
                    if parent_ids.get(neighbor) != Some(&-1) {
                        continue;
                    }
                    if strategy.grow_grouping(reference, neighbor, parent, &mut parent_ids) {
                        list.push(neighbor);
                    }
                }
            }
        }
        parent += 1;
    }

    debug!(
        "group_features: {} groups from {} features, {} patch passes{}",
        active.len() - 1,
        num_features,
        patches,
        if cancelled { " (cancelled)" } else { "" }
    );
    Ok(Grouping {
        parent_ids,
        active,
        cancelled,
    })
}
