use crate::cancel::CancelToken;
use crate::geometry::ImageGeometry;
use log::debug;

/// Chooses the voxel that starts the next feature.
pub trait SeedPicker {
    /// Next unlabeled, eligible voxel at or after `search_start`, or `None`
    /// when every eligible voxel is labeled. `feature_count` is the id the
    /// seed is about to receive.
    fn next_seed(&mut self, feature_count: i32, search_start: usize, feature_ids: &[i32])
        -> Option<usize>;
}

/// Decides whether a neighbor joins the feature currently being grown.
pub trait GroupingPredicate {
    /// Returns true iff `neighbor` joins feature `feature_id`. On acceptance
    /// the implementation writes `feature_id` into `feature_ids[neighbor]`.
    fn determine_grouping(
        &mut self,
        reference: usize,
        neighbor: usize,
        feature_id: i32,
        feature_ids: &mut [i32],
    ) -> bool;
}

/// Per-feature active flags produced by a segmentation run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FeatureTable {
    /// `active[f]` for `f` in `0..=max_feature_id`; slot 0 is never active.
    pub active: Vec<bool>,
    /// The run stopped early on a cancellation request.
    pub cancelled: bool,
}

impl FeatureTable {
    /// Number of table entries, feature 0 included.
    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    /// Features created by the run.
    pub fn feature_count(&self) -> usize {
        self.active.len().saturating_sub(1)
    }
}

/// Seeded flood fill over the face neighbors of a voxel grid.
#[derive(Clone, Debug)]
pub struct SegmentEngine {
    geometry: ImageGeometry,
    cancel: CancelToken,
}

impl SegmentEngine {
    pub fn new(geometry: ImageGeometry) -> Self {
        Self {
            geometry,
            cancel: CancelToken::default(),
        }
    }

    pub fn with_cancel(mut self, cancel: &CancelToken) -> Self {
        self.cancel = cancel.clone();
        self
    }

    /// Labels `feature_ids` in place; ids already non-zero are left alone.
    ///
    /// Every voxel reached from a seed through accepted face neighbors gets
    /// the seed's id. Ids are allocated from 1 in seed order.
    pub fn execute<S, P>(&self, seeds: &mut S, predicate: &mut P, feature_ids: &mut [i32]) -> FeatureTable
    where
        S: SeedPicker + ?Sized,
        P: GroupingPredicate + ?Sized,
    {
        let [nx, ny, nz] = self.geometry.dims;
        let plane = nx * ny;
        debug_assert_eq!(feature_ids.len(), self.geometry.total_points());

        let mut active = vec![false];
        let mut stack: Vec<usize> = Vec::with_capacity(64);
        let mut feature_id: i32 = 1;
        let mut next_seed = 0usize;
        let mut cancelled = false;

        loop {
            if self.cancel.is_cancelled() {
                cancelled = true;
                break;
            }
            let Some(seed) = seeds.next_seed(feature_id, next_seed, feature_ids) else {
                break;
            };
            debug_assert_eq!(feature_ids[seed], 0, "seed {seed} is already labeled");
            next_seed = seed + 1;
            feature_ids[seed] = feature_id;
            active.resize(feature_id as usize + 1, false);
            active[feature_id as usize] = true;

            stack.clear();
            stack.push(seed);
            while let Some(current) = stack.pop() {
                let x = current % nx;
                let y = (current / nx) % ny;
                let z = current / plane;
                let neighbors = [
                    (z > 0).then(|| current - plane),
                    (y > 0).then(|| current - nx),
                    (x > 0).then(|| current - 1),
                    (x + 1 < nx).then(|| current + 1),
                    (y + 1 < ny).then(|| current + nx),
                    (z + 1 < nz).then(|| current + plane),
                ];
                for neighbor in neighbors.into_iter().flatten() {
                    if feature_ids[neighbor] != 0 {
                        continue;
                    }
                    if predicate.determine_grouping(current, neighbor, feature_id, feature_ids) {
                        stack.push(neighbor);
                    }
                }
            }
            feature_id += 1;
        }

        debug!(
            "SegmentEngine: {} features over {} voxels{}",
            active.len() - 1,
            feature_ids.len(),
            if cancelled { " (cancelled)" } else { "" }
        );
        FeatureTable { active, cancelled }
    }
}
