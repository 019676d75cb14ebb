use serde::{Deserialize, Serialize};

/// Parameters shared by the segmentation filters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentOptions {
    /// Scalar difference for [`super::segment_scalar`]; angle in degrees for
    /// the vector and misorientation filters.
    pub tolerance: f64,
    /// Only grow into (and seed from) voxels whose `Mask` entry is true.
    pub use_mask: bool,
    /// Shuffle feature ids after segmentation.
    pub randomize_ids: bool,
    /// Seed for the shuffle; the wall clock is used when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub random_seed: Option<u64>,
}

impl Default for SegmentOptions {
    fn default() -> Self {
        Self {
            tolerance: 5.0,
            use_mask: false,
            randomize_ids: false,
            random_seed: None,
        }
    }
}

impl SegmentOptions {
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn with_mask(mut self, use_mask: bool) -> Self {
        self.use_mask = use_mask;
        self
    }

    pub fn with_random_seed(mut self, seed: u64) -> Self {
        self.randomize_ids = true;
        self.random_seed = Some(seed);
        self
    }
}
