use serde::{Deserialize, Serialize};

/// Options shared by every grouping strategy.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupOptions {
    /// Also expand over the non-contiguous neighbor list when one is given.
    pub use_non_contiguous: bool,
    /// Run the second, looser pass on groups the strategy accepts.
    pub patch_grouping: bool,
    /// Keep feature 0 out of every group (its parent id stays 0).
    pub exclude_feature_zero: bool,
    /// Feature the seed scan starts from.
    pub start_feature: usize,
    /// Shuffle the parent ids after grouping.
    pub randomize_parent_ids: bool,
    /// Seed for the shuffle; wall clock when `None`.
    pub random_seed: Option<u64>,
}

impl Default for GroupOptions {
    fn default() -> Self {
        Self {
            use_non_contiguous: false,
            patch_grouping: false,
            exclude_feature_zero: true,
            start_feature: 1,
            randomize_parent_ids: false,
            random_seed: None,
        }
    }
}

impl GroupOptions {
    pub fn with_non_contiguous(mut self, enabled: bool) -> Self {
        self.use_non_contiguous = enabled;
        self
    }

    pub fn with_patch_grouping(mut self, enabled: bool) -> Self {
        self.patch_grouping = enabled;
        self
    }

    pub fn with_feature_zero(mut self, include: bool) -> Self {
        self.exclude_feature_zero = !include;
        self
    }

    /// Enables parent-id shuffling with a fixed seed.
    pub fn with_random_seed(mut self, seed: u64) -> Self {
        self.randomize_parent_ids = true;
        self.random_seed = Some(seed);
        self
    }
}

/// Parameters of the hexagonal c-axis grouping filter.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MicroTextureOptions {
    /// c-axis tolerance in degrees.
    pub tolerance_deg: f64,
    /// Compare against the group's volume-weighted mean c-axis.
    pub use_running_average: bool,
    /// Group volume fraction that triggers patch growth.
    pub patch_volume_fraction: f64,
    /// c-axis tolerance of the patch pass, degrees.
    pub patch_tolerance_deg: f64,
}

impl Default for MicroTextureOptions {
    fn default() -> Self {
        Self {
            tolerance_deg: 5.0,
            use_running_average: true,
            patch_volume_fraction: 0.1,
            patch_tolerance_deg: 15.0,
        }
    }
}

/// Parameters of the cubic twin merging filter.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TwinOptions {
    /// Largest angle between the misorientation axis and `<111>`, degrees.
    pub axis_tolerance_deg: f64,
    /// Largest deviation of the misorientation angle from 60, degrees.
    pub angle_tolerance_deg: f64,
}

impl Default for TwinOptions {
    fn default() -> Self {
        Self {
            axis_tolerance_deg: 1.0,
            angle_tolerance_deg: 1.0,
        }
    }
}
