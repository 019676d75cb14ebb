use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Column layout of a shift file.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShiftFileFormat {
    /// `slice dx dy`
    #[default]
    Plain,
    /// `slice slice2 dx dy xShift yShift`, as written by the shift log.
    Dream3d,
}

/// How the numbers in a shift file relate to the shift table.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShiftValues {
    /// Per-transition deltas, summed into cumulative shifts.
    #[default]
    Incremental,
    /// Cumulative shifts used verbatim. For [`ShiftFileFormat::Dream3d`] the
    /// trailing `xShift yShift` columns are read and rounded.
    Cumulative,
}

/// Strategy used to compute per-slice shifts.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AlignmentMethod {
    /// Shifts read from a text file, one line per slice transition.
    List {
        path: PathBuf,
        #[serde(default)]
        format: ShiftFileFormat,
        #[serde(default)]
        values: ShiftValues,
    },
    /// Track the centroid of good voxels, chained or anchored to one slice.
    Centroid {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reference_slice: Option<usize>,
    },
    /// Greedy search minimising the fraction of misoriented sample pairs.
    #[default]
    Misorientation,
    /// Greedy search minimising the fraction of good/bad disagreements.
    MaskMismatch,
    /// Greedy search maximising mutual information of per-slice labels.
    MutualInformation,
}

impl AlignmentMethod {
    pub fn name(&self) -> &'static str {
        match self {
            Self::List { .. } => "list",
            Self::Centroid { .. } => "centroid",
            Self::Misorientation => "misorientation",
            Self::MaskMismatch => "mask_mismatch",
            Self::MutualInformation => "mutual_information",
        }
    }
}

/// Parameters of [`super::align_sections`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlignOptions {
    pub method: AlignmentMethod,
    /// Honour the `Mask` array while scoring (and seeding slice labels).
    pub use_mask: bool,
    /// Misorientation tolerance in degrees.
    pub tolerance_deg: f64,
    /// In-plane sampling stride of the shift search.
    pub sample_stride: usize,
    pub write_shift_log: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shift_log_path: Option<PathBuf>,
}

impl Default for AlignOptions {
    fn default() -> Self {
        Self {
            method: AlignmentMethod::default(),
            use_mask: false,
            tolerance_deg: 5.0,
            sample_stride: 4,
            write_shift_log: false,
            shift_log_path: None,
        }
    }
}

impl AlignOptions {
    pub fn new(method: AlignmentMethod) -> Self {
        Self {
            method,
            ..Self::default()
        }
    }

    pub fn with_mask(mut self, use_mask: bool) -> Self {
        self.use_mask = use_mask;
        self
    }

    pub fn with_stride(mut self, stride: usize) -> Self {
        self.sample_stride = stride;
        self
    }

    pub fn with_shift_log(mut self, path: impl Into<PathBuf>) -> Self {
        self.write_shift_log = true;
        self.shift_log_path = Some(path.into());
        self
    }
}
