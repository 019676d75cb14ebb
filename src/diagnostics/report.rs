use super::timing::TimingBreakdown;
use crate::align::AlignmentReport;
use serde::{Deserialize, Serialize};

/// Shape of the processed volume.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VolumeDescriptor {
    pub dims: [usize; 3],
    pub resolution: [f32; 3],
    pub origin: [f32; 3],
    pub good_voxels: usize,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmentationStage {
    pub features: usize,
    pub tolerance: f64,
    pub cancelled: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupingStage {
    pub strategy: String,
    pub features: usize,
    pub groups: usize,
    pub cancelled: bool,
}

/// Everything a reconstruction run reports, ready for JSON output.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconstructionReport {
    pub volume: VolumeDescriptor,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alignment: Option<AlignmentReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub segmentation: Option<SegmentationStage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grouping: Option<GroupingStage>,
    pub timing: TimingBreakdown,
}

impl ReconstructionReport {
    /// True when any stage stopped on a cancellation request.
    pub fn cancelled(&self) -> bool {
        self.alignment.as_ref().is_some_and(|a| a.cancelled)
            || self.segmentation.as_ref().is_some_and(|s| s.cancelled)
            || self.grouping.as_ref().is_some_and(|g| g.cancelled)
    }
}
