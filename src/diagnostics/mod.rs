//! Serializable run reports.
//!
//! `ReconstructionReport` bundles the alignment report, segmentation and
//! grouping summaries and a `TimingBreakdown` with one entry per stage.

pub mod report;
pub mod timing;

pub use report::{GroupingStage, ReconstructionReport, SegmentationStage, VolumeDescriptor};
pub use timing::{StageTiming, TimingBreakdown};
