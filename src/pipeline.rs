//! End-to-end reconstruction: align sections, segment features, group them.

use crate::align::{align_sections, AlignOptions};
use crate::cancel::CancelToken;
use crate::data::{names, Volume};
use crate::diagnostics::{
    GroupingStage, ReconstructionReport, SegmentationStage, TimingBreakdown, VolumeDescriptor,
};
use crate::error::ReconResult;
use crate::group::{
    group_by_misorientation, group_micro_texture, merge_twins, GroupOptions, MicroTextureOptions,
    TwinOptions,
};
use crate::segment::{segment_misorientation, SegmentOptions};
use log::info;
use serde::{Deserialize, Serialize};

/// Which grouping filter runs after segmentation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GroupingMethod {
    /// Merge neighbors whose mean orientations are within `tolerance_deg`.
    Misorientation { tolerance_deg: f64 },
    /// Hexagonal c-axis micro-texture regions.
    MicroTexture(MicroTextureOptions),
    /// Cubic Σ3 twins.
    Twins(TwinOptions),
}

impl Default for GroupingMethod {
    fn default() -> Self {
        Self::Misorientation { tolerance_deg: 5.0 }
    }
}

impl GroupingMethod {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Misorientation { .. } => "misorientation",
            Self::MicroTexture(_) => "micro_texture",
            Self::Twins(_) => "twins",
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupingOptions {
    pub method: GroupingMethod,
    pub options: GroupOptions,
}

/// Stages to run; alignment and grouping are optional.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub align: Option<AlignOptions>,
    pub segment: SegmentOptions,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<GroupingOptions>,
}

/// Runs every configured stage on `volume`, stopping after the first stage
/// that reports cancellation.
pub fn run_reconstruction(
    volume: &mut Volume,
    options: &PipelineOptions,
    cancel: &CancelToken,
) -> ReconResult<ReconstructionReport> {
    let mut report = ReconstructionReport {
        volume: describe(volume),
        alignment: None,
        segmentation: None,
        grouping: None,
        timing: TimingBreakdown::default(),
    };

    if let Some(align) = &options.align {
        let alignment = report
            .timing
            .measure("align_sections", || align_sections(volume, align, cancel))?;
        let cancelled = alignment.cancelled;
        report.alignment = Some(alignment);
        if cancelled {
            return Ok(report);
        }
    }

    let table = report.timing.measure("segment_features", || {
        segment_misorientation(volume, &options.segment, cancel)
    })?;
    report.segmentation = Some(SegmentationStage {
        features: table.feature_count(),
        tolerance: options.segment.tolerance,
        cancelled: table.cancelled,
    });
    if table.cancelled {
        return Ok(report);
    }

    if let Some(group) = &options.group {
        let grouping = report.timing.measure("group_features", || match &group.method {
            GroupingMethod::Misorientation { tolerance_deg } => {
                group_by_misorientation(volume, *tolerance_deg, &group.options, cancel)
            }
            GroupingMethod::MicroTexture(texture) => {
                group_micro_texture(volume, texture, &group.options, cancel)
            }
            GroupingMethod::Twins(twins) => merge_twins(volume, twins, &group.options, cancel),
        })?;
        report.grouping = Some(GroupingStage {
            strategy: group.method.name().to_string(),
            features: grouping.parent_ids.len().saturating_sub(1),
            groups: grouping.num_groups(),
            cancelled: grouping.cancelled,
        });
    }

    info!(
        "run_reconstruction: {} stages in {:.3} ms",
        report.timing.stages.len(),
        report.timing.total_ms
    );
    Ok(report)
}

fn describe(volume: &Volume) -> VolumeDescriptor {
    let good_voxels = volume
        .cell
        .typed::<bool>(names::MASK, 1)
        .map(|mask| mask.as_slice().iter().filter(|&&g| g).count())
        .unwrap_or_else(|_| volume.geometry.total_points());
    VolumeDescriptor {
        dims: volume.geometry.dims,
        resolution: volume.geometry.resolution,
        origin: volume.geometry.origin,
        good_voxels,
    }
}
