//! Feature grouping over the feature neighbor graph.
//!
//! [`group_features`] is the generic engine: a [`GroupingStrategy`] seeds each
//! group and decides which neighboring features join it, with an optional
//! patch-growth pass. [`merge_features`] runs it against a [`Volume`] and
//! writes per-voxel `ParentIds`; [`group_by_misorientation`] and
//! [`group_micro_texture`] build the neighbor graph and feature averages
//! from `FeatureIds` first, as does [`merge_twins`] for cubic Σ3 twins.

mod caxis;
mod engine;
mod misorientation;
mod options;
mod parents;
mod seeds;
mod twins;


pub use caxis::{CAxisGrouping, PatchGrowth};
pub use engine::{group_features, Grouping, GroupingStrategy, Worklist};
pub use misorientation::MisorientationGrouping;
pub use options::{GroupOptions, MicroTextureOptions, TwinOptions};
pub use parents::assign_cell_parents;
pub use seeds::FeatureSeeds;
pub use twins::TwinGrouping;

use crate::cancel::CancelToken;
use crate::data::{names, DataArray, NeighborList, Volume};
use crate::error::{ReconError, ReconResult};
use crate::features::{count_features, find_neighbors, FeatureStats};
use crate::randomize::{randomize_ids, time_seed};
use log::{debug, info};
use std::time::Instant;

/// Runs `strategy` over the features of `volume` and stores per-voxel
/// parent ids as `ParentIds`.
///
/// Fails with [`ReconError::NoGroups`] when a completed run formed no group.
pub fn merge_features<G>(
    volume: &mut Volume,
    contiguous: &NeighborList,
    non_contiguous: Option<&NeighborList>,
    strategy: &mut G,
    options: &GroupOptions,
    cancel: &CancelToken,
) -> ReconResult<Grouping>
where
    G: GroupingStrategy + ?Sized,
{
    let start = Instant::now();
    volume.validate()?;
    volume.cell.typed::<i32>(names::FEATURE_IDS, 1)?;
    let mut grouping = group_features(contiguous, non_contiguous, strategy, options, cancel)?;

    if !grouping.cancelled {
        if grouping.active.len() < 2 {
            return Err(ReconError::NoGroups);
        }
        if options.randomize_parent_ids {
            let seed = options.random_seed.unwrap_or_else(time_seed);
            debug!("merge_features: randomizing {} parent ids with seed {seed}", grouping.num_groups());
            randomize_ids(&mut grouping.parent_ids, grouping.active.len(), seed);
        }
    }

    let feature_ids = volume.cell.typed::<i32>(names::FEATURE_IDS, 1)?.as_slice();
    let cell_parents = assign_cell_parents(feature_ids, &grouping.parent_ids);
    volume
        .cell
        .insert(names::PARENT_IDS, DataArray::from_vec(cell_parents, 1))?;
    info!(
        "merge_features: {} groups from {} features in {:.3} ms{}",
        grouping.num_groups(),
        grouping.parent_ids.len(),
        start.elapsed().as_secs_f64() * 1000.0,
        if grouping.cancelled { " (cancelled)" } else { "" }
    );
    Ok(grouping)
}

/// Merges neighboring features whose average orientations are within
/// `tolerance_deg` degrees.
pub fn group_by_misorientation(
    volume: &mut Volume,
    tolerance_deg: f64,
    options: &GroupOptions,
    cancel: &CancelToken,
) -> ReconResult<Grouping> {
    check_angle("tolerance_deg", tolerance_deg)?;
    let (neighbors, stats) = feature_graph(volume)?;
    let structures = volume.crystal_structures.clone();
    let mut strategy = MisorientationGrouping::from_stats(&stats, &structures, tolerance_deg.to_radians())
        .with_seeds(seeds_for(options));
    merge_features(volume, &neighbors, None, &mut strategy, options, cancel)
}

/// Groups hexagonal features into micro-texture regions by c-axis alignment.
pub fn group_micro_texture(
    volume: &mut Volume,
    texture: &MicroTextureOptions,
    options: &GroupOptions,
    cancel: &CancelToken,
) -> ReconResult<Grouping> {
    check_angle("tolerance_deg", texture.tolerance_deg)?;
    check_angle("patch_tolerance_deg", texture.patch_tolerance_deg)?;
    if !(0.0..=1.0).contains(&texture.patch_volume_fraction) {
        return Err(ReconError::InvalidParameter {
            name: "patch_volume_fraction",
            reason: format!("must lie in [0, 1], got {}", texture.patch_volume_fraction),
        });
    }
    let (neighbors, stats) = feature_graph(volume)?;
    let structures = volume.crystal_structures.clone();
    let mut strategy = CAxisGrouping::from_stats(&stats, &structures, texture.tolerance_deg.to_radians())
        .with_running_average(texture.use_running_average)
        .with_seeds(seeds_for(options));
    if options.patch_grouping {
        strategy = strategy.with_patch_growth(PatchGrowth {
            min_volume_fraction: texture.patch_volume_fraction,
            tolerance: texture.patch_tolerance_deg.to_radians(),
        });
    }
    merge_features(volume, &neighbors, None, &mut strategy, options, cancel)
}

/// Merges neighboring cubic features related by a Σ3 twin boundary.
pub fn merge_twins(
    volume: &mut Volume,
    twins: &TwinOptions,
    options: &GroupOptions,
    cancel: &CancelToken,
) -> ReconResult<Grouping> {
    check_angle("axis_tolerance_deg", twins.axis_tolerance_deg)?;
    check_angle("angle_tolerance_deg", twins.angle_tolerance_deg)?;
    let (neighbors, stats) = feature_graph(volume)?;
    let structures = volume.crystal_structures.clone();
    let mut strategy = TwinGrouping::from_stats(
        &stats,
        &structures,
        twins.axis_tolerance_deg.to_radians(),
        twins.angle_tolerance_deg.to_radians(),
    )
    .with_seeds(seeds_for(options));
    merge_features(volume, &neighbors, None, &mut strategy, options, cancel)
}

fn feature_graph(volume: &Volume) -> ReconResult<(NeighborList, FeatureStats)> {
    volume.validate()?;
    let feature_ids = volume.cell.typed::<i32>(names::FEATURE_IDS, 1)?.as_slice();
    let num_features = count_features(feature_ids);
    let neighbors = find_neighbors(&volume.geometry, feature_ids, num_features);
    let stats = FeatureStats::compute(volume, feature_ids, num_features)?;
    Ok((neighbors, stats))
}

fn seeds_for(options: &GroupOptions) -> FeatureSeeds {
    FeatureSeeds::new(options.start_feature).skip_zero(options.exclude_feature_zero)
}

fn check_angle(name: &'static str, degrees: f64) -> ReconResult<()> {
    if degrees.is_finite() && degrees >= 0.0 {
        Ok(())
    } else {
        Err(ReconError::InvalidParameter {
            name,
            reason: format!("must be a finite non-negative angle, got {degrees}"),
        })
    }
}
