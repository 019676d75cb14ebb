//! Feature segmentation by seeded region growing.
//!
//! [`SegmentEngine`] is the generic flood fill: a [`SeedPicker`] chooses
//! where each feature starts and a [`GroupingPredicate`] decides, and
//! records, which face neighbors join it. The filter-level functions below
//! wire the engine to a [`Volume`]:
//!
//! - [`segment_scalar`]: any single-component array, inclusive tolerance.
//! - [`segment_vectors`]: 3-component axes, angular tolerance.
//! - [`segment_misorientation`]: EBSD orientations, misorientation tolerance.
//! - [`segment_c_axis`]: hexagonal orientations, c-axis alignment only.
//!
//! Each writes a fresh `FeatureIds` array (0 = unassigned) into the cell
//! matrix, fails with [`ReconError::NoFeatures`] when nothing was found and
//! optionally shuffles the ids.

mod caxis;
mod ebsd;
mod engine;
mod options;
mod scalar;
mod seeds;
mod vector;


pub use caxis::CAxisComparator;
pub use ebsd::MisorientationComparator;
pub use engine::{FeatureTable, GroupingPredicate, SeedPicker, SegmentEngine};
pub use options::SegmentOptions;
pub use scalar::ScalarComparator;
pub use seeds::VoxelSeeds;
pub use vector::VectorComparator;

use crate::cancel::CancelToken;
use crate::data::{names, DataArray, Volume};
use crate::error::{ReconError, ReconResult};
use crate::orientation::{LaueOps, Misorientation};
use crate::randomize::{randomize_ids, time_seed};
use log::{debug, info};
use std::time::Instant;

/// Segments on a single-component array of any element type.
pub fn segment_scalar(
    volume: &mut Volume,
    array_name: &str,
    options: &SegmentOptions,
    cancel: &CancelToken,
) -> ReconResult<FeatureTable> {
    check_tolerance(options.tolerance)?;
    volume.validate()?;
    let start = Instant::now();
    let array = volume.cell.require(array_name)?;
    if array.components() != 1 {
        return Err(ReconError::ComponentMismatch {
            name: array_name.to_string(),
            expected: 1,
            actual: array.components(),
        });
    }
    let mask = volume.good_voxels(options.use_mask)?;

    let mut feature_ids = vec![0i32; volume.geometry.total_points()];
    let mut seeds = VoxelSeeds::new().with_mask(mask);
    let mut predicate = ScalarComparator::new(array, options.tolerance).with_mask(mask);
    let table = SegmentEngine::new(volume.geometry)
        .with_cancel(cancel)
        .execute(&mut seeds, &mut predicate, &mut feature_ids);

    finish(volume, feature_ids, table, options, "segment_scalar", start)
}

/// Segments on a 3-component `f32` axis array; `options.tolerance` is in
/// degrees.
pub fn segment_vectors(
    volume: &mut Volume,
    array_name: &str,
    options: &SegmentOptions,
    cancel: &CancelToken,
) -> ReconResult<FeatureTable> {
    check_tolerance(options.tolerance)?;
    volume.validate()?;
    let start = Instant::now();
    let vectors = volume.cell.typed::<f32>(array_name, 3)?.as_slice();
    let mask = volume.good_voxels(options.use_mask)?;

    let mut feature_ids = vec![0i32; volume.geometry.total_points()];
    let mut seeds = VoxelSeeds::new().with_mask(mask);
    let mut predicate =
        VectorComparator::new(vectors, options.tolerance.to_radians()).with_mask(mask);
    let table = SegmentEngine::new(volume.geometry)
        .with_cancel(cancel)
        .execute(&mut seeds, &mut predicate, &mut feature_ids);

    finish(volume, feature_ids, table, options, "segment_vectors", start)
}

/// Segments EBSD orientations with the default misorientation provider;
/// `options.tolerance` is in degrees.
pub fn segment_misorientation(
    volume: &mut Volume,
    options: &SegmentOptions,
    cancel: &CancelToken,
) -> ReconResult<FeatureTable> {
    segment_misorientation_with(volume, options, LaueOps, cancel)
}

/// [`segment_misorientation`] with a caller-supplied provider.
pub fn segment_misorientation_with<M: Misorientation>(
    volume: &mut Volume,
    options: &SegmentOptions,
    provider: M,
    cancel: &CancelToken,
) -> ReconResult<FeatureTable> {
    check_tolerance(options.tolerance)?;
    volume.validate()?;
    let start = Instant::now();
    let quats = volume.cell.typed::<f32>(names::QUATS, 4)?.as_slice();
    let phases = volume.cell.typed::<i32>(names::PHASES, 1)?.as_slice();
    let mask = volume.good_voxels(options.use_mask)?;

    let mut feature_ids = vec![0i32; volume.geometry.total_points()];
    let mut seeds = VoxelSeeds::new().with_mask(mask).with_phases(phases);
    let mut predicate = MisorientationComparator::new(
        quats,
        phases,
        &volume.crystal_structures,
        options.tolerance.to_radians(),
    )
    .with_mask(mask)
    .with_provider(provider);
    let table = SegmentEngine::new(volume.geometry)
        .with_cancel(cancel)
        .execute(&mut seeds, &mut predicate, &mut feature_ids);

    finish(volume, feature_ids, table, options, "segment_misorientation", start)
}

/// Segments hexagonal orientations by c-axis alignment; `options.tolerance`
/// is in degrees. Voxels of other crystal structures stay unassigned.
pub fn segment_c_axis(
    volume: &mut Volume,
    options: &SegmentOptions,
    cancel: &CancelToken,
) -> ReconResult<FeatureTable> {
    check_tolerance(options.tolerance)?;
    volume.validate()?;
    let start = Instant::now();
    let quats = volume.cell.typed::<f32>(names::QUATS, 4)?.as_slice();
    let phases = volume.cell.typed::<i32>(names::PHASES, 1)?.as_slice();
    let mask = volume.good_voxels(options.use_mask)?;

    let mut feature_ids = vec![0i32; volume.geometry.total_points()];
    let mut seeds = VoxelSeeds::new().with_mask(mask).with_phases(phases);
    let mut predicate = CAxisComparator::new(
        quats,
        phases,
        &volume.crystal_structures,
        options.tolerance.to_radians(),
    )
    .with_mask(mask);
    let table = SegmentEngine::new(volume.geometry)
        .with_cancel(cancel)
        .execute(&mut seeds, &mut predicate, &mut feature_ids);

    finish(volume, feature_ids, table, options, "segment_c_axis", start)
}

fn check_tolerance(tolerance: f64) -> ReconResult<()> {
    if tolerance.is_finite() && tolerance >= 0.0 {
        Ok(())
    } else {
        Err(ReconError::InvalidParameter {
            name: "tolerance",
            reason: format!("must be a finite non-negative number, got {tolerance}"),
        })
    }
}

fn finish(
    volume: &mut Volume,
    mut feature_ids: Vec<i32>,
    table: FeatureTable,
    options: &SegmentOptions,
    label: &str,
    start: Instant,
) -> ReconResult<FeatureTable> {
    if !table.cancelled {
        if table.len() < 2 {
            return Err(ReconError::NoFeatures);
        }
        if options.randomize_ids {
            let seed = options.random_seed.unwrap_or_else(time_seed);
            debug!("{label}: randomizing {} feature ids with seed {seed}", table.feature_count());
            randomize_ids(&mut feature_ids, table.len(), seed);
        }
    }
    volume
        .cell
        .insert(names::FEATURE_IDS, DataArray::from_vec(feature_ids, 1))?;
    info!(
        "{label}: {} features in {:.3} ms{}",
        table.feature_count(),
        start.elapsed().as_secs_f64() * 1000.0,
        if table.cancelled { " (cancelled)" } else { "" }
    );
    Ok(table)
}
