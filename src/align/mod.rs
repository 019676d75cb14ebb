//! Section alignment: per-slice rigid integer shifts.
//!
//! [`align_sections`] runs `compute shifts -> relocate voxels`. Slice 0 is
//! the anchor and every slice `z >= 1` is registered against slice `z - 1`;
//! the resulting cumulative table is applied to every array of the cell
//! matrix so that `dest(z, y, x) = src(z, y + dy[z], x + dx[z])`, resetting
//! tuples whose source lies outside the slice.
//!
//! Shift strategies ([`AlignmentMethod`]):
//!
//! - `List`: read from a shift file.
//! - `Centroid`: track the centroid of good voxels.
//! - `Misorientation` / `MaskMismatch`: greedy 7x7 window search on a
//!   coarse sample grid minimising the fraction of disagreeing pairs.
//! - `MutualInformation`: the same search minimising `1 / MI` between
//!   per-slice feature labels.
//!
//! A cancelled run returns the shifts found so far and never relocates.

mod centroid;
mod list;
mod mismatch;
mod mutual_info;
mod options;
mod relocate;
mod search;
mod shift_log;

#[cfg(test)]
mod tests;

pub use mutual_info::JointHistogram;
pub use options::{AlignOptions, AlignmentMethod, ShiftFileFormat, ShiftValues};

use crate::cancel::CancelToken;
use crate::data::{names, Volume};
use crate::error::{ReconError, ReconResult};
use crate::orientation::{LaueOps, Misorientation};
use crate::segment::{MisorientationComparator, SegmentEngine, VoxelSeeds};
use log::{debug, info, warn};
use mismatch::OrientationField;
use search::{SearchResult, ShiftSearch};
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Shift found for one slice transition.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SliceShift {
    pub reference: usize,
    pub moving: usize,
    pub dx: i64,
    pub dy: i64,
    pub cumulative_dx: i64,
    pub cumulative_dy: i64,
    /// Method-specific values appended to the shift log.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extras: Vec<f64>,
}

/// Outcome of [`align_sections`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlignmentReport {
    pub method: String,
    /// Cumulative `[dx, dy]` per slice; `shifts[0] == [0, 0]`.
    pub shifts: Vec<[i64; 2]>,
    pub transitions: Vec<SliceShift>,
    pub elapsed_ms: f64,
    pub cancelled: bool,
}

struct ShiftTable {
    shifts: Vec<[i64; 2]>,
    transitions: Vec<SliceShift>,
    cancelled: bool,
}

impl ShiftTable {
    fn new(nz: usize) -> Self {
        let mut shifts = Vec::with_capacity(nz);
        shifts.push([0, 0]);
        Self {
            shifts,
            transitions: Vec::with_capacity(nz.saturating_sub(1)),
            cancelled: false,
        }
    }

    fn cancelled(mut self) -> Self {
        self.cancelled = true;
        self
    }

    /// Appends the cumulative shift of slice `moving`.
    fn push(&mut self, reference: usize, moving: usize, cumulative: [i64; 2], extras: Vec<f64>) {
        let prev = self.shifts[self.shifts.len() - 1];
        self.shifts.push(cumulative);
        self.transitions.push(SliceShift {
            reference,
            moving,
            dx: cumulative[0] - prev[0],
            dy: cumulative[1] - prev[1],
            cumulative_dx: cumulative[0],
            cumulative_dy: cumulative[1],
            extras,
        });
    }
}

/// Aligns the slices of `volume` in place with the default misorientation
/// provider.
pub fn align_sections(
    volume: &mut Volume,
    options: &AlignOptions,
    cancel: &CancelToken,
) -> ReconResult<AlignmentReport> {
    align_sections_with(volume, options, &LaueOps, cancel)
}

/// [`align_sections`] with a caller-supplied misorientation provider.
pub fn align_sections_with<M: Misorientation>(
    volume: &mut Volume,
    options: &AlignOptions,
    provider: &M,
    cancel: &CancelToken,
) -> ReconResult<AlignmentReport> {
    let start = Instant::now();
    let geometry = volume.geometry;
    geometry.require_3d()?;
    volume.validate()?;
    validate(options, geometry.nz())?;

    let table = compute_shifts(volume, options, provider, cancel)?;
    let mut report = AlignmentReport {
        method: options.method.name().to_string(),
        shifts: table.shifts,
        transitions: table.transitions,
        elapsed_ms: 0.0,
        cancelled: table.cancelled,
    };
    if report.cancelled {
        report.elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;
        info!(
            "align_sections[{}]: cancelled after {} transitions",
            report.method,
            report.transitions.len()
        );
        return Ok(report);
    }

    if options.write_shift_log {
        if let Some(path) = options.shift_log_path.as_deref() {
            shift_log::write_shift_log(path, &report.transitions)?;
            debug!("align_sections: wrote shift log {}", path.display());
        }
    }

    relocate::relocate(&mut volume.cell, &geometry, &report.shifts);
    report.elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;
    info!(
        "align_sections[{}]: {} slices, {} arrays relocated in {:.3} ms",
        report.method,
        geometry.nz(),
        volume.cell.len(),
        report.elapsed_ms
    );
    Ok(report)
}

fn validate(options: &AlignOptions, nz: usize) -> ReconResult<()> {
    if options.write_shift_log && options.shift_log_path.is_none() {
        return Err(ReconError::MissingShiftLogPath);
    }
    if options.sample_stride == 0 {
        return Err(ReconError::InvalidParameter {
            name: "sample_stride",
            reason: "must be at least 1".to_string(),
        });
    }
    if !(options.tolerance_deg.is_finite() && options.tolerance_deg >= 0.0) {
        return Err(ReconError::InvalidParameter {
            name: "tolerance_deg",
            reason: format!("must be a finite non-negative angle, got {}", options.tolerance_deg),
        });
    }
    if let AlignmentMethod::Centroid {
        reference_slice: Some(slice),
    } = &options.method
    {
        if *slice >= nz {
            return Err(ReconError::InvalidReferenceSlice { slice: *slice, nz });
        }
    }
    Ok(())
}

fn compute_shifts<M: Misorientation>(
    volume: &Volume,
    options: &AlignOptions,
    provider: &M,
    cancel: &CancelToken,
) -> ReconResult<ShiftTable> {
    let geometry = volume.geometry;
    let [nx, ny, nz] = geometry.dims;
    let plane = geometry.slice_len();

    match &options.method {
        AlignmentMethod::List {
            path,
            format,
            values,
        } => {
            let shifts = list::read_shift_file(path, *format, *values, nz - 1)?;
            let mut table = ShiftTable::new(nz);
            for (z, &shift) in shifts.iter().enumerate().skip(1) {
                table.push(z - 1, z, shift, Vec::new());
            }
            Ok(table)
        }
        AlignmentMethod::Centroid { reference_slice } => {
            let mask = volume.cell.typed::<bool>(names::MASK, 1)?.as_slice();
            let centroids = centroid::slice_centroids(&geometry, mask);
            for (z, c) in centroids.iter().enumerate() {
                if c[0].is_nan() || c[1].is_nan() {
                    warn!("align_sections[centroid]: slice {z} has no good voxels; its offset is taken as zero");
                }
            }
            let mut table = ShiftTable::new(nz);
            for z in 1..nz {
                if cancel.is_cancelled() {
                    return Ok(table.cancelled());
                }
                let anchor = reference_slice.unwrap_or(z - 1);
                let offset =
                    centroid::centroid_offset(centroids[anchor], centroids[z], geometry.resolution);
                let cumulative = match reference_slice {
                    Some(_) => offset,
                    None => {
                        let prev = table.shifts[z - 1];
                        [prev[0] + offset[0], prev[1] + offset[1]]
                    }
                };
                let extras = vec![
                    centroids[anchor][0],
                    centroids[anchor][1],
                    centroids[z][0],
                    centroids[z][1],
                ];
                table.push(z - 1, z, cumulative, extras);
            }
            Ok(table)
        }
        AlignmentMethod::Misorientation => {
            let field = OrientationField {
                quats: volume.cell.typed::<f32>(names::QUATS, 4)?.as_slice(),
                phases: volume.cell.typed::<i32>(names::PHASES, 1)?.as_slice(),
                structures: &volume.crystal_structures,
                mask: volume.good_voxels(options.use_mask)?,
                tolerance: options.tolerance_deg.to_radians(),
                provider,
            };
            let mut search = ShiftSearch::new(nx, ny, options.sample_stride);
            Ok(chain_search(nz, cancel, false, |z| {
                search.run(|s, dx, dy| {
                    mismatch::misorientation_score(&field, s, z - 1, z, plane, dx, dy)
                })
            }))
        }
        AlignmentMethod::MaskMismatch => {
            let mask = volume.cell.typed::<bool>(names::MASK, 1)?.as_slice();
            let mut search = ShiftSearch::new(nx, ny, options.sample_stride);
            Ok(chain_search(nz, cancel, false, |z| {
                search.run(|s, dx, dy| mismatch::mask_score(mask, s, z - 1, z, plane, dx, dy))
            }))
        }
        AlignmentMethod::MutualInformation => {
            let Some(labels) = label_slices(volume, options, provider, cancel)? else {
                return Ok(ShiftTable::new(nz).cancelled());
            };
            let mut search = ShiftSearch::new(nx, ny, options.sample_stride);
            Ok(chain_search(nz, cancel, true, |z| {
                let (reference, moving) = (&labels[z - 1], &labels[z]);
                let mut histogram = JointHistogram::new(reference.count, moving.count);
                search.run(|s, dx, dy| {
                    mutual_info::mutual_information_score(
                        &mut histogram,
                        s,
                        &reference.ids,
                        &moving.ids,
                        dx,
                        dy,
                    )
                })
            }))
        }
    }
}

/// Runs `search_slice(z)` for every slice `z >= 1` and chains the results.
fn chain_search(
    nz: usize,
    cancel: &CancelToken,
    log_score: bool,
    mut search_slice: impl FnMut(usize) -> SearchResult,
) -> ShiftTable {
    let mut table = ShiftTable::new(nz);
    for z in 1..nz {
        if cancel.is_cancelled() {
            return table.cancelled();
        }
        let result = search_slice(z);
        let prev = table.shifts[z - 1];
        debug!(
            "align_sections: slice {} -> {} shift ({}, {}) score {:.5} from {} candidates",
            z - 1,
            z,
            result.dx,
            result.dy,
            result.score,
            result.evaluated
        );
        let extras = if log_score { vec![result.score] } else { Vec::new() };
        table.push(z - 1, z, [prev[0] + result.dx, prev[1] + result.dy], extras);
    }
    table
}

/// Local feature labels of one slice.
struct SliceLabels {
    ids: Vec<i32>,
    /// Label table size (features + 1).
    count: usize,
}

/// Segments every slice independently with a 4-connected misorientation
/// flood fill. `None` when cancelled.
fn label_slices<M: Misorientation>(
    volume: &Volume,
    options: &AlignOptions,
    provider: &M,
    cancel: &CancelToken,
) -> ReconResult<Option<Vec<SliceLabels>>> {
    let geometry = volume.geometry;
    let plane = geometry.slice_len();
    let quats = volume.cell.typed::<f32>(names::QUATS, 4)?.as_slice();
    let phases = volume.cell.typed::<i32>(names::PHASES, 1)?.as_slice();
    let mask = volume.good_voxels(options.use_mask)?;
    let engine = SegmentEngine::new(geometry.slice_geometry()).with_cancel(cancel);

    let mut labels = Vec::with_capacity(geometry.nz());
    for z in 0..geometry.nz() {
        if cancel.is_cancelled() {
            return Ok(None);
        }
        let offset = z * plane;
        let mut ids = vec![0i32; plane];
        let mut seeds = VoxelSeeds::new()
            .with_mask(mask)
            .with_phases(phases)
            .with_offset(offset);
        let mut predicate = MisorientationComparator::new(
            quats,
            phases,
            &volume.crystal_structures,
            options.tolerance_deg.to_radians(),
        )
        .with_mask(mask)
        .with_offset(offset)
        .with_provider(provider);
        let table = engine.execute(&mut seeds, &mut predicate, &mut ids);
        if table.cancelled {
            return Ok(None);
        }
        debug!("align_sections[mutual_information]: slice {z} has {} features", table.feature_count());
        labels.push(SliceLabels {
            ids,
            count: table.len(),
        });
    }
    Ok(Some(labels))
}
