use grain_recon::data::{names, DataArray};
use grain_recon::synthetic::{SyntheticSample, SyntheticVolume};
use grain_recon::{ImageGeometry, Volume};
use std::collections::HashMap;

/// Cell array carrying the generator's grain ids through relocation.
pub const GRAIN_IDS: &str = "GrainIds";

/// Cubic Voronoi grains with the given per-slice offsets; grain ids are
/// stored as [`GRAIN_IDS`].
pub fn misaligned_grains(dims: [usize; 3], offsets: Vec<[i64; 2]>, seed: u64) -> SyntheticSample {
    let mut sample = SyntheticVolume::new(dims)
        .with_grains(8)
        .with_slice_offsets(offsets)
        .with_seed(seed)
        .build()
        .expect("valid synthetic recipe");
    sample
        .volume
        .cell
        .insert(GRAIN_IDS, DataArray::from_vec(sample.grain_ids.clone(), 1))
        .expect("grain ids match the geometry");
    sample
}

/// Masked rectangle `x in 6..17, y in 8..15` translated by `offsets[z]`.
pub fn blob_volume(nx: usize, ny: usize, offsets: &[[i64; 2]]) -> Volume {
    let geometry = ImageGeometry::new([nx, ny, offsets.len()]);
    let mut mask = vec![false; geometry.total_points()];
    for (z, off) in offsets.iter().enumerate() {
        for y in 8..15i64 {
            for x in 6..17i64 {
                mask[geometry.index((x + off[0]) as usize, (y + off[1]) as usize, z)] = true;
            }
        }
    }
    let mut volume = Volume::new(geometry);
    volume
        .cell
        .insert(names::MASK, DataArray::from_vec(mask, 1))
        .expect("mask matches the geometry");
    volume
}

/// Single-slice scalar field: 0 for `x < 2`, 10 elsewhere.
pub fn two_plateaus() -> Volume {
    let geometry = ImageGeometry::new([4, 4, 1]);
    let values: Vec<f32> = (0..16)
        .map(|idx| if idx % 4 < 2 { 0.0 } else { 10.0 })
        .collect();
    let mut volume = Volume::new(geometry);
    volume
        .cell
        .insert("Field", DataArray::from_vec(values, 1))
        .expect("field matches the geometry");
    volume
        .cell
        .insert(names::MASK, DataArray::filled(16, 1, true))
        .expect("mask matches the geometry");
    volume
}

/// True when every label of `labels` (ignoring `<= 0`) covers voxels of a
/// single label of `truth`.
pub fn is_refinement_of(labels: &[i32], truth: &[i32]) -> bool {
    let mut seen: HashMap<i32, i32> = HashMap::new();
    labels.iter().zip(truth).all(|(&label, &t)| {
        label <= 0 || *seen.entry(label).or_insert(t) == t
    })
}
