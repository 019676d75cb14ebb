//! Synthetic EBSD-like volumes with known ground truth.
//!
//! Grains are the Voronoi cells of random seed points, each with one
//! uniformly random orientation. A random fraction of voxels is marked bad,
//! and each slice can be translated in-plane afterwards to emulate a
//! misaligned serial-section stack. Everything is driven by one `u64` seed.

use crate::data::{names, DataArray, Volume};
use crate::error::{ReconError, ReconResult};
use crate::geometry::ImageGeometry;
use crate::orientation::{store_quat, CrystalStructure};
use log::debug;
use nalgebra::{Quaternion, UnitQuaternion};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;

/// Recipe for a synthetic volume.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyntheticVolume {
    pub dims: [usize; 3],
    pub resolution: [f32; 3],
    /// Number of Voronoi seeds.
    pub grains: usize,
    pub crystal_structure: CrystalStructure,
    /// Fraction of voxels marked bad before slices are shifted.
    pub bad_voxel_fraction: f64,
    /// In-plane translation `[dx, dy]` applied to each slice; missing
    /// entries mean no shift.
    pub slice_offsets: Vec<[i64; 2]>,
    pub seed: u64,
}

impl Default for SyntheticVolume {
    fn default() -> Self {
        Self {
            dims: [32, 32, 8],
            resolution: [1.0; 3],
            grains: 12,
            crystal_structure: CrystalStructure::Cubic,
            bad_voxel_fraction: 0.0,
            slice_offsets: Vec::new(),
            seed: 42,
        }
    }
}

/// A generated volume and the grain each voxel was drawn from.
#[derive(Clone, Debug)]
pub struct SyntheticSample {
    pub volume: Volume,
    /// Ground-truth grain id per voxel, 1-based; 0 where the slice shift left
    /// no data.
    pub grain_ids: Vec<i32>,
    /// Orientation of each grain, `x y z w`, index 0 unused.
    pub grain_quats: Vec<f32>,
}

impl SyntheticVolume {
    pub fn new(dims: [usize; 3]) -> Self {
        Self {
            dims,
            ..Self::default()
        }
    }

    pub fn with_grains(mut self, grains: usize) -> Self {
        self.grains = grains;
        self
    }

    pub fn with_structure(mut self, structure: CrystalStructure) -> Self {
        self.crystal_structure = structure;
        self
    }

    pub fn with_bad_fraction(mut self, fraction: f64) -> Self {
        self.bad_voxel_fraction = fraction;
        self
    }

    pub fn with_slice_offsets(mut self, offsets: Vec<[i64; 2]>) -> Self {
        self.slice_offsets = offsets;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    fn validate(&self) -> ReconResult<()> {
        if self.dims.iter().any(|&d| d == 0) {
            return Err(ReconError::InvalidParameter {
                name: "dims",
                reason: format!("every dimension must be positive, got {:?}", self.dims),
            });
        }
        if self.grains == 0 {
            return Err(ReconError::InvalidParameter {
                name: "grains",
                reason: "at least one grain is required".to_string(),
            });
        }
        if !(0.0..=1.0).contains(&self.bad_voxel_fraction) {
            return Err(ReconError::InvalidParameter {
                name: "bad_voxel_fraction",
                reason: format!("must lie in [0, 1], got {}", self.bad_voxel_fraction),
            });
        }
        Ok(())
    }

    /// Generates `Quats`, `Phases` and `Mask` cell arrays.
    pub fn build(&self) -> ReconResult<SyntheticSample> {
        self.validate()?;
        let geometry = ImageGeometry::new(self.dims).with_resolution(self.resolution);
        let [nx, ny, nz] = self.dims;
        let n = geometry.total_points();
        let mut rng = StdRng::seed_from_u64(self.seed);

        let centers: Vec<[f64; 3]> = (0..self.grains)
            .map(|_| {
                [
                    rng.gen::<f64>() * nx as f64,
                    rng.gen::<f64>() * ny as f64,
                    rng.gen::<f64>() * nz as f64,
                ]
            })
            .collect();
        let mut grain_quats = vec![0.0f32; (self.grains + 1) * 4];
        for g in 1..=self.grains {
            store_quat(&mut grain_quats, g, &random_orientation(&mut rng));
        }

        let mut grain_ids = vec![0i32; n];
        for (idx, id) in grain_ids.iter_mut().enumerate() {
            let [x, y, z] = geometry.coords(idx);
            let p = [x as f64 + 0.5, y as f64 + 0.5, z as f64 + 0.5];
            let nearest = centers
                .iter()
                .enumerate()
                .map(|(g, c)| (g, (0..3).map(|k| (p[k] - c[k]).powi(2)).sum::<f64>()))
                .min_by(|a, b| a.1.total_cmp(&b.1))
                .map_or(0, |(g, _)| g);
            *id = nearest as i32 + 1;
        }
        let mut good: Vec<bool> = (0..n)
            .map(|_| rng.gen::<f64>() >= self.bad_voxel_fraction)
            .collect();

        let plane = nx * ny;
        for z in 0..nz {
            let [dx, dy] = self.slice_offsets.get(z).copied().unwrap_or([0, 0]);
            if dx == 0 && dy == 0 {
                continue;
            }
            let ids = grain_ids[z * plane..(z + 1) * plane].to_vec();
            let mask = good[z * plane..(z + 1) * plane].to_vec();
            for y in 0..ny {
                for x in 0..nx {
                    let (sx, sy) = (x as i64 - dx, y as i64 - dy);
                    let dst = z * plane + y * nx + x;
                    if sx < 0 || sy < 0 || sx >= nx as i64 || sy >= ny as i64 {
                        grain_ids[dst] = 0;
                        good[dst] = false;
                    } else {
                        let src = sy as usize * nx + sx as usize;
                        grain_ids[dst] = ids[src];
                        good[dst] = mask[src];
                    }
                }
            }
        }

        let mut quats = vec![0.0f32; n * 4];
        let mut phases = vec![0i32; n];
        for idx in 0..n {
            let g = grain_ids[idx] as usize;
            if g == 0 || !good[idx] {
                continue;
            }
            quats[idx * 4..idx * 4 + 4].copy_from_slice(&grain_quats[g * 4..g * 4 + 4]);
            phases[idx] = 1;
        }

        let mut volume = Volume::new(geometry)
            .with_crystal_structures(vec![CrystalStructure::Unknown, self.crystal_structure]);
        volume.cell.insert(names::QUATS, DataArray::from_vec(quats, 4))?;
        volume.cell.insert(names::PHASES, DataArray::from_vec(phases, 1))?;
        volume.cell.insert(names::MASK, DataArray::from_vec(good, 1))?;
        debug!(
            "SyntheticVolume: {}x{}x{} voxels, {} grains, seed {}",
            nx, ny, nz, self.grains, self.seed
        );
        Ok(SyntheticSample {
            volume,
            grain_ids,
            grain_quats,
        })
    }
}

/// Uniformly distributed rotation (Shoemake's method).
pub fn random_orientation(rng: &mut StdRng) -> UnitQuaternion<f64> {
    let (u1, u2, u3): (f64, f64, f64) = (rng.gen(), rng.gen(), rng.gen());
    let (a, b) = ((1.0 - u1).sqrt(), u1.sqrt());
    let q = Quaternion::new(
        b * (TAU * u3).cos(),
        a * (TAU * u2).sin(),
        a * (TAU * u2).cos(),
        b * (TAU * u3).sin(),
    );
    UnitQuaternion::new_normalize(q)
}
