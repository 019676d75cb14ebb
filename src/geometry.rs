//! Regular 3D image geometry.
//!
//! Voxels are stored x-fastest: the flat index of `(x, y, z)` is
//! `z * nx * ny + y * nx + x`. Resolution is only used where a physical
//! position is needed (centroids); every engine otherwise works in voxel
//! units. The origin is only reported.

use crate::error::{ReconError, ReconResult};
use serde::{Deserialize, Serialize};

/// Dimensions, spacing and origin of a voxel grid.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ImageGeometry {
    /// Voxel counts along x, y and z.
    pub dims: [usize; 3],
    /// Physical voxel size along x, y and z.
    pub resolution: [f32; 3],
    /// Physical position of voxel `(0, 0, 0)`.
    pub origin: [f32; 3],
}

impl Default for ImageGeometry {
    fn default() -> Self {
        Self::new([1, 1, 1])
    }
}

impl ImageGeometry {
    /// Geometry with unit resolution and zero origin.
    pub fn new(dims: [usize; 3]) -> Self {
        Self {
            dims,
            resolution: [1.0; 3],
            origin: [0.0; 3],
        }
    }

    pub fn with_resolution(mut self, resolution: [f32; 3]) -> Self {
        self.resolution = resolution;
        self
    }

    #[inline]
    pub fn nx(&self) -> usize {
        self.dims[0]
    }

    #[inline]
    pub fn ny(&self) -> usize {
        self.dims[1]
    }

    #[inline]
    pub fn nz(&self) -> usize {
        self.dims[2]
    }

    /// Voxels in one z-slice.
    #[inline]
    pub fn slice_len(&self) -> usize {
        self.dims[0] * self.dims[1]
    }

    /// Total number of voxels.
    #[inline]
    pub fn total_points(&self) -> usize {
        self.dims[0] * self.dims[1] * self.dims[2]
    }

    /// Flat index of `(x, y, z)`.
    #[inline]
    pub fn index(&self, x: usize, y: usize, z: usize) -> usize {
        z * self.slice_len() + y * self.dims[0] + x
    }

    /// Decomposes a flat index into `(x, y, z)`.
    #[inline]
    pub fn coords(&self, idx: usize) -> [usize; 3] {
        let nx = self.dims[0];
        let ny = self.dims[1];
        [idx % nx, (idx / nx) % ny, idx / (nx * ny)]
    }

    /// Geometry of a single z-slice (`nz == 1`) with the same in-plane layout.
    pub fn slice_geometry(&self) -> Self {
        Self {
            dims: [self.dims[0], self.dims[1], 1],
            resolution: self.resolution,
            origin: self.origin,
        }
    }

    /// True when every dimension holds more than one voxel.
    pub fn is_3d(&self) -> bool {
        self.dims.iter().all(|&d| d > 1)
    }

    /// Fails with [`ReconError::NotThreeDimensional`] unless [`Self::is_3d`].
    pub fn require_3d(&self) -> ReconResult<()> {
        if self.is_3d() {
            Ok(())
        } else {
            Err(ReconError::NotThreeDimensional {
                nx: self.dims[0],
                ny: self.dims[1],
                nz: self.dims[2],
            })
        }
    }
}
