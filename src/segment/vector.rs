use super::engine::GroupingPredicate;
use super::scalar::mask_allows;
use nalgebra::Vector3;
use std::f64::consts::{FRAC_PI_2, PI};

/// Groups neighbors whose 3-component axes are within an angular tolerance.
///
/// Vectors are treated as undirected axes: each is flipped into the `z >= 0`
/// hemisphere and angles above 90 degrees fold to `pi - angle`.
#[derive(Clone, Copy, Debug)]
pub struct VectorComparator<'a> {
    vectors: &'a [f32],
    tolerance: f64,
    mask: Option<&'a [bool]>,
}

impl<'a> VectorComparator<'a> {
    /// `vectors` holds 3 components per voxel; `tolerance` is in radians.
    pub fn new(vectors: &'a [f32], tolerance: f64) -> Self {
        Self {
            vectors,
            tolerance,
            mask: None,
        }
    }

    pub fn with_mask(mut self, mask: Option<&'a [bool]>) -> Self {
        self.mask = mask;
        self
    }

    fn axis(&self, idx: usize) -> Vector3<f64> {
        let v = &self.vectors[idx * 3..idx * 3 + 3];
        let axis = Vector3::new(v[0] as f64, v[1] as f64, v[2] as f64);
        if axis.z < 0.0 {
            -axis
        } else {
            axis
        }
    }

    /// Folded angle between the axes at two voxels, NaN for zero vectors.
    pub fn angle(&self, a: usize, b: usize) -> f64 {
        let (v1, v2) = (self.axis(a), self.axis(b));
        let cos = (v1.dot(&v2) / (v1.norm() * v2.norm())).clamp(-1.0, 1.0);
        let w = cos.acos();
        if w > FRAC_PI_2 {
            PI - w
        } else {
            w
        }
    }
}

impl GroupingPredicate for VectorComparator<'_> {
    fn determine_grouping(
        &mut self,
        reference: usize,
        neighbor: usize,
        feature_id: i32,
        feature_ids: &mut [i32],
    ) -> bool {
        if feature_ids[neighbor] != 0 || !mask_allows(self.mask, neighbor) {
            return false;
        }
        // NaN (zero-length axis) never compares below the tolerance.
        if self.angle(reference, neighbor) < self.tolerance {
            feature_ids[neighbor] = feature_id;
            true
        } else {
            false
        }
    }
}
