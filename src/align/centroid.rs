use crate::geometry::ImageGeometry;

/// Mean physical `(x, y)` of the good voxels of every slice; NaN for slices
/// without good voxels.
pub(crate) fn slice_centroids(geometry: &ImageGeometry, mask: &[bool]) -> Vec<[f64; 2]> {
    let [nx, ny, nz] = geometry.dims;
    let res = geometry.resolution;
    (0..nz)
        .map(|z| {
            let base = z * nx * ny;
            let (mut sx, mut sy, mut count) = (0.0f64, 0.0f64, 0usize);
            for y in 0..ny {
                for x in 0..nx {
                    if mask[base + y * nx + x] {
                        sx += x as f64 * res[0] as f64;
                        sy += y as f64 * res[1] as f64;
                        count += 1;
                    }
                }
            }
            let n = count as f64;
            [sx / n, sy / n]
        })
        .collect()
}

/// Rounded voxel offset between two centroids. NaN components yield 0.
pub(crate) fn centroid_offset(from: [f64; 2], to: [f64; 2], resolution: [f32; 3]) -> [i64; 2] {
    [
        ((to[0] - from[0]) / resolution[0] as f64).round() as i64,
        ((to[1] - from[1]) / resolution[1] as f64).round() as i64,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn centroids_use_physical_units_and_empty_slices_are_nan() {
        let geometry = ImageGeometry::new([4, 2, 2]).with_resolution([0.5, 2.0, 1.0]);
        let mut mask = vec![false; 16];
        mask[3] = true; // (3, 0, 0)
        mask[7] = true; // (3, 1, 0)
        let c = slice_centroids(&geometry, &mask);
        assert_eq!(c[0], [1.5, 1.0]);
        assert!(c[1][0].is_nan() && c[1][1].is_nan());
        assert_eq!(centroid_offset(c[0], c[1], geometry.resolution), [0, 0]);
        assert_eq!(centroid_offset([0.0, 0.0], [1.6, -2.0], geometry.resolution), [3, -1]);
    }
}
