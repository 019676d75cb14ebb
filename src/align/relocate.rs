use crate::data::{AttributeArray, AttributeMatrix};
use crate::geometry::ImageGeometry;
#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Moves every tuple of every array so that `dest(z, y, x)` takes
/// `src(z, y + shifts[z][1], x + shifts[z][0])`; tuples whose source falls
/// outside the slice are reset to zero.
pub(crate) fn relocate(cell: &mut AttributeMatrix, geometry: &ImageGeometry, shifts: &[[i64; 2]]) {
    let arrays = cell.arrays_mut();
    #[cfg(feature = "parallel")]
    {
        arrays
            .par_iter_mut()
            .for_each(|(_, array)| relocate_array(array, geometry, shifts));
    }
    #[cfg(not(feature = "parallel"))]
    {
        arrays
            .values_mut()
            .for_each(|array| relocate_array(array, geometry, shifts));
    }
}

/// In-place relocation of one array. Each axis is walked in the direction of
/// its shift, so a source tuple is always read before it is overwritten.
pub(crate) fn relocate_array(array: &mut AttributeArray, geometry: &ImageGeometry, shifts: &[[i64; 2]]) {
    let [nx, ny, nz] = geometry.dims;
    let (nxi, nyi) = (nx as i64, ny as i64);
    for z in (0..nz).rev() {
        let Some(&[sx, sy]) = shifts.get(z) else {
            continue;
        };
        if sx == 0 && sy == 0 {
            continue;
        }
        let base = z * nx * ny;
        for l in 0..ny {
            let y = if sy >= 0 { l } else { ny - 1 - l };
            for n in 0..nx {
                let x = if sx >= 0 { n } else { nx - 1 - n };
                let dst = base + y * nx + x;
                let (src_y, src_x) = (y as i64 + sy, x as i64 + sx);
                if (0..nyi).contains(&src_y) && (0..nxi).contains(&src_x) {
                    array.copy_tuple(base + (src_y * nxi + src_x) as usize, dst);
                } else {
                    array.reset_tuple(dst);
                }
            }
        }
    }
}
