//! Output helpers: JSON reports and per-slice PNG snapshots.
//!
//! - `write_json_file`: pretty-print a serializable value to disk.
//! - `save_label_slice`: write one z-slice of an id array as a grayscale PNG.
//! - `save_mask_slice`: write one z-slice of a mask as a black/white PNG.

use crate::error::{ReconError, ReconResult};
use crate::geometry::ImageGeometry;
use image::{GrayImage, Luma};
use serde::Serialize;
use std::fs;
use std::path::Path;

/// Serialize a value as pretty JSON to `path`, creating parent directories.
pub fn write_json_file<T: Serialize>(path: &Path, value: &T) -> ReconResult<()> {
    ensure_parent_dir(path)?;
    let json = serde_json::to_string_pretty(value).map_err(|e| ReconError::io(path, e.into()))?;
    fs::write(path, json).map_err(|e| ReconError::io(path, e))
}

/// Save slice `z` of a per-voxel id array. Id 0 is black; other ids get a
/// scrambled gray level so neighboring ids stay distinguishable.
pub fn save_label_slice(path: &Path, geometry: &ImageGeometry, ids: &[i32], z: usize) -> ReconResult<()> {
    save_slice(path, geometry, z, |idx| {
        let id = ids.get(idx).copied().unwrap_or(0);
        if id <= 0 {
            0
        } else {
            (64 + (id as u32).wrapping_mul(2_654_435_761) % 192) as u8
        }
    })
}

/// Save slice `z` of a mask: good voxels white, bad voxels black.
pub fn save_mask_slice(path: &Path, geometry: &ImageGeometry, mask: &[bool], z: usize) -> ReconResult<()> {
    save_slice(path, geometry, z, |idx| {
        if mask.get(idx).copied().unwrap_or(false) {
            255
        } else {
            0
        }
    })
}

fn save_slice(
    path: &Path,
    geometry: &ImageGeometry,
    z: usize,
    shade: impl Fn(usize) -> u8,
) -> ReconResult<()> {
    if z >= geometry.nz() {
        return Err(ReconError::InvalidParameter {
            name: "z",
            reason: format!("slice {z} is outside the volume (0..{})", geometry.nz()),
        });
    }
    ensure_parent_dir(path)?;
    let (nx, ny) = (geometry.nx(), geometry.ny());
    let mut out = GrayImage::new(nx as u32, ny as u32);
    for y in 0..ny {
        for x in 0..nx {
            out.put_pixel(x as u32, y as u32, Luma([shade(geometry.index(x, y, z))]));
        }
    }
    out.save(path)
        .map_err(|e| ReconError::io(path, std::io::Error::other(e)))
}

pub(crate) fn ensure_parent_dir(path: &Path) -> ReconResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|e| ReconError::io(parent, e))?;
        }
    }
    Ok(())
}
