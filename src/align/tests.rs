use super::*;
use crate::data::DataArray;
use crate::geometry::ImageGeometry;
use crate::orientation::{store_quat, CrystalStructure};
use nalgebra::UnitQuaternion;
use std::path::PathBuf;

const BLOCK: usize = 6;

/// Volume whose slice `z` shows a block pattern translated by `offsets[z]`.
/// Voxels uncovered by the translation are bad (phase 0, mask false).
fn block_volume(nx: usize, ny: usize, offsets: &[[i64; 2]]) -> Volume {
    let geometry = ImageGeometry::new([nx, ny, offsets.len()]);
    let n = geometry.total_points();
    let mut quats = vec![0.0f32; n * 4];
    let mut phases = vec![0i32; n];
    let mut mask = vec![false; n];
    let mut block_id = vec![0i32; n];
    for (z, off) in offsets.iter().enumerate() {
        for y in 0..ny {
            for x in 0..nx {
                let idx = geometry.index(x, y, z);
                let (sx, sy) = (x as i64 - off[0], y as i64 - off[1]);
                if sx < 0 || sy < 0 || sx >= nx as i64 || sy >= ny as i64 {
                    continue;
                }
                let (bx, by) = (sx as usize / BLOCK, sy as usize / BLOCK);
                let q = UnitQuaternion::from_euler_angles(
                    0.37 * bx as f64 + 0.11 * by as f64,
                    0.53 * by as f64 + 0.05,
                    0.29 * (bx * by) as f64 + 0.2,
                );
                store_quat(&mut quats, idx, &q);
                phases[idx] = 1;
                mask[idx] = true;
                block_id[idx] = (1 + by * nx + bx) as i32;
            }
        }
    }
    let mut volume = Volume::new(geometry)
        .with_crystal_structures(vec![CrystalStructure::Unknown, CrystalStructure::Triclinic]);
    volume.cell.insert(names::QUATS, DataArray::from_vec(quats, 4)).unwrap();
    volume.cell.insert(names::PHASES, DataArray::from_vec(phases, 1)).unwrap();
    volume.cell.insert(names::MASK, DataArray::from_vec(mask, 1)).unwrap();
    volume.cell.insert("BlockId", DataArray::from_vec(block_id, 1)).unwrap();
    volume
}

/// Volume with a rectangle of good voxels translated by `offsets[z]`.
fn blob_volume(nx: usize, ny: usize, offsets: &[[i64; 2]]) -> Volume {
    let geometry = ImageGeometry::new([nx, ny, offsets.len()]);
    let mut mask = vec![false; geometry.total_points()];
    for (z, off) in offsets.iter().enumerate() {
        for y in 8..15i64 {
            for x in 6..17i64 {
                let (px, py) = ((x + off[0]) as usize, (y + off[1]) as usize);
                mask[geometry.index(px, py, z)] = true;
            }
        }
    }
    let mut volume = Volume::new(geometry);
    volume.cell.insert(names::MASK, DataArray::from_vec(mask, 1)).unwrap();
    volume
}

fn slice_of<T: crate::data::Element>(volume: &Volume, name: &str, z: usize) -> Vec<T> {
    let plane = volume.geometry.slice_len();
    volume.cell.typed::<T>(name, 1).unwrap().as_slice()[z * plane..(z + 1) * plane].to_vec()
}

fn temp_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("grain_recon_{}_{name}", std::process::id()))
}

#[test]
fn centroid_recovers_baked_offsets() {
    let offsets = [[0, 0], [2, -1], [0, 3]];
    let mut volume = blob_volume(24, 24, &offsets);
    let options = AlignOptions::new(AlignmentMethod::Centroid {
        reference_slice: None,
    });
    let report = align_sections(&mut volume, &options, &CancelToken::new()).unwrap();
    assert_eq!(report.shifts, vec![[0, 0], [2, -1], [0, 3]]);
    assert_eq!(report.transitions[1].dx, -2);
    assert_eq!(report.transitions[1].dy, 4);
    assert_eq!(report.transitions[1].extras.len(), 4);

    let reference: Vec<bool> = slice_of(&volume, names::MASK, 0);
    for z in 1..3 {
        assert_eq!(slice_of::<bool>(&volume, names::MASK, z), reference, "slice {z}");
    }
}

#[test]
fn centroid_can_anchor_to_one_slice() {
    let offsets = [[0, 0], [2, -1], [0, 3]];
    let mut volume = blob_volume(24, 24, &offsets);
    let options = AlignOptions::new(AlignmentMethod::Centroid {
        reference_slice: Some(1),
    });
    let report = align_sections(&mut volume, &options, &CancelToken::new()).unwrap();
    // Slice 0 keeps no shift; the others are measured against slice 1.
    assert_eq!(report.shifts, vec![[0, 0], [0, 0], [-2, 4]]);

    let bad = AlignOptions::new(AlignmentMethod::Centroid {
        reference_slice: Some(3),
    });
    let err = align_sections(&mut volume, &bad, &CancelToken::new()).unwrap_err();
    assert!(matches!(err, ReconError::InvalidReferenceSlice { slice: 3, nz: 3 }));
}

#[test]
fn misorientation_search_recovers_offsets() {
    let offsets = [[0, 0], [2, -1], [0, 3]];
    let mut volume = block_volume(30, 30, &offsets);
    let options = AlignOptions::new(AlignmentMethod::Misorientation)
        .with_mask(true)
        .with_stride(2);
    let report = align_sections(&mut volume, &options, &CancelToken::new()).unwrap();
    assert_eq!(report.shifts, vec![[0, 0], [2, -1], [0, 3]]);

    // After relocation every slice shows slice 0 wherever it has data.
    let reference: Vec<i32> = slice_of(&volume, "BlockId", 0);
    for z in 1..3 {
        let ids: Vec<i32> = slice_of(&volume, "BlockId", z);
        for (a, b) in reference.iter().zip(&ids) {
            assert!(*b == 0 || a == b);
        }
    }
}

#[test]
fn mask_mismatch_recovers_offsets() {
    let offsets = [[0, 0], [-3, 2], [-1, -1]];
    let mut volume = blob_volume(24, 24, &offsets);
    let options = AlignOptions::new(AlignmentMethod::MaskMismatch).with_stride(1);
    let report = align_sections(&mut volume, &options, &CancelToken::new()).unwrap();
    assert_eq!(report.shifts, vec![[0, 0], [-3, 2], [-1, -1]]);
}

#[test]
fn mutual_information_recovers_offsets() {
    let offsets = [[0, 0], [1, 2], [-2, 2]];
    let mut volume = block_volume(30, 30, &offsets);
    let options = AlignOptions::new(AlignmentMethod::MutualInformation).with_stride(1);
    let report = align_sections(&mut volume, &options, &CancelToken::new()).unwrap();
    assert_eq!(report.shifts, vec![[0, 0], [1, 2], [-2, 2]]);
    for t in &report.transitions {
        assert_eq!(t.extras.len(), 1);
        assert!(t.extras[0].is_finite() && t.extras[0] > 0.0);
    }
}

#[test]
fn list_shifts_drive_relocation_and_round_trip_through_the_log() {
    let offsets = [[0, 0], [2, -1], [0, 3]];
    let shift_file = temp_path("shifts.txt");
    std::fs::write(&shift_file, "# slice dx dy\n1 2 -1\n2 -2 4\n").unwrap();
    let log = temp_path("shift_log.txt");

    let mut volume = blob_volume(24, 24, &offsets);
    let options = AlignOptions::new(AlignmentMethod::List {
        path: shift_file.clone(),
        format: ShiftFileFormat::Plain,
        values: ShiftValues::Incremental,
    })
    .with_shift_log(&log);
    let report = align_sections(&mut volume, &options, &CancelToken::new()).unwrap();
    assert_eq!(report.shifts, vec![[0, 0], [2, -1], [0, 3]]);

    let text = std::fs::read_to_string(&log).unwrap();
    assert_eq!(text, "0\t1\t2\t-1\t2\t-1\n1\t2\t-2\t4\t0\t3\n");

    // The log is itself a valid cumulative shift file.
    let mut again = blob_volume(24, 24, &offsets);
    let replay = AlignOptions::new(AlignmentMethod::List {
        path: log.clone(),
        format: ShiftFileFormat::Dream3d,
        values: ShiftValues::Cumulative,
    });
    let second = align_sections(&mut again, &replay, &CancelToken::new()).unwrap();
    assert_eq!(second.shifts, report.shifts);
    assert_eq!(again.cell, volume.cell);

    let _ = std::fs::remove_file(shift_file);
    let _ = std::fs::remove_file(log);
}

#[test]
fn configuration_errors_leave_the_volume_untouched() {
    let offsets = [[0, 0], [2, -1]];
    let mut volume = blob_volume(24, 24, &offsets);
    let before = volume.clone();

    let mut options = AlignOptions::new(AlignmentMethod::MaskMismatch);
    options.write_shift_log = true;
    let err = align_sections(&mut volume, &options, &CancelToken::new()).unwrap_err();
    assert_eq!(err.code(), -1);

    let missing = AlignOptions::new(AlignmentMethod::List {
        path: temp_path("does_not_exist.txt"),
        format: ShiftFileFormat::Plain,
        values: ShiftValues::Incremental,
    });
    let err = align_sections(&mut volume, &missing, &CancelToken::new()).unwrap_err();
    assert!(matches!(err, ReconError::Io { .. }));

    let err = align_sections(
        &mut volume,
        &AlignOptions::new(AlignmentMethod::Misorientation),
        &CancelToken::new(),
    )
    .unwrap_err();
    assert!(matches!(err, ReconError::MissingArray { .. }));
    assert_eq!(volume, before);
}

#[test]
fn flat_volumes_are_rejected() {
    let mut volume = Volume::new(ImageGeometry::new([8, 8, 1]));
    let err = align_sections(&mut volume, &AlignOptions::default(), &CancelToken::new()).unwrap_err();
    assert!(matches!(err, ReconError::NotThreeDimensional { .. }));
}

#[test]
fn cancelled_alignment_does_not_relocate() {
    let offsets = [[0, 0], [2, -1], [0, 3]];
    let mut volume = block_volume(30, 30, &offsets);
    let before = volume.clone();
    let cancel = CancelToken::new();
    cancel.cancel();
    for method in [AlignmentMethod::Misorientation, AlignmentMethod::MutualInformation] {
        let report = align_sections(&mut volume, &AlignOptions::new(method), &cancel).unwrap();
        assert!(report.cancelled);
        assert!(report.transitions.is_empty());
    }
    assert_eq!(volume, before);
}

#[test]
fn geometry_out_of_step_with_the_cell_matrix_is_a_configuration_error() {
    let mut volume = blob_volume(24, 24, &[[0, 0], [1, 0], [0, 1]]);
    volume.geometry = ImageGeometry::new([24, 24, 4]);
    let before = volume.clone();
    for method in [
        AlignmentMethod::MaskMismatch,
        AlignmentMethod::Centroid { reference_slice: None },
        AlignmentMethod::Misorientation,
    ] {
        let err = align_sections(&mut volume, &AlignOptions::new(method), &CancelToken::new())
            .unwrap_err();
        assert!(
            matches!(err, ReconError::TupleMismatch { expected: 2304, actual: 1728, .. }),
            "unexpected error {err}"
        );
    }
    assert_eq!(volume, before);
}
