use super::matrix::AttributeMatrix;
use super::names;
use crate::error::{ReconError, ReconResult};
use crate::geometry::ImageGeometry;
use crate::orientation::CrystalStructure;

/// A voxel grid with its cell data and ensemble (per-phase) table.
#[derive(Clone, Debug, PartialEq)]
pub struct Volume {
    pub geometry: ImageGeometry,
    /// One tuple per voxel.
    pub cell: AttributeMatrix,
    /// Crystal structure per phase id; index 0 is the unused "unknown" phase.
    pub crystal_structures: Vec<CrystalStructure>,
}

impl Volume {
    /// Empty volume with an empty cell matrix sized to the geometry.
    pub fn new(geometry: ImageGeometry) -> Self {
        Self {
            cell: AttributeMatrix::new(geometry.total_points()),
            geometry,
            crystal_structures: vec![CrystalStructure::Unknown],
        }
    }

    pub fn with_crystal_structures(mut self, structures: Vec<CrystalStructure>) -> Self {
        self.crystal_structures = structures;
        self
    }

    /// Fails with [`ReconError::TupleMismatch`] unless the cell matrix holds
    /// one tuple per voxel of the geometry.
    pub fn validate(&self) -> ReconResult<()> {
        let expected = self.geometry.total_points();
        if self.cell.num_tuples() != expected {
            return Err(ReconError::TupleMismatch {
                name: "cell".to_string(),
                expected,
                actual: self.cell.num_tuples(),
            });
        }
        Ok(())
    }

    /// Crystal structure of `phase`, `Unknown` for ids outside the table.
    pub fn crystal_structure(&self, phase: i32) -> CrystalStructure {
        usize::try_from(phase)
            .ok()
            .and_then(|p| self.crystal_structures.get(p).copied())
            .unwrap_or(CrystalStructure::Unknown)
    }

    /// The `Mask` array when `use_mask` is set, `None` otherwise.
    pub fn good_voxels(&self, use_mask: bool) -> ReconResult<Option<&[bool]>> {
        if !use_mask {
            return Ok(None);
        }
        Ok(Some(self.cell.typed::<bool>(names::MASK, 1)?.as_slice()))
    }
}
