//! Error type shared by every filter in the crate.
//!
//! Each variant maps to a stable negative code through [`ReconError::code`],
//! so a single `Result` carries the `(code, message)` pair callers batch-check
//! after each stage. Configuration problems are raised before any array is
//! mutated; degenerate results are raised after the algorithm completes.

use crate::data::DataType;
use std::path::PathBuf;

/// Convenience alias used throughout the crate.
pub type ReconResult<T> = Result<T, ReconError>;

/// Errors reported by segmentation, alignment and grouping.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ReconError {
    /// The geometry has a dimension of one voxel or less.
    #[error("geometry must be 3D with every dimension > 1, got {nx}x{ny}x{nz}")]
    NotThreeDimensional {
        /// Voxels along x.
        nx: usize,
        /// Voxels along y.
        ny: usize,
        /// Voxels along z.
        nz: usize,
    },

    /// A required cell array is not present in the attribute matrix.
    #[error("required array '{name}' does not exist in the cell attribute matrix")]
    MissingArray {
        /// Name of the missing array.
        name: String,
    },

    /// An array does not hold one tuple per voxel.
    #[error("array '{name}' has {actual} tuples, expected {expected}")]
    TupleMismatch {
        /// Array name.
        name: String,
        /// Tuples the geometry requires.
        expected: usize,
        /// Tuples found.
        actual: usize,
    },

    /// An array has the wrong number of components per tuple.
    #[error("array '{name}' has {actual} components, expected {expected}")]
    ComponentMismatch {
        /// Array name.
        name: String,
        /// Components required.
        expected: usize,
        /// Components found.
        actual: usize,
    },

    /// An array has the wrong element type.
    #[error("array '{name}' holds {actual:?} elements, expected {expected:?}")]
    TypeMismatch {
        /// Array name.
        name: String,
        /// Element type required.
        expected: DataType,
        /// Element type found.
        actual: DataType,
    },

    /// Shift logging was requested without an output path.
    #[error("the alignment shift file name must be set before executing this filter")]
    MissingShiftLogPath,

    /// Reading or writing a file failed.
    #[error("i/o error on {}: {source}", path.display())]
    Io {
        /// File involved.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// A line of a shift file could not be parsed.
    #[error("shift file {} line {line}: {reason}", path.display())]
    ShiftFileParse {
        /// Shift file.
        path: PathBuf,
        /// One-based line number.
        line: usize,
        /// What went wrong.
        reason: String,
    },

    /// A shift file holds fewer slice transitions than the volume needs.
    #[error("shift file {} holds {found} slice transitions, expected {expected}", path.display())]
    ShiftFileTooShort {
        /// Shift file.
        path: PathBuf,
        /// Transitions required (`nz - 1`).
        expected: usize,
        /// Transitions found.
        found: usize,
    },

    /// The centroid reference slice lies outside the volume.
    #[error("reference slice {slice} is outside the volume (0..{nz})")]
    InvalidReferenceSlice {
        /// Requested slice.
        slice: usize,
        /// Slices in the volume.
        nz: usize,
    },

    /// A numeric parameter is out of range.
    #[error("invalid parameter '{name}': {reason}")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// Why it was rejected.
        reason: String,
    },

    /// A neighbor list does not cover every feature.
    #[error("neighbor list has {actual} entries, expected {expected}")]
    NeighborListMismatch {
        /// Features the caller declared.
        expected: usize,
        /// Entries in the list.
        actual: usize,
    },

    /// Segmentation produced no features.
    #[error("the number of features was 0 or 1 which means no features were detected; is a threshold value set too high?")]
    NoFeatures,

    /// Grouping produced no groups.
    #[error("the number of grouped features was 0 or 1 which means no grouped features were detected; is a grouping value set too high?")]
    NoGroups,
}

impl ReconError {
    /// Negative error code identifying the condition.
    pub fn code(&self) -> i32 {
        match self {
            Self::MissingShiftLogPath => -1,
            Self::Io { .. } => -2,
            Self::ShiftFileParse { .. } => -3,
            Self::ShiftFileTooShort { .. } => -4,
            Self::NotThreeDimensional { .. } => -3010,
            Self::InvalidReferenceSlice { .. } => -3020,
            Self::InvalidParameter { .. } => -3030,
            Self::MissingArray { .. } => -11001,
            Self::TupleMismatch { .. } => -11002,
            Self::ComponentMismatch { .. } => -11003,
            Self::TypeMismatch { .. } => -11004,
            Self::NeighborListMismatch { .. } => -11005,
            Self::NoFeatures => -87000,
            Self::NoGroups => -87000,
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_negative_and_messages_render() {
        let errors = [
            ReconError::NotThreeDimensional { nx: 4, ny: 4, nz: 1 },
            ReconError::MissingArray {
                name: "Quats".into(),
            },
            ReconError::MissingShiftLogPath,
            ReconError::NoFeatures,
            ReconError::NoGroups,
        ];
        for err in &errors {
            assert!(err.code() < 0, "{err} should carry a negative code");
            assert!(!err.to_string().is_empty());
        }
        assert_eq!(ReconError::NoFeatures.code(), -87000);
        assert_eq!(ReconError::NoGroups.code(), -87000);
        assert!(errors[0].to_string().contains("4x4x1"));
    }
}
