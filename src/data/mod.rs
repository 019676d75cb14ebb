//! Voxel data store: typed attribute arrays, the cell attribute matrix, the
//! per-phase crystal structure table and the feature neighbor graph.

mod array;
mod matrix;
mod neighbors;
mod volume;

pub use array::{AttributeArray, DataArray, DataType, Element};
pub use matrix::AttributeMatrix;
pub use neighbors::NeighborList;
pub use volume::Volume;

/// Well-known array names used by the filters.
pub mod names {
    /// Per-voxel feature id (`i32`, 1 component).
    pub const FEATURE_IDS: &str = "FeatureIds";
    /// Per-voxel orientation quaternion (`f32`, 4 components, `x y z w`).
    pub const QUATS: &str = "Quats";
    /// Per-voxel phase id (`i32`, 1 component).
    pub const PHASES: &str = "Phases";
    /// Per-voxel good/bad flag (`bool`, 1 component).
    pub const MASK: &str = "Mask";
    /// Per-voxel parent id written by grouping (`i32`, 1 component).
    pub const PARENT_IDS: &str = "ParentIds";
}
