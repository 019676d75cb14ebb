#![doc = include_str!("../README.md")]

// Public modules (stable-ish surface)
pub mod align;
pub mod data;
pub mod diagnostics;
pub mod error;
pub mod group;
pub mod pipeline;
pub mod segment;

// Supporting modules: shared helpers the filters are built from.
pub mod cancel;
pub mod config;
pub mod features;
pub mod geometry;
pub mod io;
pub mod orientation;
pub mod randomize;
pub mod synthetic;

// --- High-level re-exports -------------------------------------------------

// Filter entry points.
pub use crate::align::{align_sections, AlignOptions, AlignmentMethod, AlignmentReport};
pub use crate::group::{
    group_by_misorientation, group_features, group_micro_texture, merge_twins, GroupOptions,
};
pub use crate::segment::{
    segment_c_axis, segment_misorientation, segment_scalar, segment_vectors, SegmentOptions,
};

// Data model and shared types.
pub use crate::cancel::CancelToken;
pub use crate::data::{AttributeMatrix, Volume};
pub use crate::error::{ReconError, ReconResult};
pub use crate::geometry::ImageGeometry;

// --- Prelude ---------------------------------------------------------------

/// Small prelude for quick experiments.
///
/// ```no_run
/// use grain_recon::prelude::*;
///
/// # fn main() -> Result<(), ReconError> {
/// let mut volume = SyntheticVolume::new([32, 32, 6])
///     .with_slice_offsets(vec![[0, 0], [2, 1]])
///     .build()?
///     .volume;
///
/// let alignment = align_sections(&mut volume, &AlignOptions::default(), &CancelToken::new())?;
/// let features = segment_misorientation(&mut volume, &SegmentOptions::default(), &CancelToken::new())?;
/// println!("shifts={:?} features={}", alignment.shifts, features.feature_count());
/// # Ok(())
/// # }
/// ```
pub mod prelude {
    pub use crate::synthetic::SyntheticVolume;
    pub use crate::{
        align_sections, group_by_misorientation, segment_misorientation, AlignOptions,
        AlignmentMethod, CancelToken, GroupOptions, ImageGeometry, ReconError, SegmentOptions,
        Volume,
    };
}
