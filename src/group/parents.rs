/// Per-voxel parent ids through the `feature -> parent` lookup.
///
/// Voxels whose feature id falls outside `feature_parents` get parent 0.
pub fn assign_cell_parents(feature_ids: &[i32], feature_parents: &[i32]) -> Vec<i32> {
    feature_ids
        .iter()
        .map(|&id| {
            usize::try_from(id)
                .ok()
                .and_then(|f| feature_parents.get(f).copied())
                .unwrap_or(0)
        })
        .collect()
}
