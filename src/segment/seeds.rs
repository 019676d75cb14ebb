use super::engine::SeedPicker;

/// Forward-scan seed picker over voxels.
///
/// A voxel is eligible when it is unlabeled, its mask entry (if any) is true
/// and its phase (if required) is positive. `offset` shifts lookups into the
/// mask and phase arrays so a picker can run on one slice of a volume.
#[derive(Clone, Copy, Debug, Default)]
pub struct VoxelSeeds<'a> {
    mask: Option<&'a [bool]>,
    phases: Option<&'a [i32]>,
    offset: usize,
}

impl<'a> VoxelSeeds<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_mask(mut self, mask: Option<&'a [bool]>) -> Self {
        self.mask = mask;
        self
    }

    pub fn with_phases(mut self, phases: &'a [i32]) -> Self {
        self.phases = Some(phases);
        self
    }

    pub fn with_offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    #[inline]
    fn eligible(&self, voxel: usize) -> bool {
        let idx = self.offset + voxel;
        let good = self.mask.map_or(true, |m| m.get(idx).copied().unwrap_or(false));
        let phased = self.phases.map_or(true, |p| p.get(idx).is_some_and(|&ph| ph > 0));
        good && phased
    }
}

impl SeedPicker for VoxelSeeds<'_> {
    fn next_seed(&mut self, _feature_count: i32, search_start: usize, feature_ids: &[i32]) -> Option<usize> {
        (search_start..feature_ids.len()).find(|&i| feature_ids[i] == 0 && self.eligible(i))
    }
}
