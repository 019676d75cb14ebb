use super::engine::GroupingStrategy;
use super::seeds::FeatureSeeds;
use crate::features::FeatureStats;
use crate::orientation::{quat_at, CrystalStructure, LaueOps, Misorientation};

/// Merges neighboring features whose average orientations share a phase and
/// misorient by at most `tolerance` radians.
#[derive(Clone, Debug)]
pub struct MisorientationGrouping<'a, M = LaueOps> {
    avg_quats: &'a [f32],
    phases: &'a [i32],
    structures: &'a [CrystalStructure],
    tolerance: f64,
    seeds: FeatureSeeds,
    provider: M,
}

impl<'a> MisorientationGrouping<'a, LaueOps> {
    pub fn new(
        avg_quats: &'a [f32],
        phases: &'a [i32],
        structures: &'a [CrystalStructure],
        tolerance: f64,
    ) -> Self {
        Self {
            avg_quats,
            phases,
            structures,
            tolerance,
            seeds: FeatureSeeds::default(),
            provider: LaueOps,
        }
    }

    /// Strategy over the per-feature averages of `stats`.
    pub fn from_stats(stats: &'a FeatureStats, structures: &'a [CrystalStructure], tolerance: f64) -> Self {
        Self::new(&stats.avg_quats, &stats.phases, structures, tolerance)
    }
}

impl<'a, M: Misorientation> MisorientationGrouping<'a, M> {
    pub fn with_provider<N: Misorientation>(self, provider: N) -> MisorientationGrouping<'a, N> {
        MisorientationGrouping {
            avg_quats: self.avg_quats,
            phases: self.phases,
            structures: self.structures,
            tolerance: self.tolerance,
            seeds: self.seeds,
            provider,
        }
    }

    pub fn with_seeds(mut self, seeds: FeatureSeeds) -> Self {
        self.seeds = seeds;
        self
    }

    fn structure(&self, phase: i32) -> CrystalStructure {
        usize::try_from(phase)
            .ok()
            .and_then(|p| self.structures.get(p).copied())
            .unwrap_or_default()
    }

    /// Misorientation between two features, infinite across phases.
    pub fn misorientation(&self, a: usize, b: usize) -> f64 {
        let (pa, pb) = (self.phases[a], self.phases[b]);
        if pa <= 0 || pa != pb {
            return f64::INFINITY;
        }
        match (quat_at(self.avg_quats, a), quat_at(self.avg_quats, b)) {
            (Some(qa), Some(qb)) => {
                let s = self.structure(pa);
                self.provider.misorientation(&qa, s, &qb, s)
            }
            _ => f64::INFINITY,
        }
    }
}

impl<M: Misorientation> GroupingStrategy for MisorientationGrouping<'_, M> {
    fn get_seed(&mut self, _new_parent: i32, parent_ids: &[i32]) -> Option<usize> {
        self.seeds.next_seed(parent_ids)
    }

    fn determine_grouping(
        &mut self,
        reference: usize,
        neighbor: usize,
        new_parent: i32,
        parent_ids: &mut [i32],
    ) -> bool {
        if self.misorientation(reference, neighbor) <= self.tolerance {
            parent_ids[neighbor] = new_parent;
            true
        } else {
            false
        }
    }
}
