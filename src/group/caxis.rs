//! Micro-texture region grouping for hexagonal phases.
//!
//! Two features are similar when their crystal c-axes, expressed in the
//! sample frame, are within a tolerance of each other as undirected lines.
//! With a running average the comparison is against the volume-weighted mean
//! c-axis of the group built so far instead of the reference feature.

use super::engine::GroupingStrategy;
use super::seeds::FeatureSeeds;
use crate::features::FeatureStats;
use crate::orientation::{axis_angle, c_axis, quat_at, CrystalStructure};
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

/// Second pass over large groups with a looser c-axis tolerance.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PatchGrowth {
    /// Smallest group volume, as a fraction of all feature volume, that
    /// earns the second pass.
    pub min_volume_fraction: f64,
    /// c-axis tolerance of the second pass, radians.
    pub tolerance: f64,
}

#[derive(Clone, Debug)]
pub struct CAxisGrouping<'a> {
    avg_quats: &'a [f32],
    phases: &'a [i32],
    structures: &'a [CrystalStructure],
    volumes: &'a [usize],
    tolerance: f64,
    running_average: bool,
    patch: Option<PatchGrowth>,
    seeds: FeatureSeeds,
    total_volume: f64,
    average: Vector3<f64>,
}

impl<'a> CAxisGrouping<'a> {
    /// `volumes` holds the voxel count per feature; `tolerance` is in radians.
    pub fn new(
        avg_quats: &'a [f32],
        phases: &'a [i32],
        structures: &'a [CrystalStructure],
        volumes: &'a [usize],
        tolerance: f64,
    ) -> Self {
        Self {
            avg_quats,
            phases,
            structures,
            volumes,
            tolerance,
            running_average: false,
            patch: None,
            seeds: FeatureSeeds::default(),
            total_volume: volumes.iter().skip(1).sum::<usize>() as f64,
            average: Vector3::zeros(),
        }
    }

    pub fn from_stats(stats: &'a FeatureStats, structures: &'a [CrystalStructure], tolerance: f64) -> Self {
        Self::new(&stats.avg_quats, &stats.phases, structures, &stats.counts, tolerance)
    }

    pub fn with_running_average(mut self, enabled: bool) -> Self {
        self.running_average = enabled;
        self
    }

    pub fn with_patch_growth(mut self, patch: PatchGrowth) -> Self {
        self.patch = Some(patch);
        self
    }

    pub fn with_seeds(mut self, seeds: FeatureSeeds) -> Self {
        self.seeds = seeds;
        self
    }

    fn is_hexagonal(&self, feature: usize) -> bool {
        let phase = self.phases.get(feature).copied().unwrap_or(0);
        phase > 0
            && self.structures.get(phase as usize).copied() == Some(CrystalStructure::Hexagonal)
    }

    fn axis(&self, feature: usize) -> Option<Vector3<f64>> {
        quat_at(self.avg_quats, feature).map(|q| c_axis(&q))
    }

    fn weight(&self, feature: usize) -> f64 {
        self.volumes.get(feature).copied().unwrap_or(0) as f64
    }

    /// Shared acceptance test of both passes.
    fn accept(
        &mut self,
        reference: usize,
        neighbor: usize,
        parent: i32,
        parent_ids: &mut [i32],
        tolerance: f64,
    ) -> bool {
        if !self.is_hexagonal(neighbor) {
            return false;
        }
        let target = if self.running_average {
            Some(self.average)
        } else if self.is_hexagonal(reference) {
            self.axis(reference)
        } else {
            None
        };
        let (Some(target), Some(candidate)) = (target, self.axis(neighbor)) else {
            return false;
        };
        if axis_angle(&target, &candidate) > tolerance {
            return false;
        }
        parent_ids[neighbor] = parent;
        if self.running_average {
            // Fold the axis onto the average's hemisphere before summing.
            let aligned = if candidate.dot(&self.average) < 0.0 {
                -candidate
            } else {
                candidate
            };
            self.average += aligned * self.weight(neighbor);
        }
        true
    }
}

impl GroupingStrategy for CAxisGrouping<'_> {
    fn get_seed(&mut self, _new_parent: i32, parent_ids: &[i32]) -> Option<usize> {
        let seed = self.seeds.next_seed(parent_ids)?;
        self.average = self
            .axis(seed)
            .map(|c| c * self.weight(seed).max(1.0))
            .unwrap_or_else(Vector3::zeros);
        Some(seed)
    }

    fn determine_grouping(
        &mut self,
        reference: usize,
        neighbor: usize,
        new_parent: i32,
        parent_ids: &mut [i32],
    ) -> bool {
        self.accept(reference, neighbor, new_parent, parent_ids, self.tolerance)
    }

    fn grow_patch(&mut self, _parent: i32, members: &[usize]) -> bool {
        let Some(patch) = self.patch else {
            return false;
        };
        if self.total_volume <= 0.0 {
            return false;
        }
        let volume: f64 = members.iter().map(|&f| self.weight(f)).sum();
        volume / self.total_volume >= patch.min_volume_fraction
    }

    fn grow_grouping(
        &mut self,
        reference: usize,
        neighbor: usize,
        parent: i32,
        parent_ids: &mut [i32],
    ) -> bool {
        let tolerance = self.patch.map_or(self.tolerance, |p| p.tolerance);
        self.accept(reference, neighbor, parent, parent_ids, tolerance)
    }
}
