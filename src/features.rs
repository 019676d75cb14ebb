//! Per-feature statistics derived from a labeled volume.

use crate::data::{names, NeighborList, Volume};
use crate::error::ReconResult;
use crate::geometry::ImageGeometry;
use crate::orientation::{quat_at, store_quat};
use nalgebra::{Quaternion, UnitQuaternion};

/// Size of a feature table covering every id in `feature_ids` (0 included).
pub fn count_features(feature_ids: &[i32]) -> usize {
    feature_ids.iter().copied().max().map_or(1, |m| m.max(0) as usize + 1)
}

/// Face-sharing neighbors of every feature. Feature 0 and ids at or beyond
/// `num_features` take no part.
pub fn find_neighbors(geometry: &ImageGeometry, feature_ids: &[i32], num_features: usize) -> NeighborList {
    let [nx, ny, nz] = geometry.dims;
    let plane = nx * ny;
    let valid = |id: i32| id > 0 && (id as usize) < num_features;
    let mut pairs = Vec::new();
    for (idx, &id) in feature_ids.iter().enumerate() {
        if !valid(id) {
            continue;
        }
        let [x, y, z] = geometry.coords(idx);
        let forward = [
            (x + 1 < nx).then(|| idx + 1),
            (y + 1 < ny).then(|| idx + nx),
            (z + 1 < nz).then(|| idx + plane),
        ];
        for other in forward.into_iter().flatten() {
            let other_id = feature_ids[other];
            if valid(other_id) && other_id != id {
                pairs.push((id as usize, other_id as usize));
            }
        }
    }
    NeighborList::from_pairs(num_features, pairs)
}

/// Voxel count, majority phase and mean orientation per feature.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FeatureStats {
    pub counts: Vec<usize>,
    /// Most frequent phase; 0 for empty features.
    pub phases: Vec<i32>,
    /// Mean orientation per feature, `x y z w`; zero for features without a
    /// valid orientation.
    pub avg_quats: Vec<f32>,
}

impl FeatureStats {
    /// Requires `Quats` and `Phases` in the cell matrix.
    ///
    /// Each voxel orientation is first moved to the symmetric equivalent
    /// closest to the feature's first orientation, then to the same
    /// quaternion hemisphere, before averaging.
    pub fn compute(volume: &Volume, feature_ids: &[i32], num_features: usize) -> ReconResult<Self> {
        let quats = volume.cell.typed::<f32>(names::QUATS, 4)?.as_slice();
        let phases = volume.cell.typed::<i32>(names::PHASES, 1)?.as_slice();
        let num_phases = volume.crystal_structures.len().max(1);

        let mut counts = vec![0usize; num_features];
        let mut phase_votes = vec![0usize; num_features * num_phases];
        let mut reference: Vec<Option<UnitQuaternion<f64>>> = vec![None; num_features];
        let mut sums = vec![Quaternion::new(0.0, 0.0, 0.0, 0.0); num_features];

        for (idx, &id) in feature_ids.iter().enumerate() {
            let Some(f) = usize::try_from(id).ok().filter(|&f| f > 0 && f < num_features) else {
                continue;
            };
            counts[f] += 1;
            let phase = phases[idx];
            if phase <= 0 {
                continue;
            }
            if (phase as usize) < num_phases {
                phase_votes[f * num_phases + phase as usize] += 1;
            }
            let Some(q) = quat_at(quats, idx) else {
                continue;
            };
            let anchor = *reference[f].get_or_insert(q);
            let ops = volume.crystal_structure(phase).symmetry_ops();
            let mut best = *q.quaternion();
            let mut best_dot = anchor.quaternion().dot(&best);
            for s in ops {
                let candidate = *(q * s).quaternion();
                let dot = anchor.quaternion().dot(&candidate);
                if dot.abs() > best_dot.abs() {
                    best = candidate;
                    best_dot = dot;
                }
            }
            sums[f] += if best_dot < 0.0 { -best } else { best };
        }

        let mut avg_quats = vec![0.0f32; num_features * 4];
        for (f, sum) in sums.iter().enumerate() {
            if let Some(mean) = UnitQuaternion::try_new(*sum, 1e-12) {
                store_quat(&mut avg_quats, f, &mean);
            }
        }
        let phases = (0..num_features)
            .map(|f| {
                let votes = &phase_votes[f * num_phases..(f + 1) * num_phases];
                votes
                    .iter()
                    .enumerate()
                    .filter(|(_, n)| **n > 0)
                    .max_by_key(|(p, n)| (**n, std::cmp::Reverse(*p)))
                    .map_or(0, |(p, _)| p as i32)
            })
            .collect();

        Ok(Self {
            counts,
            phases,
            avg_quats,
        })
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::DataArray;
    use crate::orientation::CrystalStructure;
    use approx::assert_relative_eq;
    use nalgebra::Vector3;

    #[test]
    fn neighbors_share_faces_only() {
        // 3x2x1: features 1 1 2 / 3 0 2
        let geometry = ImageGeometry::new([3, 2, 1]);
        let ids = [1, 1, 2, 3, 0, 2];
        let list = find_neighbors(&geometry, &ids, count_features(&ids));
        assert_eq!(list.len(), 4);
        assert_eq!(list.neighbors(1), &[2, 3]);
        assert_eq!(list.neighbors(2), &[1]);
        assert_eq!(list.neighbors(3), &[1]);
        assert!(list.neighbors(0).is_empty());
    }

    #[test]
    fn averages_fold_symmetric_equivalents() {
        let geometry = ImageGeometry::new([4, 1, 1]);
        let base = UnitQuaternion::from_euler_angles(0.2, 0.1, -0.3);
        let quarter = UnitQuaternion::from_axis_angle(&Vector3::z_axis(), std::f64::consts::FRAC_PI_2);
        let mut quats = vec![0.0f32; 16];
        store_quat(&mut quats, 0, &base);
        // Same cubic orientation written through a symmetry operator, and
        // with the opposite quaternion sign.
        store_quat(&mut quats, 1, &(base * quarter));
        let negated = UnitQuaternion::new_unchecked(-*base.quaternion());
        store_quat(&mut quats, 2, &negated);
        store_quat(&mut quats, 3, &base);

        let mut volume = Volume::new(geometry)
            .with_crystal_structures(vec![CrystalStructure::Unknown, CrystalStructure::Cubic]);
        volume.cell.insert(names::QUATS, DataArray::from_vec(quats, 4)).unwrap();
        volume.cell.insert(names::PHASES, DataArray::from_vec(vec![1, 1, 1, 0], 1)).unwrap();

        let ids = [1, 1, 1, 2];
        let stats = FeatureStats::compute(&volume, &ids, 3).unwrap();
        assert_eq!(stats.counts, vec![0, 3, 1]);
        assert_eq!(stats.phases, vec![0, 1, 0]);
        let mean = quat_at(&stats.avg_quats, 1).unwrap();
        assert_relative_eq!(mean.angle_to(&base), 0.0, epsilon = 1e-5);
        assert!(quat_at(&stats.avg_quats, 2).is_none());
    }
}
