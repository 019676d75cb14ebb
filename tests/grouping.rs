mod common;

use common::synthetic_volume::{is_refinement_of, misaligned_grains, GRAIN_IDS};
use grain_recon::data::{names, NeighborList};
use grain_recon::features::{count_features, find_neighbors, FeatureStats};
use grain_recon::group::{group_features, FeatureSeeds, GroupingStrategy, MisorientationGrouping};
use grain_recon::{group_by_misorientation, segment_misorientation};
use grain_recon::{CancelToken, GroupOptions, SegmentOptions};

struct Always {
    accept: bool,
    seeds: FeatureSeeds,
}

impl GroupingStrategy for Always {
    fn get_seed(&mut self, _new_parent: i32, parent_ids: &[i32]) -> Option<usize> {
        self.seeds.next_seed(parent_ids)
    }

    fn determine_grouping(
        &mut self,
        _reference: usize,
        neighbor: usize,
        new_parent: i32,
        parent_ids: &mut [i32],
    ) -> bool {
        if self.accept {
            parent_ids[neighbor] = new_parent;
        }
        self.accept
    }
}

#[test]
fn chain_graph_groups_all_or_nothing() {
    common::init_logging();
    let chain = NeighborList::from_pairs(5, [(0, 1), (1, 2), (2, 3), (3, 4)]);
    let options = GroupOptions::default().with_feature_zero(true);

    let mut accept = Always {
        accept: true,
        seeds: FeatureSeeds::new(1),
    };
    let grouping = group_features(&chain, None, &mut accept, &options, &CancelToken::new()).unwrap();
    assert_eq!(grouping.num_groups(), 1);
    assert!(grouping.parent_ids.iter().all(|&p| p == 1));

    let mut reject = Always {
        accept: false,
        seeds: FeatureSeeds::new(1),
    };
    let grouping = group_features(&chain, None, &mut reject, &options, &CancelToken::new()).unwrap();
    assert_eq!(grouping.num_groups(), 5);
    let mut parents = grouping.parent_ids.clone();
    parents.sort_unstable();
    assert_eq!(parents, vec![1, 2, 3, 4, 5]);
}

#[test]
fn neighbor_graph_of_a_segmented_volume_is_symmetric() {
    let sample = misaligned_grains([24, 24, 4], Vec::new(), 17);
    let mut volume = sample.volume;
    segment_misorientation(&mut volume, &SegmentOptions::default(), &CancelToken::new()).unwrap();
    let ids = volume.cell.typed::<i32>(names::FEATURE_IDS, 1).unwrap().as_slice();
    let n = count_features(ids);
    let neighbors = find_neighbors(&volume.geometry, ids, n);
    assert_eq!(neighbors.len(), n);
    assert!(neighbors.neighbors(0).is_empty());
    for f in 1..n {
        for &g in neighbors.neighbors(f) {
            assert!(neighbors.neighbors(g).contains(&f));
        }
    }

    let stats = FeatureStats::compute(&volume, ids, n).unwrap();
    assert_eq!(stats.counts.iter().sum::<usize>(), volume.geometry.total_points());
    assert!(stats.phases[1..].iter().all(|&p| p == 1));

    // Every feature is one grain, so no two neighbors merge.
    let structures = volume.crystal_structures.clone();
    let mut strategy = MisorientationGrouping::from_stats(&stats, &structures, 5f64.to_radians());
    let grouping = group_features(
        &neighbors,
        None,
        &mut strategy,
        &GroupOptions::default(),
        &CancelToken::new(),
    )
    .unwrap();
    assert_eq!(grouping.num_groups(), n - 1);
}

#[test]
fn shuffled_parent_ids_keep_the_grouping() {
    let sample = misaligned_grains([24, 24, 4], Vec::new(), 23);
    let mut volume = sample.volume;
    segment_misorientation(&mut volume, &SegmentOptions::default(), &CancelToken::new()).unwrap();

    let plain = group_by_misorientation(
        &mut volume.clone(),
        5.0,
        &GroupOptions::default(),
        &CancelToken::new(),
    )
    .unwrap();
    let shuffled = group_by_misorientation(
        &mut volume,
        5.0,
        &GroupOptions::default().with_random_seed(99),
        &CancelToken::new(),
    )
    .unwrap();
    assert_eq!(plain.num_groups(), shuffled.num_groups());
    let a = &plain.parent_ids;
    let b = &shuffled.parent_ids;
    for i in 0..a.len() {
        for j in 0..a.len() {
            assert_eq!(a[i] == a[j], b[i] == b[j]);
        }
    }
    assert_eq!(b[0], 0);

    let parents = volume.cell.typed::<i32>(names::PARENT_IDS, 1).unwrap().as_slice();
    let grains = volume.cell.typed::<i32>(GRAIN_IDS, 1).unwrap().as_slice();
    assert!(is_refinement_of(parents, grains));
}
