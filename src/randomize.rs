//! Seedable id permutation shared by segmentation and grouping.
//!
//! Id 0 always maps to itself; ids `1..total` are shuffled with a
//! Fisher-Yates shuffle driven by [`StdRng`].

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::time::{SystemTime, UNIX_EPOCH};

/// Lookup table `old id -> new id` for `total` ids (0 included).
pub fn permutation(total: usize, rng: &mut StdRng) -> Vec<i32> {
    let mut table: Vec<i32> = (0..total as i32).collect();
    if total > 2 {
        table[1..].shuffle(rng);
    }
    table
}

/// Rewrites every id through `table`. Ids outside the table are left alone.
pub fn remap_ids(ids: &mut [i32], table: &[i32]) {
    for id in ids.iter_mut() {
        if let Some(&new) = usize::try_from(*id).ok().and_then(|i| table.get(i)) {
            *id = new;
        }
    }
}

/// Shuffles `ids` (values in `0..total`) with a generator seeded by `seed`.
pub fn randomize_ids(ids: &mut [i32], total: usize, seed: u64) -> Vec<i32> {
    let mut rng = StdRng::seed_from_u64(seed);
    let table = permutation(total, &mut rng);
    remap_ids(ids, &table);
    table
}

/// Seed derived from the wall clock, for callers that did not pin one.
pub fn time_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn permutation_fixes_zero_and_is_bijective() {
        let mut rng = StdRng::seed_from_u64(7);
        let table = permutation(50, &mut rng);
        assert_eq!(table[0], 0);
        let mut sorted = table.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, (0..50).collect::<Vec<_>>());
    }

    #[test]
    fn same_seed_same_table() {
        let a = permutation(20, &mut StdRng::seed_from_u64(99));
        let b = permutation(20, &mut StdRng::seed_from_u64(99));
        assert_eq!(a, b);
    }

    #[test]
    fn remapping_preserves_the_partition() {
        let original = vec![0, 1, 1, 2, 3, 3, 3, 0, 2, 4];
        let mut ids = original.clone();
        randomize_ids(&mut ids, 5, 1234);

        // Two voxels share a new id iff they shared an old id.
        for i in 0..ids.len() {
            for j in 0..ids.len() {
                assert_eq!(original[i] == original[j], ids[i] == ids[j]);
            }
        }
        let mut mapping = HashMap::new();
        for (&old, &new) in original.iter().zip(&ids) {
            assert_eq!(*mapping.entry(old).or_insert(new), new);
        }
        assert_eq!(mapping[&0], 0);
    }
}
