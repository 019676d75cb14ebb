use serde::{Deserialize, Serialize};

/// Per-feature lists of neighboring feature ids.
///
/// Entry `f` holds the neighbors of feature `f`; entry 0 is conventionally
/// empty.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NeighborList {
    lists: Vec<Vec<usize>>,
}

impl NeighborList {
    pub fn new(lists: Vec<Vec<usize>>) -> Self {
        Self { lists }
    }

    /// Builds a symmetric list for `num_features` features from undirected
    /// pairs. Each list is sorted and de-duplicated; self pairs are dropped.
    pub fn from_pairs(num_features: usize, pairs: impl IntoIterator<Item = (usize, usize)>) -> Self {
        let mut lists = vec![Vec::new(); num_features];
        for (a, b) in pairs {
            if a == b || a >= num_features || b >= num_features {
                continue;
            }
            lists[a].push(b);
            lists[b].push(a);
        }
        for list in &mut lists {
            list.sort_unstable();
            list.dedup();
        }
        Self { lists }
    }

    /// Number of features covered (including feature 0).
    pub fn len(&self) -> usize {
        self.lists.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lists.is_empty()
    }

    /// Neighbors of `feature`, empty when out of range.
    #[inline]
    pub fn neighbors(&self, feature: usize) -> &[usize] {
        self.lists.get(feature).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn iter(&self) -> impl Iterator<Item = &[usize]> {
        self.lists.iter().map(Vec::as_slice)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pairs_become_symmetric_sorted_lists() {
        let list = NeighborList::from_pairs(4, [(1, 3), (2, 1), (3, 1), (2, 2), (1, 9)]);
        assert_eq!(list.len(), 4);
        assert_eq!(list.neighbors(1), &[2, 3]);
        assert_eq!(list.neighbors(2), &[1]);
        assert_eq!(list.neighbors(3), &[1]);
        assert!(list.neighbors(0).is_empty());
        assert!(list.neighbors(42).is_empty());
    }
}
