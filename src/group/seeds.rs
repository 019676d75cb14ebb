/// Picks the first unmerged feature, scanning forward with wrap-around.
///
/// The scan resumes after the previous seed, so a full pass over the
/// features costs linear time overall.
#[derive(Clone, Copy, Debug)]
pub struct FeatureSeeds {
    cursor: usize,
    skip_zero: bool,
}

impl Default for FeatureSeeds {
    fn default() -> Self {
        Self::new(1)
    }
}

impl FeatureSeeds {
    pub fn new(start: usize) -> Self {
        Self {
            cursor: start,
            skip_zero: false,
        }
    }

    /// Never seeds feature 0, even when it is unmerged.
    pub fn skip_zero(mut self, skip: bool) -> Self {
        self.skip_zero = skip;
        self
    }

    pub fn next_seed(&mut self, parent_ids: &[i32]) -> Option<usize> {
        let n = parent_ids.len();
        if n == 0 {
            return None;
        }
        let start = self.cursor % n;
        let seed = (0..n)
            .map(|i| (start + i) % n)
            .find(|&f| parent_ids[f] == -1 && !(self.skip_zero && f == 0))?;
        self.cursor = seed + 1;
        Some(seed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scan_wraps_and_resumes() {
        let mut seeds = FeatureSeeds::new(3);
        let mut parents = vec![-1, -1, 5, -1, 7];
        assert_eq!(seeds.next_seed(&parents), Some(3));
        parents[3] = 1;
        assert_eq!(seeds.next_seed(&parents), Some(0));
        parents[0] = 2;
        assert_eq!(seeds.next_seed(&parents), Some(1));
        parents[1] = 3;
        assert_eq!(seeds.next_seed(&parents), None);
    }

    #[test]
    fn zero_can_be_skipped() {
        let mut seeds = FeatureSeeds::new(0).skip_zero(true);
        assert_eq!(seeds.next_seed(&[-1, 4, -1]), Some(2));
        assert_eq!(FeatureSeeds::default().skip_zero(true).next_seed(&[-1]), None);
    }
}
