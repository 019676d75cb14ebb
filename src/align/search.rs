//! Greedy local search for the in-plane shift of one slice.

use log::warn;

/// Half width of the candidate window around the current best shift.
const WINDOW: i64 = 3;

/// Best shift found for one slice transition.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct SearchResult {
    pub dx: i64,
    pub dy: i64,
    /// Score of the winning candidate, `INFINITY` if none scored.
    pub score: f64,
    /// Candidates evaluated.
    pub evaluated: usize,
}

/// Scratch state reused across slices of one volume.
pub(crate) struct ShiftSearch {
    nx: usize,
    ny: usize,
    stride: usize,
    visited: Vec<bool>,
}

impl ShiftSearch {
    pub(crate) fn new(nx: usize, ny: usize, stride: usize) -> Self {
        Self {
            nx,
            ny,
            stride: stride.max(1),
            visited: vec![false; nx * ny],
        }
    }

    /// Calls `visit(reference, moving)` with slice-local indices for every
    /// sample of the coarse grid whose shifted partner is in bounds.
    pub(crate) fn for_each_sample(&self, dx: i64, dy: i64, mut visit: impl FnMut(usize, usize)) {
        let (nx, ny) = (self.nx as i64, self.ny as i64);
        for l in (0..ny).step_by(self.stride) {
            let cy = l + dy;
            if cy < 0 || cy >= ny {
                continue;
            }
            for n in (0..nx).step_by(self.stride) {
                let cx = n + dx;
                if cx < 0 || cx >= nx {
                    continue;
                }
                visit((l * nx + n) as usize, (cy * nx + cx) as usize);
            }
        }
    }

    /// Repeats a 7x7 window search around the best shift until it stops
    /// moving. `score(dx, dy)` returns `None` when a candidate has no
    /// in-bounds samples; lower scores win and ties go to the candidate
    /// nearer zero.
    pub(crate) fn run(&mut self, mut score: impl FnMut(&Self, i64, i64) -> Option<f64>) -> SearchResult {
        let half_x = (self.nx / 2) as i64;
        let half_y = (self.ny / 2) as i64;
        self.visited.fill(false);

        let mut best = SearchResult {
            dx: 0,
            dy: 0,
            score: f64::INFINITY,
            evaluated: 0,
        };
        loop {
            let (ox, oy) = (best.dx, best.dy);
            for j in -WINDOW..=WINDOW {
                for k in -WINDOW..=WINDOW {
                    let (dx, dy) = (ox + k, oy + j);
                    if dx.abs() >= half_x || dy.abs() >= half_y {
                        continue;
                    }
                    let cell = ((dy + half_y) * self.nx as i64 + dx + half_x) as usize;
                    if self.visited[cell] {
                        continue;
                    }
                    self.visited[cell] = true;
                    best.evaluated += 1;

                    let Some(s) = score(&*self, dx, dy) else {
                        warn!("shift ({dx}, {dy}) has no in-bounds samples; skipped");
                        continue;
                    };
                    let nearer = dx.abs() < best.dx.abs() || dy.abs() < best.dy.abs();
                    if s < best.score || (s == best.score && nearer) {
                        best.dx = dx;
                        best.dy = dy;
                        best.score = s;
                    }
                }
            }
            if (best.dx, best.dy) == (ox, oy) {
                return best;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_walks_past_the_first_window() {
        let mut search = ShiftSearch::new(32, 32, 4);
        // Bowl centred at (7, -5): reachable only by moving the window.
        let result = search.run(|_, dx, dy| Some(((dx - 7).pow(2) + (dy + 5).pow(2)) as f64));
        assert_eq!((result.dx, result.dy), (7, -5));
        assert_eq!(result.score, 0.0);
    }

    #[test]
    fn ties_prefer_the_candidate_nearer_zero() {
        let mut search = ShiftSearch::new(16, 16, 4);
        let result = search.run(|_, _, _| Some(0.5));
        assert_eq!((result.dx, result.dy), (0, 0));
    }

    #[test]
    fn candidates_beyond_half_the_slice_are_never_scored() {
        let mut search = ShiftSearch::new(6, 4, 1);
        let mut seen = Vec::new();
        search.run(|_, dx, dy| {
            seen.push((dx, dy));
            Some(-(dx as f64))
        });
        assert!(seen.iter().all(|&(dx, dy)| dx.abs() < 3 && dy.abs() < 2));
        let mut unique = seen.clone();
        unique.sort_unstable();
        unique.dedup();
        assert_eq!(unique.len(), seen.len(), "each candidate is scored once per slice");
    }

    #[test]
    fn samples_stay_in_bounds() {
        let search = ShiftSearch::new(8, 8, 4);
        let mut pairs = Vec::new();
        search.for_each_sample(5, -2, |r, c| pairs.push((r, c)));
        // Reference rows 0 and 4, columns 0 and 4; only column 0 survives a
        // +5 shift, only row 4 survives a -2 shift.
        assert_eq!(pairs, vec![(32, 2 * 8 + 5)]);
    }
}
