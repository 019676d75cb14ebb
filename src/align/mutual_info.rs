//! Mutual information between the feature labels of two slices.

use super::search::ShiftSearch;

/// Joint histogram of label pairs `(a, b)`.
#[derive(Clone, Debug)]
pub struct JointHistogram {
    rows: usize,
    cols: usize,
    joint: Vec<u32>,
    count: u32,
}

impl JointHistogram {
    /// Histogram for labels `0..rows` on the first axis and `0..cols` on the
    /// second.
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            joint: vec![0; rows * cols],
            count: 0,
        }
    }

    pub fn clear(&mut self) {
        self.joint.fill(0);
        self.count = 0;
    }

    /// Records one sample; labels outside the histogram are ignored.
    #[inline]
    pub fn add(&mut self, a: i32, b: i32) {
        let (Ok(a), Ok(b)) = (usize::try_from(a), usize::try_from(b)) else {
            return;
        };
        if a < self.rows && b < self.cols {
            self.joint[a * self.cols + b] += 1;
            self.count += 1;
        }
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    fn marginals(&self) -> (Vec<f64>, Vec<f64>) {
        let mut pa = vec![0.0; self.rows];
        let mut pb = vec![0.0; self.cols];
        let n = self.count as f64;
        for a in 0..self.rows {
            for b in 0..self.cols {
                let p = self.joint[a * self.cols + b] as f64 / n;
                pa[a] += p;
                pb[b] += p;
            }
        }
        (pa, pb)
    }

    /// Shannon entropy (natural log) of the first label.
    pub fn entropy_a(&self) -> f64 {
        if self.count == 0 {
            return 0.0;
        }
        let (pa, _) = self.marginals();
        -pa.iter().filter(|&&p| p > 0.0).map(|&p| p * p.ln()).sum::<f64>()
    }

    /// `sum p(a,b) ln(p(a,b) / (p(a) p(b)))`, with `0 ln 0 = 0`.
    pub fn mutual_information(&self) -> f64 {
        if self.count == 0 {
            return 0.0;
        }
        let (pa, pb) = self.marginals();
        let n = self.count as f64;
        let mut mi = 0.0;
        for a in 0..self.rows {
            if pa[a] == 0.0 {
                continue;
            }
            for b in 0..self.cols {
                let c = self.joint[a * self.cols + b];
                if c == 0 {
                    continue;
                }
                let p = c as f64 / n;
                mi += p * (p / (pa[a] * pb[b])).ln();
            }
        }
        mi
    }
}

/// `1 / MI` of the labels of two slices under shift `(dx, dy)`; infinite
/// when the slices share no information, `None` without samples.
pub(crate) fn mutual_information_score(
    histogram: &mut JointHistogram,
    search: &ShiftSearch,
    reference: &[i32],
    moving: &[i32],
    dx: i64,
    dy: i64,
) -> Option<f64> {
    histogram.clear();
    search.for_each_sample(dx, dy, |r, c| histogram.add(reference[r], moving[c]));
    if histogram.count() == 0 {
        return None;
    }
    let mi = histogram.mutual_information();
    Some(if mi > 0.0 { 1.0 / mi } else { f64::INFINITY })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn identical_labels_share_all_information() {
        let labels = vec![1, 1, 2, 2, 3, 3, 3, 0, 1, 2, 3, 3, 1, 2, 2, 2];
        let mut hist = JointHistogram::new(4, 4);
        for &l in &labels {
            hist.add(l, l);
        }
        assert_relative_eq!(hist.mutual_information(), hist.entropy_a(), epsilon = 1e-12);
        assert!(hist.entropy_a() > 0.0);
    }

    #[test]
    fn independent_labels_share_nothing() {
        let mut hist = JointHistogram::new(3, 3);
        for a in 1..3 {
            for b in 1..3 {
                hist.add(a, b);
            }
        }
        assert_relative_eq!(hist.mutual_information(), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn aligned_slices_score_best() {
        let (nx, ny) = (8usize, 8usize);
        let labels: Vec<i32> = (0..nx * ny).map(|i| 1 + ((i % nx) / 2) as i32).collect();
        let search = ShiftSearch::new(nx, ny, 1);
        let mut hist = JointHistogram::new(5, 5);
        let aligned = mutual_information_score(&mut hist, &search, &labels, &labels, 0, 0).unwrap();

        hist.clear();
        for &l in &labels {
            hist.add(l, l);
        }
        assert_relative_eq!(aligned, 1.0 / hist.entropy_a(), epsilon = 1e-12);

        let shifted = mutual_information_score(&mut hist, &search, &labels, &labels, 1, 0).unwrap();
        assert!(shifted > aligned);
    }
}
