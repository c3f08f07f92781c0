//! Monotonic pairing of two ascending position lists.
//!
//! A pair `(i, j)` associates `theoretical[i]` with `experimental[j]` when
//! they are at most `window` apart. Pairs never cross: both indices increase
//! along the matching.
//!
//! Among all such matchings, the one with the most pairs is returned; among
//! those, the one with the smallest sum of squared residuals. Remaining
//! exact ties are broken by preferring, at each step of the dynamic program,
//! a pair over skipping a theoretical peak over skipping an experimental one:
//! a peak equally close to two others pairs with the later one.

#[derive(Debug, Clone, Copy, PartialEq)]
struct Score {
    count: usize,
    residual: f64,
}

impl Score {
    const ZERO: Self = Self {
        count: 0,
        residual: 0.0,
    };

    fn better_than(&self, other: &Self) -> bool {
        self.count > other.count || (self.count == other.count && self.residual < other.residual)
    }

    fn with_pair(&self, delta: f64) -> Self {
        Self {
            count: self.count + 1,
            residual: self.residual + delta * delta,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Pair,
    SkipTheoretical,
    SkipExperimental,
}

/// Best score for the prefixes ending at `(i, j)`, and how it was reached
fn cell(
    diag: &Score,
    up: &Score,
    left: &Score,
    theoretical: f64,
    experimental: f64,
    window: f64,
) -> (Score, Step) {
    let delta = theoretical - experimental;
    let mut best = (*up, Step::SkipTheoretical);
    if delta.abs() <= window {
        best = (diag.with_pair(delta), Step::Pair);
        if up.better_than(&best.0) {
            best = (*up, Step::SkipTheoretical);
        }
    }
    if left.better_than(&best.0) {
        best = (*left, Step::SkipExperimental);
    }
    best
}

/// Monotonic index pairs `(theoretical, experimental)` within `window`
#[must_use]
pub fn match_peaks(theoretical: &[f64], experimental: &[f64], window: f64) -> Vec<(usize, usize)> {
    let rows = theoretical.len();
    let cols = experimental.len();
    if rows == 0 || cols == 0 {
        return Vec::new();
    }

    let width = cols + 1;
    let mut steps = vec![Step::SkipTheoretical; (rows + 1) * width];
    let mut prev = vec![Score::ZERO; width];
    let mut curr = vec![Score::ZERO; width];
    for i in 1..=rows {
        curr[0] = Score::ZERO;
        for j in 1..=cols {
            let (score, step) = cell(
                &prev[j - 1],
                &prev[j],
                &curr[j - 1],
                theoretical[i - 1],
                experimental[j - 1],
                window,
            );
            curr[j] = score;
            steps[i * width + j] = step;
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    let mut pairs = Vec::with_capacity(prev[cols].count);
    let (mut i, mut j) = (rows, cols);
    while i > 0 && j > 0 {
        match steps[i * width + j] {
            Step::Pair => {
                pairs.push((i - 1, j - 1));
                i -= 1;
                j -= 1;
            }
            Step::SkipTheoretical => i -= 1,
            Step::SkipExperimental => j -= 1,
        }
    }
    pairs.reverse();
    pairs
}

/// Number of pairs matching `stretch * experimental + intercept` with the
/// theoretical positions, without building the pairs.
#[must_use]
pub fn match_count(
    theoretical: &[f64],
    experimental: &[f64],
    window: f64,
    stretch: f64,
    intercept: f64,
) -> usize {
    let width = experimental.len() + 1;
    let mut prev = vec![Score::ZERO; width];
    let mut curr = vec![Score::ZERO; width];
    for &theo in theoretical {
        curr[0] = Score::ZERO;
        for (j, &exp) in experimental.iter().enumerate() {
            curr[j + 1] = cell(
                &prev[j],
                &prev[j + 1],
                &curr[j],
                theo,
                stretch * exp + intercept,
                window,
            )
            .0;
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[width - 1].count
}
