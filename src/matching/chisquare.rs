//! Iterative chi-square refinement of a transform.
//!
//! Starting from a decent transform, peaks are paired with the window
//! matcher and the transform is updated by least squares over the pairs.
//! Rounds stop as soon as the number of pairs stops growing.

use crate::core::types::{count_to_f64, Symmetry, DEFAULT_BEST};
use crate::matching::fitter::Frame;
use crate::matching::window::match_peaks;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChiSquare {
    /// Maximum distance between paired peaks
    pub window: f64,
    pub symmetry: Symmetry,
    pub rounds: usize,
    /// Experimental peaks beyond the last theoretical peak are penalized
    pub single_strand: bool,
    /// Experimental peaks below the first theoretical peak are penalized
    pub baseline: bool,
}

fn mapped(experimental: &[f64], stretch: f64, intercept: f64) -> Vec<f64> {
    experimental.iter().map(|&x| stretch * x + intercept).collect()
}

/// Least squares line through the pairs, `None` when degenerate
fn regress(
    pairs: &[(usize, usize)],
    theoretical: &[f64],
    experimental: &[f64],
) -> Option<(f64, f64)> {
    if pairs.len() < 2 {
        return None;
    }
    let count = count_to_f64(pairs.len());
    let mean_x = pairs.iter().map(|&(_, j)| experimental[j]).sum::<f64>() / count;
    let mean_t = pairs.iter().map(|&(i, _)| theoretical[i]).sum::<f64>() / count;

    let (mut sxx, mut sxt) = (0.0, 0.0);
    for &(i, j) in pairs {
        let dx = experimental[j] - mean_x;
        sxx += dx * dx;
        sxt += dx * (theoretical[i] - mean_t);
    }
    if sxx <= 0.0 {
        return None;
    }
    let stretch = sxt / sxx;
    Some((stretch, mean_t - stretch * mean_x))
}

impl ChiSquare {
    /// Cost of `stretch * x + intercept`.
    ///
    /// `sqrt((residuals + unmatched²) / paired)` where residuals are
    /// squared distances over `window²` and `unmatched` counts the peaks
    /// the symmetry penalizes.
    #[must_use]
    pub fn value(&self, theoretical: &[f64], experimental: &[f64], stretch: f64, intercept: f64) -> f64 {
        if theoretical.is_empty() || experimental.is_empty() {
            return DEFAULT_BEST;
        }
        let positions = mapped(experimental, stretch, intercept);
        let pairs = match_peaks(theoretical, &positions, self.window);
        if pairs.is_empty() {
            return DEFAULT_BEST;
        }

        let scale = self.window * self.window;
        let mut residuals: f64 = pairs
            .iter()
            .map(|&(i, j)| (positions[j] - theoretical[i]).powi(2))
            .sum::<f64>()
            / scale;

        let mut paired = vec![false; positions.len()];
        for &(_, j) in &pairs {
            paired[j] = true;
        }
        let first = theoretical[0];
        let last = theoretical[theoretical.len() - 1];
        for (&position, _) in positions.iter().zip(&paired).filter(|&(_, &p)| !p) {
            if self.single_strand && position > last {
                residuals += (position - last).powi(2) / scale;
            } else if self.baseline && position < first {
                residuals += (first - position).powi(2) / scale;
            }
        }

        let (expected, found) = match self.symmetry {
            Symmetry::Both => (
                theoretical.len() + experimental.len(),
                2 * pairs.len(),
            ),
            Symmetry::Theoretical => (theoretical.len(), pairs.len()),
            Symmetry::Experimental => (experimental.len(), pairs.len()),
        };
        let unmatched = count_to_f64(expected.saturating_sub(found));
        ((residuals + unmatched * unmatched) / count_to_f64(found)).sqrt()
    }

    /// Refine a transform within the frame's bounds.
    ///
    /// Returns `(cost, stretch, intercept)`.
    #[must_use]
    pub fn refine(
        &self,
        theoretical: &[f64],
        experimental: &[f64],
        frame: &Frame,
        stretch: f64,
        intercept: f64,
    ) -> (f64, f64, f64) {
        let (mut stretch, mut intercept) = frame.clamp(stretch, intercept);
        let mut count = 0;
        for _ in 0..self.rounds {
            let positions = mapped(experimental, stretch, intercept);
            let pairs = match_peaks(theoretical, &positions, self.window);
            if pairs.len() <= count {
                break;
            }
            count = pairs.len();
            match regress(&pairs, theoretical, experimental) {
                Some((a, b)) => (stretch, intercept) = frame.clamp(a, b),
                None => break,
            }
        }
        (
            self.value(theoretical, experimental, stretch, intercept),
            stretch,
            intercept,
        )
    }
}
