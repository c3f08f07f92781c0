//! Gaussian kernel cost between theoretical and transformed experimental peaks.
//!
//! Each peak is smeared by a Gaussian kernel of width `sigma` (base pairs).
//! Experimental peaks are first mapped with `stretch * x + intercept`.
//!
//! - [`Symmetry::Both`]: one minus the normalized overlap of the two kernel
//!   densities, so unmatched peaks on either side raise the cost
//! - [`Symmetry::Experimental`]: fraction of experimental peaks left
//!   unexplained by any theoretical peak
//! - [`Symmetry::Theoretical`]: fraction of theoretical peaks left
//!   unexplained by any experimental peak
//!
//! All variants are 0 for a perfect match and at most 1.

use crate::core::types::{count_to_f64, Symmetry};

/// Overlap of two kernel densities
fn overlap(left: &[f64], right: &[f64], sigma: f64) -> f64 {
    left.iter()
        .map(|&x| {
            right
                .iter()
                .map(|&y| {
                    let d = (x - y) / sigma;
                    (-0.5 * d * d).exp()
                })
                .sum::<f64>()
        })
        .sum()
}

/// Mean over `points` of how well `others` explain each point, capped at 1
fn explained(points: &[f64], others: &[f64], sigma: f64) -> f64 {
    let total: f64 = points
        .iter()
        .map(|&x| overlap(&[x], others, sigma).min(1.0))
        .sum();
    total / count_to_f64(points.len())
}

#[derive(Debug, Clone)]
pub struct GaussianCost<'a> {
    theoretical: &'a [f64],
    experimental: &'a [f64],
    sigma: f64,
    symmetry: Symmetry,
    theoretical_norm: f64,
}

impl<'a> GaussianCost<'a> {
    #[must_use]
    pub fn new(
        theoretical: &'a [f64],
        experimental: &'a [f64],
        sigma: f64,
        symmetry: Symmetry,
    ) -> Self {
        Self {
            theoretical,
            experimental,
            sigma,
            symmetry,
            theoretical_norm: overlap(theoretical, theoretical, sigma),
        }
    }

    /// Cost of the transform `stretch * x + intercept`
    #[must_use]
    pub fn value(&self, stretch: f64, intercept: f64) -> f64 {
        if self.theoretical.is_empty() || self.experimental.is_empty() {
            return 1.0;
        }

        let mapped: Vec<f64> = self
            .experimental
            .iter()
            .map(|&x| stretch * x + intercept)
            .collect();

        match self.symmetry {
            Symmetry::Both => {
                let norm = (self.theoretical_norm * overlap(&mapped, &mapped, self.sigma)).sqrt();
                if norm > 0.0 {
                    1.0 - overlap(self.theoretical, &mapped, self.sigma) / norm
                } else {
                    1.0
                }
            }
            Symmetry::Experimental => 1.0 - explained(&mapped, self.theoretical, self.sigma),
            Symmetry::Theoretical => 1.0 - explained(self.theoretical, &mapped, self.sigma),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const THEO: [f64; 4] = [0.0, 50.0, 120.0, 200.0];

    #[test]
    fn test_cost_zero_on_exact_transform() {
        let exp: Vec<f64> = THEO.iter().map(|t| t / 2.0 + 1.0).collect();
        for symmetry in [Symmetry::Both, Symmetry::Experimental, Symmetry::Theoretical] {
            let cost = GaussianCost::new(&THEO, &exp, 1.0, symmetry);
            assert!(cost.value(2.0, -2.0).abs() < 1e-9, "{symmetry:?}");
            assert!(cost.value(2.1, -2.0) > 0.1, "{symmetry:?}");
        }
    }

    #[test]
    fn test_cost_one_sided() {
        // Experimental peaks are a subset of the theoretical ones.
        let exp = [0.0, 50.0];
        let experimental = GaussianCost::new(&THEO, &exp, 1.0, Symmetry::Experimental);
        let theoretical = GaussianCost::new(&THEO, &exp, 1.0, Symmetry::Theoretical);
        let both = GaussianCost::new(&THEO, &exp, 1.0, Symmetry::Both);
        assert!(experimental.value(1.0, 0.0).abs() < 1e-9);
        assert!((theoretical.value(1.0, 0.0) - 0.5).abs() < 1e-9);
        let value = both.value(1.0, 0.0);
        assert!(value > 0.2 && value < 0.5);
    }

    #[test]
    fn test_cost_bounded() {
        let exp = [3.0, 7.0, 300.0];
        for symmetry in [Symmetry::Both, Symmetry::Experimental, Symmetry::Theoretical] {
            let cost = GaussianCost::new(&THEO, &exp, 5.0, symmetry);
            for stretch in [0.5, 1.0, 10.0] {
                let value = cost.value(stretch, 0.0);
                assert!((0.0..=1.0 + 1e-12).contains(&value));
            }
        }
        assert_eq!(GaussianCost::new(&THEO, &[], 1.0, Symmetry::Both).value(1.0, 0.0), 1.0);
    }
}
