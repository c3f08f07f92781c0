//! Alignment of a bead onto a reference bead, without any sequence.
//!
//! Both peak lists are turned into densities: a sum of Gaussian kernels
//! sampled on a fine grid, clipped to `[floor, ceiling]`. The transform is
//! the one maximizing the correlation of the two densities, optionally
//! refined with the chi-square refiner on the peaks themselves.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::types::{count_to_f64, Distance, Range, Symmetry};
use crate::matching::chisquare::ChiSquare;
use crate::matching::fitter::{Frame, DEFAULT_ROUNDS};
use crate::matching::optimize::{minimize, Bounds, OptimizerConfig};
use crate::utils::validation::{check_positive, check_range, check_stretch, Validate};

/// Kernel width, in micrometers
pub const DEFAULT_PRECISION: f64 = 0.003;
/// Bins per kernel width
pub const DEFAULT_OVERSAMPLING: usize = 5;
/// Pairing window of the chi-square refinement, in micrometers
pub const DEFAULT_REFERENCE_WINDOW: f64 = 10.0 * 8.8e-4;

/// Peak density sampled on a regular grid
#[derive(Debug, Clone, PartialEq)]
pub struct Density {
    /// Position of the first bin
    pub origin: f64,
    pub binwidth: f64,
    pub values: Vec<f64>,
}

impl Density {
    /// Density of a non-empty list of positions
    #[must_use]
    pub fn new(positions: &[f64], config: &ReferenceConfig) -> Self {
        let precision = config.precision;
        let edge = 3.0 * precision;
        let (low, high) = positions
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &x| {
                (lo.min(x), hi.max(x))
            });
        let origin = low - edge;
        let binwidth = precision / count_to_f64(config.oversampling.max(1));

        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let count = ((high + edge - origin) / binwidth).ceil().max(0.0) as usize + 1;

        let values = (0..count)
            .map(|k| {
                let at = origin + binwidth * count_to_f64(k);
                let total: f64 = positions
                    .iter()
                    .map(|&x| {
                        let d = (at - x) / precision;
                        (-0.5 * d * d).exp()
                    })
                    .sum();
                total.clamp(config.floor, config.ceiling) - config.floor
            })
            .collect();
        Self {
            origin,
            binwidth,
            values,
        }
    }

    /// Position of bin `k` relative to the origin
    fn offset(&self, k: usize) -> f64 {
        self.binwidth * count_to_f64(k)
    }

    /// Linear interpolation at a position relative to the origin, 0 outside
    #[must_use]
    pub fn at(&self, offset: f64) -> f64 {
        let index = offset / self.binwidth;
        if index.is_nan() || index < 0.0 || index >= count_to_f64(self.values.len()) {
            return 0.0;
        }
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let low = index.floor() as usize;
        let frac = index - index.floor();
        match (self.values.get(low), self.values.get(low + 1)) {
            (Some(&left), Some(&right)) => left * (1.0 - frac) + right * frac,
            (Some(&left), None) if frac == 0.0 => left,
            _ => 0.0,
        }
    }

    /// Cosine correlation of this density with `other` sampled at
    /// `mapping(offset)` for every bin of this density
    fn correlation(&self, other: &Self, mapping: impl Fn(f64) -> f64) -> f64 {
        let (mut cross, mut norm_self, mut norm_other) = (0.0, 0.0, 0.0);
        for (k, &value) in self.values.iter().enumerate() {
            let sampled = other.at(mapping(self.offset(k)));
            cross += value * sampled;
            norm_self += value * value;
            norm_other += sampled * sampled;
        }
        let norm = (norm_self * norm_other).sqrt();
        if norm > 0.0 {
            cross / norm
        } else {
            0.0
        }
    }
}

/// Reference fitter flavors
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceKind {
    /// Density correlation only
    #[default]
    Histogram,
    /// Density correlation refined by the chi-square refiner on the peaks
    ChiSquare,
}

/// Configuration of the reference aligner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReferenceConfig {
    pub precision: f64,
    pub oversampling: usize,
    pub floor: f64,
    pub ceiling: f64,
    /// Reference units per bead unit
    pub stretch: Range,
    /// Bead units; without a center the range is relative to the densities' origins
    pub bias: Range,
    /// Add the correlation of the inverse transform
    pub symmetric: bool,
    pub kind: ReferenceKind,
    pub window: f64,
    pub rounds: usize,
    pub optimizer: OptimizerConfig,
}

impl Default for ReferenceConfig {
    fn default() -> Self {
        Self {
            precision: DEFAULT_PRECISION,
            oversampling: DEFAULT_OVERSAMPLING,
            floor: 0.0,
            ceiling: 1.0,
            stretch: Range::new(Some(1.0), 0.05, 0.025),
            bias: Range::new(None, 0.05, 0.005),
            symmetric: false,
            kind: ReferenceKind::default(),
            window: DEFAULT_REFERENCE_WINDOW,
            rounds: DEFAULT_ROUNDS,
            optimizer: OptimizerConfig {
                stopval: f64::NEG_INFINITY,
                ..OptimizerConfig::default()
            },
        }
    }
}

impl Validate for ReferenceConfig {
    fn invalid(&self) -> Option<String> {
        check_stretch("stretch", &self.stretch, 0.0)
            .or_else(|| check_range("bias", &self.bias))
            .or_else(|| check_positive("precision", self.precision))
            .or_else(|| check_positive("window", self.window))
            .or_else(|| {
                (self.oversampling == 0).then(|| "oversampling must be at least 1".to_string())
            })
            .or_else(|| {
                (self.floor.is_nan() || self.ceiling.is_nan() || self.floor > self.ceiling)
                    .then(|| format!("floor {} exceeds ceiling {}", self.floor, self.ceiling))
            })
    }
}

/// Aligns beads onto one reference bead.
///
/// The resulting distance maps bead positions onto the reference axis:
/// `reference = stretch * (bead - bias)`.
#[derive(Debug, Clone)]
pub struct ReferenceAligner {
    peaks: Vec<f64>,
    density: Option<Density>,
    config: ReferenceConfig,
}

impl ReferenceAligner {
    #[must_use]
    pub fn new(reference: &[f64], config: ReferenceConfig) -> Self {
        let density = (!reference.is_empty()).then(|| Density::new(reference, &config));
        Self {
            peaks: reference.to_vec(),
            density,
            config,
        }
    }

    #[must_use]
    pub fn config(&self) -> &ReferenceConfig {
        &self.config
    }

    /// Negative correlation for `bead = reference / stretch + shift` in
    /// origin-relative coordinates
    fn cost(&self, reference: &Density, bead: &Density, stretch: f64, shift: f64) -> f64 {
        let mut value = reference.correlation(bead, |u| u / stretch + shift);
        if self.config.symmetric {
            value += bead.correlation(reference, |w| stretch * (w - shift));
        }
        -value
    }

    fn shifts(&self, reference: &Density, bead: &Density, stretch: f64) -> (Vec<f64>, (f64, f64)) {
        let base = match self.config.bias.center {
            Some(_) => reference.origin / stretch - bead.origin,
            None => 0.0,
        };
        let (low, high) = self.config.bias.bounds();
        (
            self.config.bias.grid().into_iter().map(|b| b + base).collect(),
            (low + base, high + base),
        )
    }

    /// Best transform of `peaks` onto the reference.
    ///
    /// Fewer than 2 peaks on either side yield the sentinel distance.
    #[must_use]
    pub fn optimize(&self, peaks: &[f64]) -> Distance {
        let mut best = Distance::sentinel(&self.config.stretch, &self.config.bias);
        let reference = match &self.density {
            Some(density) if self.peaks.len() >= 2 && peaks.len() >= 2 => density,
            _ => return best,
        };
        let bead = Density::new(peaks, &self.config);

        let (lower, upper) = self.config.stretch.bounds();
        let stretch_bounds = (lower.max(f64::MIN_POSITIVE), upper.max(f64::MIN_POSITIVE));
        for stretch in self.config.stretch.grid() {
            let stretch = stretch.clamp(stretch_bounds.0, stretch_bounds.1);
            let (shifts, shift_bounds) = self.shifts(reference, &bead, stretch);
            let bounds = Bounds::Inequalities(vec![stretch_bounds, shift_bounds]);
            for shift in shifts {
                match minimize(
                    |x| self.cost(reference, &bead, x[0], x[1]),
                    &[stretch, shift],
                    &[0.5 * self.config.stretch.step, 0.5 * self.config.bias.step],
                    &bounds,
                    &self.config.optimizer,
                ) {
                    Ok(min) if min.value < best.value => {
                        let (a, beta) = (min.x[0], min.x[1]);
                        let bias = bead.origin + beta - reference.origin / a;
                        best = Distance::new(min.value, a, bias);
                    }
                    Ok(_) => {}
                    Err(err) => debug!("Skipping grid cell ({stretch}, {shift}): {err}"),
                }
            }
        }

        match self.config.kind {
            ReferenceKind::Histogram => best,
            ReferenceKind::ChiSquare if best.is_fitted() => self.refine(peaks, &best),
            ReferenceKind::ChiSquare => best,
        }
    }

    /// Chi-square refinement around a density fit, on the peaks
    fn refine(&self, peaks: &[f64], found: &Distance) -> Distance {
        let chisquare = ChiSquare {
            window: self.config.window,
            symmetry: Symmetry::Both,
            rounds: self.config.rounds,
            single_strand: false,
            baseline: false,
        };
        let (lower, upper) = self.config.stretch.bounds();
        // reference = stretch * bead + intercept, intercept = -stretch * bias
        let shift = -found.bias;
        let frame = Frame::absolute(
            (lower.max(f64::MIN_POSITIVE), upper.max(f64::MIN_POSITIVE)),
            (shift - self.config.bias.size, shift + self.config.bias.size),
        );
        let (value, stretch, intercept) = chisquare.refine(
            &self.peaks,
            peaks,
            &frame,
            found.stretch,
            frame.intercept(found.stretch, shift),
        );
        frame.distance(value, stretch, intercept)
    }
}

/// Composition of an alignment onto a reference bead with the reference
/// bead's own transform `(stretch, bias)` onto a hairpin
#[must_use]
pub fn with_transform(aligned: &Distance, reference: &Distance) -> Distance {
    Distance::new(
        aligned.value,
        reference.stretch * aligned.stretch,
        aligned.bias + reference.bias / aligned.stretch,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const REFERENCE: [f64; 4] = [0.5, 1.0, 1.3, 1.8];

    fn config() -> ReferenceConfig {
        ReferenceConfig {
            precision: 0.01,
            oversampling: 2,
            stretch: Range::new(Some(0.98), 0.04, 0.02),
            bias: Range::new(None, 0.06, 0.01),
            ..ReferenceConfig::default()
        }
    }

    #[test]
    fn test_density_shape() {
        let density = Density::new(&[1.0], &config());
        assert!((density.origin - 0.97).abs() < 1e-12);
        assert_eq!(density.binwidth, 0.005);
        assert!(density.values.len() >= 13);
        assert!((density.at(0.03) - 1.0).abs() < 1e-9);
        assert!((density.at(0.0275) - 0.5 * (density.values[5] + density.values[6])).abs() < 1e-9);
        assert_eq!(density.at(-0.01), 0.0);
        assert_eq!(density.at(1.0), 0.0);
    }

    #[test]
    fn test_density_clipped() {
        let conf = ReferenceConfig {
            floor: 0.2,
            ceiling: 0.8,
            ..config()
        };
        let density = Density::new(&[1.0], &conf);
        assert!(density.values.iter().all(|&v| (0.0..=0.6).contains(&v)));
        assert!((density.values[6] - 0.6).abs() < 1e-12);
    }

    #[test]
    fn test_align_recovers_transform() {
        for stretch in [0.96, 1.0] {
            for bias in [-0.05, 0.0, 0.05] {
                let bead: Vec<f64> = REFERENCE.iter().map(|r| r / stretch + bias).collect();
                let found = ReferenceAligner::new(&REFERENCE, config()).optimize(&bead);
                assert!((found.stretch - stretch).abs() < 5e-3, "{stretch} {bias}: {found:?}");
                assert!((found.bias - bias).abs() < 5e-3, "{stretch} {bias}: {found:?}");
                assert!(found.value < -0.9);
            }
        }
    }

    #[test]
    fn test_align_symmetric_and_chisquare() {
        let bead: Vec<f64> = REFERENCE.iter().map(|r| r / 0.96 + 0.02).collect();
        let conf = ReferenceConfig {
            symmetric: true,
            ..config()
        };
        let found = ReferenceAligner::new(&REFERENCE, conf).optimize(&bead);
        assert!((found.stretch - 0.96).abs() < 5e-3);
        assert!(found.value < -1.8);

        let conf = ReferenceConfig {
            kind: ReferenceKind::ChiSquare,
            ..config()
        };
        let found = ReferenceAligner::new(&REFERENCE, conf).optimize(&bead);
        assert!((found.stretch - 0.96).abs() < 1e-6, "{found:?}");
        assert!((found.bias - 0.02).abs() < 1e-6, "{found:?}");
    }

    #[test]
    fn test_density_far_offsets() {
        let density = Density::new(&[1.0], &config());
        assert_eq!(density.at(f64::INFINITY), 0.0);
        assert_eq!(density.at(f64::MAX), 0.0);
        assert_eq!(density.at(f64::NEG_INFINITY), 0.0);
    }

    #[test]
    fn test_align_stretch_range_reaching_zero() {
        let conf = ReferenceConfig {
            stretch: Range::new(Some(1.0), 1.0, 0.5),
            ..ReferenceConfig::default()
        };
        assert!(conf.invalid().unwrap().contains("lower bound"));

        // Still usable from the library: the zero stretch cell only sees empty densities
        let found = ReferenceAligner::new(&REFERENCE, conf).optimize(&REFERENCE);
        assert!(found.is_fitted());
        assert!((found.stretch - 1.0).abs() < 0.05, "{found:?}");
    }

    #[test]
    fn test_config_validation() {
        assert!(ReferenceConfig::default().invalid().is_none());
        let conf = ReferenceConfig {
            bias: Range::new(None, -0.05, 0.005),
            ..ReferenceConfig::default()
        };
        assert!(conf.invalid().unwrap().contains("bias size"));
        let conf = ReferenceConfig {
            oversampling: 0,
            ..ReferenceConfig::default()
        };
        assert!(conf.invalid().is_some());
    }

    #[test]
    fn test_align_too_few_peaks() {
        let found = ReferenceAligner::new(&REFERENCE, config()).optimize(&[1.0]);
        assert!(!found.is_fitted());
        assert!(!ReferenceAligner::new(&[], config()).optimize(&REFERENCE).is_fitted());
    }

    #[test]
    fn test_with_transform() {
        // bead -> reference: r = 0.5 * (x - 2); reference -> hairpin: t = 1000 * (r - 0.1)
        let composed = with_transform(
            &Distance::new(0.0, 0.5, 2.0),
            &Distance::new(0.0, 1000.0, 0.1),
        );
        let x = 3.0;
        let direct = 1000.0 * (0.5 * (x - 2.0) - 0.1);
        assert!((composed.apply(&[x])[0] - direct).abs() < 1e-9);
    }
}
