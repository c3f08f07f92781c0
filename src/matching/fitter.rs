//! Fitting one bead's peaks to one hairpin.
//!
//! All flavors work in a re-zeroed frame chosen by the [`Pivot`]: the
//! experimental and theoretical positions are shifted so that the pivot
//! peaks sit at zero, then the transform `t = stretch * x + intercept` is
//! searched on a grid of (stretch, bias) starting points. The best
//! transform is converted back to a [`Distance`] on the original axes.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::bead::BeadConstraint;
use crate::core::hairpin::HairpinModel;
use crate::core::types::{Distance, Pivot, Range, Symmetry, DEFAULT_STRETCH};
use crate::matching::chisquare::ChiSquare;
use crate::matching::cost::GaussianCost;
use crate::matching::optimize::{minimize, Bounds, OptimizerConfig};
use crate::matching::window::match_count;
use crate::utils::validation::{check_positive, check_range, check_stretch, Validate};

/// Kernel width of the Gaussian cost, in base pairs
pub const DEFAULT_SIGMA: f64 = 15.0;
/// Maximum distance between paired peaks, in base pairs
pub const DEFAULT_WINDOW: f64 = 10.0;
/// Number of match-then-regress rounds of the chi-square refiner
pub const DEFAULT_ROUNDS: usize = 2;

/// Search ranges and cost settings shared by all fitter flavors
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FitParams {
    /// Base pairs per micrometer
    pub stretch: Range,
    /// Micrometers; without a center the range is relative to the pivot
    pub bias: Range,
    pub sigma: f64,
    pub window: f64,
    pub rounds: usize,
    pub pivot: Pivot,
    pub symmetry: Symmetry,
    pub optimizer: OptimizerConfig,
}

impl Default for FitParams {
    fn default() -> Self {
        Self {
            stretch: Range::new(Some(DEFAULT_STRETCH), 200.0, 100.0),
            bias: Range::new(None, 60.0 * 8.8e-4, 60.0 * 8.8e-4),
            sigma: DEFAULT_SIGMA,
            window: DEFAULT_WINDOW,
            rounds: DEFAULT_ROUNDS,
            pivot: Pivot::default(),
            symmetry: Symmetry::default(),
            optimizer: OptimizerConfig::default(),
        }
    }
}

impl Validate for FitParams {
    fn invalid(&self) -> Option<String> {
        check_stretch("stretch", &self.stretch, DEFAULT_STRETCH)
            .or_else(|| check_range("bias", &self.bias))
            .or_else(|| check_positive("sigma", self.sigma))
            .or_else(|| check_positive("window", self.window))
    }
}

impl FitParams {
    /// Copy of these parameters with a bead's narrowed ranges applied
    #[must_use]
    pub fn with_constraint(&self, constraint: &BeadConstraint) -> Self {
        let mut params = self.clone();
        if let Some(stretch) = &constraint.stretch {
            params.stretch = self.stretch.merged(stretch);
        }
        if let Some(bias) = &constraint.bias {
            params.bias = self.bias.merged(bias);
        }
        params
    }

    /// Sentinel distance for beads that cannot be fitted
    #[must_use]
    pub fn sentinel(&self) -> Distance {
        Distance::sentinel(&self.stretch, &self.bias)
    }

    /// Frame for a pair of position lists, both non-empty
    #[must_use]
    pub fn frame(&self, theoretical: &[f64], experimental: &[f64]) -> Frame {
        let (delta, offset) = match self.pivot {
            Pivot::Absolute => (0.0, 0.0),
            Pivot::Bottom => (experimental[0], 0.0),
            Pivot::Top => (
                experimental[experimental.len() - 1],
                theoretical[theoretical.len() - 1],
            ),
        };

        let (lower, upper) = self.stretch.bounds();
        let (shift, lift) = match self.bias.center {
            Some(center) => (
                (
                    delta - center - self.bias.size,
                    delta - center + self.bias.size,
                ),
                offset,
            ),
            None => ((-self.bias.size, self.bias.size), 0.0),
        };
        Frame {
            delta,
            offset,
            lift,
            stretch: (lower.max(f64::MIN_POSITIVE), upper.max(f64::MIN_POSITIVE)),
            shift,
        }
    }

    fn shifts(&self, frame: &Frame) -> Vec<f64> {
        match self.bias.center {
            Some(_) => self.bias.grid().into_iter().map(|b| frame.delta - b).collect(),
            None => self.bias.grid().into_iter().map(|b| -b).collect(),
        }
    }
}

/// Re-zeroed coordinates of a fit.
///
/// In the frame, `t - offset = stretch * (x - delta) + intercept` and the
/// intercept is written `stretch * shift - lift`, with `shift` bounded.
/// A bias range with a center is absolute (`lift == offset`), one without
/// is relative to the aligned pivots (`lift == 0`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame {
    /// Experimental pivot, in micrometers
    pub delta: f64,
    /// Theoretical pivot, in base pairs
    pub offset: f64,
    pub lift: f64,
    pub stretch: (f64, f64),
    pub shift: (f64, f64),
}

impl Frame {
    /// Frame without re-zeroing
    #[must_use]
    pub fn absolute(stretch: (f64, f64), shift: (f64, f64)) -> Self {
        Self {
            delta: 0.0,
            offset: 0.0,
            lift: 0.0,
            stretch,
            shift,
        }
    }

    /// Positions moved into the frame
    #[must_use]
    pub fn experimental(&self, positions: &[f64]) -> Vec<f64> {
        positions.iter().map(|x| x - self.delta).collect()
    }

    #[must_use]
    pub fn theoretical(&self, positions: &[f64]) -> Vec<f64> {
        positions.iter().map(|t| t - self.offset).collect()
    }

    #[must_use]
    pub fn intercept(&self, stretch: f64, shift: f64) -> f64 {
        stretch * shift - self.lift
    }

    #[must_use]
    pub fn intercept_bounds(&self, stretch: f64) -> (f64, f64) {
        (
            self.intercept(stretch, self.shift.0),
            self.intercept(stretch, self.shift.1),
        )
    }

    /// Closest admissible transform
    #[must_use]
    pub fn clamp(&self, stretch: f64, intercept: f64) -> (f64, f64) {
        let stretch = stretch.clamp(self.stretch.0, self.stretch.1);
        let (lower, upper) = self.intercept_bounds(stretch);
        (stretch, intercept.clamp(lower, upper))
    }

    #[must_use]
    pub fn contains(&self, stretch: f64, intercept: f64) -> bool {
        let (lower, upper) = self.intercept_bounds(stretch);
        self.stretch.0 <= stretch
            && stretch <= self.stretch.1
            && lower <= intercept
            && intercept <= upper
    }

    /// Transform found in the frame, expressed on the original axes
    #[must_use]
    pub fn distance(&self, value: f64, stretch: f64, intercept: f64) -> Distance {
        Distance::new(
            value,
            stretch,
            self.delta - (intercept + self.offset) / stretch,
        )
    }
}

/// Fitter flavors
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FitterKind {
    /// Grid of bounded local optimizations of the Gaussian cost
    Gaussian,
    /// Gaussian fit of each grid cell, refined by the chi-square refiner
    ChiSquare,
    /// Transforms aligning every pair of peaks on both sides, refined by
    /// the chi-square refiner
    #[default]
    PeakGrid,
}

/// Fits experimental peaks to one hairpin
#[derive(Debug, Clone)]
pub struct HairpinFitter {
    peaks: Vec<f64>,
    single_strand: bool,
    params: FitParams,
    kind: FitterKind,
}

impl HairpinFitter {
    #[must_use]
    pub fn new(model: &HairpinModel, params: FitParams, kind: FitterKind) -> Self {
        Self {
            peaks: model.expected_peaks().to_vec(),
            single_strand: model.single_strand,
            params,
            kind,
        }
    }

    #[must_use]
    pub fn params(&self) -> &FitParams {
        &self.params
    }

    fn chisquare(&self) -> ChiSquare {
        ChiSquare {
            window: self.params.window,
            symmetry: self.params.symmetry,
            rounds: self.params.rounds,
            single_strand: self.single_strand,
            baseline: self.params.pivot != Pivot::Absolute,
        }
    }

    /// Best transform from experimental peaks (micrometers) to this hairpin.
    ///
    /// Fewer than 2 peaks on either side yield the sentinel distance.
    #[must_use]
    pub fn optimize(&self, experimental: &[f64]) -> Distance {
        let mut best = self.params.sentinel();
        if experimental.len() < 2 || self.peaks.len() < 2 {
            return best;
        }

        let frame = self.params.frame(&self.peaks, experimental);
        let theo = frame.theoretical(&self.peaks);
        let exp = frame.experimental(experimental);

        let found = match self.kind {
            FitterKind::Gaussian => self.gaussian_cells(&frame, &theo, &exp),
            FitterKind::ChiSquare => {
                let chisquare = self.chisquare();
                self.gaussian_cells(&frame, &theo, &exp)
                    .into_iter()
                    .map(|(_, a, b)| chisquare.refine(&theo, &exp, &frame, a, b))
                    .collect()
            }
            FitterKind::PeakGrid => self.peak_grid(&frame, &theo, &exp),
        };

        for (value, stretch, intercept) in found {
            if value < best.value {
                best = frame.distance(value, stretch, intercept);
            }
        }
        best
    }

    /// Local optimum of the Gaussian cost from every grid cell
    fn gaussian_cells(&self, frame: &Frame, theo: &[f64], exp: &[f64]) -> Vec<(f64, f64, f64)> {
        let cost = GaussianCost::new(theo, exp, self.params.sigma, self.params.symmetry);
        let shifts = self.params.shifts(frame);
        let mut found = Vec::new();

        for stretch in self.params.stretch.grid() {
            let stretch = stretch.clamp(frame.stretch.0, frame.stretch.1);
            let margin = stretch * self.params.bias.step;
            for &shift in &shifts {
                let intercept = frame.intercept(stretch, shift);
                let bounds = Bounds::Box(vec![
                    frame.stretch,
                    (intercept - margin, intercept + margin),
                ]);
                match minimize(
                    |x| cost.value(x[0], x[1]),
                    &[stretch, intercept],
                    &[0.5 * self.params.stretch.step, 0.5 * margin],
                    &bounds,
                    &self.params.optimizer,
                ) {
                    Ok(min) => found.push((min.value, min.x[0], min.x[1])),
                    Err(err) => debug!("Skipping grid cell ({stretch}, {intercept}): {err}"),
                }
            }
        }
        found
    }

    /// Chi-square refinement of the transforms pairing two peaks on each side
    fn peak_grid(&self, frame: &Frame, theo: &[f64], exp: &[f64]) -> Vec<(f64, f64, f64)> {
        let center = self.params.stretch.center.unwrap_or(DEFAULT_STRETCH);
        let shift = match self.params.bias.center {
            Some(bias) => frame.delta - bias,
            None => 0.0,
        };
        let (stretch, intercept) = frame.clamp(center, frame.intercept(center, shift));
        let mut candidates = vec![(stretch, intercept)];

        for (i, &t_low) in theo.iter().enumerate() {
            for &t_high in &theo[i + 1..] {
                for (j, &x_low) in exp.iter().enumerate() {
                    for &x_high in &exp[j + 1..] {
                        if x_high <= x_low {
                            continue;
                        }
                        let stretch = (t_high - t_low) / (x_high - x_low);
                        let intercept = t_low - stretch * x_low;
                        if frame.contains(stretch, intercept) {
                            candidates.push((stretch, intercept));
                        }
                    }
                }
            }
        }

        let counts: Vec<usize> = candidates
            .iter()
            .map(|&(a, b)| match_count(theo, exp, self.params.window, a, b))
            .collect();
        let most = counts.iter().copied().max().unwrap_or(0);
        debug!(
            "{} candidate transforms, at most {most} pairs",
            candidates.len()
        );

        let chisquare = self.chisquare();
        candidates
            .into_iter()
            .zip(counts)
            .filter(|&(_, pairs)| pairs + 1 >= most)
            .map(|((a, b), _)| chisquare.refine(theo, exp, frame, a, b))
            .collect()
    }
}
