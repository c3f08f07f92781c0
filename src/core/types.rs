use serde::{Deserialize, Serialize};

/// Cost reported when no fit could be computed.
///
/// Single precision maximum, so that the value survives a round trip through
/// `f32` based report formats.
pub const DEFAULT_BEST: f64 = f32::MAX as f64;

/// Default stretch in base pairs per micrometer.
pub const DEFAULT_STRETCH: f64 = 1.0 / 8.8e-4;

/// Safely convert usize to f64 for averages and grid sizes
#[inline]
pub(crate) fn count_to_f64(count: usize) -> f64 {
    #[allow(clippy::cast_precision_loss)]
    {
        count as f64
    }
}

/// A search range: `center ± size`, explored with the given `step`.
///
/// A missing center means the range is explored around zero and that the
/// actual center is data dependent (a bias, for example).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Range {
    #[serde(default)]
    pub center: Option<f64>,
    pub size: f64,
    pub step: f64,
}

impl Range {
    #[must_use]
    pub const fn new(center: Option<f64>, size: f64, step: f64) -> Self {
        Self { center, size, step }
    }

    /// Lower and upper bounds of the range
    #[must_use]
    pub fn bounds(&self) -> (f64, f64) {
        let center = self.center.unwrap_or(0.0);
        (center - self.size, center + self.size)
    }

    /// Grid values explored for this range.
    ///
    /// The count is always odd so the center is part of the grid. A range
    /// whose size is smaller than half a step collapses to its center.
    #[must_use]
    pub fn grid(&self) -> Vec<f64> {
        let count = if self.step > 0.0 && self.size.is_finite() && self.size > 0.0 {
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let half = ((2.0 * self.size / self.step + 0.5) as usize) / 2;
            half * 2 + 1
        } else {
            1
        };

        let center = self.center.unwrap_or(0.0);
        if count == 1 {
            return vec![center];
        }

        let first = center - self.size;
        let delta = 2.0 * self.size / count_to_f64(count - 1);
        (0..count).map(|i| first + delta * count_to_f64(i)).collect()
    }

    /// Copy of this range with any value set in `other` taking precedence
    #[must_use]
    pub fn merged(&self, other: &RangeOverride) -> Self {
        Self {
            center: other.center.or(self.center),
            size: other.size.unwrap_or(self.size),
            step: other.step.unwrap_or(self.step),
        }
    }
}

/// Partial range used by per-bead overrides
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RangeOverride {
    #[serde(default)]
    pub center: Option<f64>,
    #[serde(default)]
    pub size: Option<f64>,
    #[serde(default)]
    pub step: Option<f64>,
}

/// Result of fitting a bead to a hairpin or to a reference.
///
/// The transform maps experimental positions (micrometers) onto the
/// theoretical axis (base pairs): `theoretical = stretch * (experimental - bias)`.
/// The bias is therefore expressed in micrometers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Distance {
    /// Fit cost, lower is better
    pub value: f64,
    pub stretch: f64,
    pub bias: f64,
}

impl Distance {
    #[must_use]
    pub const fn new(value: f64, stretch: f64, bias: f64) -> Self {
        Self {
            value,
            stretch,
            bias,
        }
    }

    /// Sentinel distance built from range centers
    #[must_use]
    pub fn sentinel(stretch: &Range, bias: &Range) -> Self {
        Self::new(
            DEFAULT_BEST,
            stretch.center.unwrap_or(DEFAULT_STRETCH),
            bias.center.unwrap_or(0.0),
        )
    }

    /// Whether this distance carries an actual fit
    #[must_use]
    pub fn is_fitted(&self) -> bool {
        self.value.is_finite() && self.value < DEFAULT_BEST
    }

    /// Map experimental positions onto the theoretical axis
    #[must_use]
    pub fn apply(&self, positions: &[f64]) -> Vec<f64> {
        positions
            .iter()
            .map(|&x| self.stretch * (x - self.bias))
            .collect()
    }
}

/// Anchor of the affine fit
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Pivot {
    /// Both sides are referenced to zero
    Absolute,
    /// Both sides are referenced to their last peak (the single-strand peak)
    Top,
    /// Experimental peaks are referenced to their first peak (the baseline)
    #[default]
    Bottom,
}

/// Which unmatched peaks are penalized by a cost function
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Symmetry {
    /// Unmatched peaks on both sides
    Both,
    /// Only unmatched theoretical peaks
    Theoretical,
    /// Only unmatched experimental peaks
    #[default]
    Experimental,
}
