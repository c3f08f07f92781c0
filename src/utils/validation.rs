//! Centralized input limits and checks.

use crate::core::types::{Range, RangeOverride};

/// Maximum number of sequences read from a single source
pub const MAX_SEQUENCES: usize = 100_000;

/// Maximum number of beads in a single batch
pub const MAX_BEADS: usize = 1_000_000;

/// Maximum number of peaks in a single bead
pub const MAX_PEAKS: usize = 10_000;

/// Check if adding another sequence would exceed the maximum allowed.
///
/// Call this with the current count BEFORE adding a new sequence.
/// Returns an error message if adding would exceed the limit, None if safe to add.
#[must_use]
pub fn check_sequence_limit(count: usize) -> Option<String> {
    if count >= MAX_SEQUENCES {
        Some(format!(
            "Too many sequences: adding another would exceed maximum of {MAX_SEQUENCES}"
        ))
    } else {
        None
    }
}

/// Validate a bead's peak positions.
///
/// Returns a description of the first problem found, None if the peaks
/// are finite, sorted and not too many.
///
/// # Examples
///
/// ```
/// use hairpin_solver::utils::validation::check_peaks;
///
/// assert!(check_peaks(&[0.0, 0.1, 0.1, 0.5]).is_none());
/// assert!(check_peaks(&[0.0, f64::NAN]).is_some());
/// assert!(check_peaks(&[0.5, 0.1]).is_some());
/// ```
#[must_use]
pub fn check_peaks(peaks: &[f64]) -> Option<String> {
    if peaks.len() > MAX_PEAKS {
        return Some(format!(
            "{} peaks exceed maximum of {MAX_PEAKS}",
            peaks.len()
        ));
    }
    if let Some(bad) = peaks.iter().find(|x| !x.is_finite()) {
        return Some(format!("non-finite peak position {bad}"));
    }
    if let Some(i) = peaks.windows(2).position(|w| w[0] > w[1]) {
        return Some(format!(
            "peaks are not sorted: {} follows {}",
            peaks[i + 1],
            peaks[i]
        ));
    }
    None
}

/// Configurations checked once deserialized
pub trait Validate {
    /// Description of the first invalid value, None if all are usable
    fn invalid(&self) -> Option<String>;
}

fn check_extent(name: &str, field: &str, value: f64) -> Option<String> {
    (!value.is_finite() || value < 0.0)
        .then(|| format!("{name} {field} must be finite and non-negative, found {value}"))
}

/// Validate a search range: finite center, non-negative size and step.
#[must_use]
pub fn check_range(name: &str, range: &Range) -> Option<String> {
    if let Some(center) = range.center.filter(|c| !c.is_finite()) {
        return Some(format!("{name} center must be finite, found {center}"));
    }
    check_extent(name, "size", range.size).or_else(|| check_extent(name, "step", range.step))
}

/// Validate a stretch range, which must also stay strictly positive.
#[must_use]
pub fn check_stretch(name: &str, range: &Range, default_center: f64) -> Option<String> {
    check_range(name, range).or_else(|| {
        let lower = range.center.unwrap_or(default_center) - range.size;
        (lower <= 0.0).then(|| format!("{name} lower bound must be positive, found {lower}"))
    })
}

/// Validate a per-bead override, only the values it sets
#[must_use]
pub fn check_range_override(name: &str, range: &RangeOverride) -> Option<String> {
    if let Some(center) = range.center.filter(|c| !c.is_finite()) {
        return Some(format!("{name} center must be finite, found {center}"));
    }
    range
        .size
        .and_then(|size| check_extent(name, "size", size))
        .or_else(|| range.step.and_then(|step| check_extent(name, "step", step)))
}

/// Validate a strictly positive parameter
#[must_use]
pub fn check_positive(name: &str, value: f64) -> Option<String> {
    (!value.is_finite() || value <= 0.0)
        .then(|| format!("{name} must be finite and positive, found {value}"))
}
