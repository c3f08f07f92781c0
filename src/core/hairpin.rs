use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::types::{count_to_f64, Range, DEFAULT_STRETCH};
use crate::sequences::{peaks, OligoSpec, SequencePeakSet};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    #[error("hairpin peaks must be finite and strictly ascending")]
    NotAscending,

    #[error("a hairpin needs at least 2 peaks, found {0}")]
    TooFewPeaks(usize),
}

/// Theoretical blockage positions of a hairpin, in base pairs.
///
/// The first peak is the closed hairpin (position 0) and the last is the
/// fully open hairpin (the strand size). Oligo bindings lie in between.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HairpinModel {
    peaks: Vec<f64>,
    /// Whether the fully open (single-strand) peak is expected in the data
    pub single_strand: bool,
}

impl HairpinModel {
    /// Create a model from its peaks, endpoints included.
    ///
    /// # Errors
    ///
    /// Returns `ModelError` if the peaks are not strictly ascending or fewer than 2.
    pub fn new(peaks: Vec<f64>, single_strand: bool) -> Result<Self, ModelError> {
        if peaks.len() < 2 {
            return Err(ModelError::TooFewPeaks(peaks.len()));
        }
        let ascending = peaks.iter().all(|x| x.is_finite())
            && peaks.windows(2).all(|w| w[0] < w[1]);
        if !ascending {
            return Err(ModelError::NotAscending);
        }
        Ok(Self {
            peaks,
            single_strand,
        })
    }

    /// Build a model by scanning a sequence for oligo bindings.
    #[must_use]
    pub fn from_sequence(sequence: &str, oligos: &OligoSpec) -> Self {
        Self::from_scan(sequence.len(), &peaks(sequence, oligos), oligos)
    }

    /// Build a model from the bindings found in a sequence of length `size`.
    ///
    /// Endpoints are added whether or not the oligos name them. The
    /// single-strand peak is expected only when the oligos carry the
    /// end sentinel.
    #[must_use]
    pub fn from_scan(size: usize, found: &SequencePeakSet, oligos: &OligoSpec) -> Self {
        let mut positions: Vec<usize> = found
            .iter()
            .map(|p| p.position)
            .filter(|&p| p > 0 && p < size)
            .collect();
        positions.insert(0, 0);
        // An empty sequence still needs two distinct endpoints.
        positions.push(size.max(1));

        Self {
            peaks: positions.into_iter().map(count_to_f64).collect(),
            single_strand: oligos.has_end(),
        }
    }

    /// All peaks, endpoints included
    #[must_use]
    pub fn peaks(&self) -> &[f64] {
        &self.peaks
    }

    /// Length of the fully open hairpin
    #[must_use]
    pub fn strand_size(&self) -> f64 {
        self.peaks[self.peaks.len() - 1]
    }

    /// Number of oligo bindings, endpoints excluded
    #[must_use]
    pub fn bindings(&self) -> usize {
        self.peaks.len() - 2
    }

    /// Peaks expected in the data: the last one is dropped unless the
    /// single-strand peak is expected.
    #[must_use]
    pub fn expected_peaks(&self) -> &[f64] {
        if self.single_strand {
            &self.peaks
        } else {
            &self.peaks[..self.peaks.len() - 1]
        }
    }

    /// Copy of the model with a different single-strand expectation
    #[must_use]
    pub fn with_single_strand(&self, single_strand: bool) -> Self {
        Self {
            peaks: self.peaks.clone(),
            single_strand,
        }
    }

    /// Whether a bead extension, in micrometers, fits this hairpin.
    ///
    /// The extension must be scaled by the pull phase ratio beforehand. The
    /// strand size has to be reachable from it with some stretch and bias of
    /// the given ranges: `(ext - max bias) * min stretch < size < (ext - min bias) * max stretch`.
    #[must_use]
    pub fn within_range(&self, extension: f64, stretch: &Range, bias: &Range) -> bool {
        let center = stretch.center.unwrap_or(DEFAULT_STRETCH);
        let (min_stretch, max_stretch) = (center - stretch.size, center + stretch.size);
        let (min_bias, max_bias) = bias.bounds();
        let size = self.strand_size();
        (extension - max_bias) * min_stretch < size && size < (extension - min_bias) * max_stretch
    }
}
