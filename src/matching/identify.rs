use crate::core::bead::{AssignedPeak, PeakAssignment, PeakEvent};
use crate::core::hairpin::HairpinModel;
use crate::core::types::Distance;
use crate::matching::window::match_peaks;

#[allow(clippy::cast_possible_truncation)]
fn to_key(position: f64) -> i64 {
    position.round() as i64
}

/// Labels experimental peaks with the hairpin positions they match.
#[derive(Debug, Clone)]
pub struct PeakIdentifier {
    peaks: Vec<f64>,
    window: f64,
}

impl PeakIdentifier {
    #[must_use]
    pub fn new(model: &HairpinModel, window: f64) -> Self {
        Self {
            peaks: model.expected_peaks().to_vec(),
            window,
        }
    }

    /// Theoretical position matched by each experimental peak.
    ///
    /// The distance carries an absolute bias, so peaks are mapped with it
    /// directly, whatever pivot the fit used.
    #[must_use]
    pub fn identify(&self, experimental: &[f64], distance: &Distance) -> Vec<Option<f64>> {
        let mut found = vec![None; experimental.len()];
        if self.peaks.is_empty() || experimental.is_empty() {
            return found;
        }

        let positions = distance.apply(experimental);
        for (i, j) in match_peaks(&self.peaks, &positions, self.window) {
            found[j] = Some(self.peaks[i]);
        }
        found
    }

    /// Assignment of a bead's peaks, events passed through
    #[must_use]
    pub fn assign(&self, peaks: &[PeakEvent], distance: &Distance) -> PeakAssignment {
        let positions: Vec<f64> = peaks.iter().map(|p| p.position).collect();
        self.identify(&positions, distance)
            .into_iter()
            .zip(peaks)
            .map(|(key, peak)| AssignedPeak {
                position: peak.position,
                key: key.map(to_key),
                events: peak.events.clone(),
            })
            .collect()
    }
}

/// Assignment with every peak left unmatched
#[must_use]
pub fn unassigned(peaks: &[PeakEvent]) -> PeakAssignment {
    peaks
        .iter()
        .map(|peak| AssignedPeak {
            position: peak.position,
            key: None,
            events: peak.events.clone(),
        })
        .collect()
}
