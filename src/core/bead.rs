use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::core::types::{Distance, RangeOverride};

/// One detected blockage with whatever the peak finder attached to it.
///
/// Deserializes either from a bare position or from an object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawPeak")]
pub struct PeakEvent {
    /// Position in micrometers
    pub position: f64,
    /// Opaque payload carried through to the result
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub events: serde_json::Value,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawPeak {
    Plain(f64),
    Event {
        position: f64,
        #[serde(default)]
        events: serde_json::Value,
    },
}

impl From<RawPeak> for PeakEvent {
    fn from(raw: RawPeak) -> Self {
        match raw {
            RawPeak::Plain(position) => Self::from(position),
            RawPeak::Event { position, events } => Self { position, events },
        }
    }
}

impl From<f64> for PeakEvent {
    fn from(position: f64) -> Self {
        Self {
            position,
            events: serde_json::Value::Null,
        }
    }
}

/// Which ends of the hairpin were detected in the bead's trace.
///
/// `None` means unknown, which leaves the fit configuration untouched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PivotContext {
    #[serde(default)]
    pub baseline: Option<bool>,
    #[serde(default)]
    pub single_strand: Option<bool>,
}

/// A bead's ordered peaks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bead {
    pub key: serde_json::Value,
    pub peaks: Vec<PeakEvent>,
    #[serde(flatten)]
    pub context: PivotContext,
    /// Bead extension in micrometers, when measured
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extension: Option<f64>,
}

impl Bead {
    #[must_use]
    pub fn new(key: impl Into<serde_json::Value>, positions: &[f64]) -> Self {
        Self {
            key: key.into(),
            peaks: positions.iter().copied().map(PeakEvent::from).collect(),
            context: PivotContext::default(),
            extension: None,
        }
    }

    /// Peak positions in micrometers
    #[must_use]
    pub fn positions(&self) -> Vec<f64> {
        self.peaks.iter().map(|p| p.position).collect()
    }

    /// Key as used by the constraint map
    #[must_use]
    pub fn key_string(&self) -> String {
        key_to_string(&self.key)
    }
}

/// Bead key as text: strings unquoted, other values in JSON
#[must_use]
pub fn key_to_string(key: &serde_json::Value) -> String {
    match key {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Per-bead override: a forced hairpin and narrowed ranges
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BeadConstraint {
    #[serde(default)]
    pub hairpin: Option<String>,
    #[serde(default)]
    pub stretch: Option<RangeOverride>,
    #[serde(default)]
    pub bias: Option<RangeOverride>,
}

/// One experimental peak and the theoretical position it was assigned to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssignedPeak {
    pub position: f64,
    /// Theoretical position in base pairs, `None` when unmatched
    pub key: Option<i64>,
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub events: serde_json::Value,
}

/// Per experimental peak assignment
pub type PeakAssignment = Vec<AssignedPeak>;

/// Silhouette reported when no hairpin could be fitted
pub const INVALID_SILHOUETTE: f64 = -3.0;

/// Classification of one bead
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitResult {
    pub key: serde_json::Value,
    /// Confidence in `[-1, 1]`, or `INVALID_SILHOUETTE`
    pub silhouette: f64,
    /// Fit of every candidate hairpin
    pub distances: BTreeMap<String, Distance>,
    /// Best hairpin, if any was fitted
    pub hairpin: Option<String>,
    pub peaks: PeakAssignment,
}

impl FitResult {
    /// Distance to the best hairpin
    #[must_use]
    pub fn best(&self) -> Option<&Distance> {
        self.hairpin.as_ref().and_then(|name| self.distances.get(name))
    }

    /// Key of the classified bead, as in [`Bead::key_string`]
    #[must_use]
    pub fn key_string(&self) -> String {
        key_to_string(&self.key)
    }

    /// Number of peaks assigned to a theoretical position
    #[must_use]
    pub fn assigned(&self) -> usize {
        self.peaks.iter().filter(|p| p.key.is_some()).count()
    }
}
