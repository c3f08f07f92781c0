//! Reader for bead batches.
//!
//! A batch is a JSON document holding the beads' peaks and optional
//! per-bead constraints keyed by bead key:
//!
//! ```json
//! {
//!   "beads": [
//!     {"key": 0, "peaks": [0.0, 0.0044, 0.0105], "baseline": true},
//!     {"key": 1, "peaks": [{"position": 0.1, "events": [[10, 20]]}]}
//!   ],
//!   "constraints": {"1": {"hairpin": "hp100", "stretch": {"size": 10}}}
//! }
//! ```

use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::{Bead, BeadConstraint};
use crate::parsing::ParseError;
use crate::utils::validation::{check_peaks, check_range_override, MAX_BEADS};

/// Beads to process together and their overrides
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BeadBatch {
    pub beads: Vec<Bead>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub constraints: BTreeMap<String, BeadConstraint>,
}

impl BeadBatch {
    /// Constraint attached to a bead, if any
    #[must_use]
    pub fn constraint(&self, bead: &Bead) -> Option<&BeadConstraint> {
        self.constraints.get(&bead.key_string())
    }

    /// Find a bead by key
    #[must_use]
    pub fn find(&self, key: &str) -> Option<&Bead> {
        self.beads.iter().find(|b| b.key_string() == key)
    }
}

/// Parse a bead batch from JSON text
///
/// # Errors
///
/// Returns `ParseError::Json` if the text is not a valid batch,
/// `ParseError::InvalidFormat` if it holds too many beads or a constraint
/// with a negative or non-finite range, or
/// `ParseError::InvalidPeaks` if a bead's peaks are unusable.
pub fn parse_beads_json(text: &str) -> Result<BeadBatch, ParseError> {
    let batch: BeadBatch = serde_json::from_str(text)?;
    if batch.beads.len() > MAX_BEADS {
        return Err(ParseError::InvalidFormat(format!(
            "{} beads exceed maximum of {MAX_BEADS}",
            batch.beads.len()
        )));
    }

    for bead in &batch.beads {
        if let Some(reason) = check_peaks(&bead.positions()) {
            return Err(ParseError::InvalidPeaks {
                key: bead.key_string(),
                reason,
            });
        }
    }

    for (key, constraint) in &batch.constraints {
        let reason = constraint
            .stretch
            .as_ref()
            .and_then(|range| check_range_override("stretch", range))
            .or_else(|| {
                constraint
                    .bias
                    .as_ref()
                    .and_then(|range| check_range_override("bias", range))
            });
        if let Some(reason) = reason {
            return Err(ParseError::InvalidFormat(format!(
                "constraint of bead {key}: {reason}"
            )));
        }
    }
    Ok(batch)
}

/// Read a bead batch from a file, or from stdin when the path is `-`
///
/// # Errors
///
/// Returns `ParseError::Io` if the input cannot be read, or any error of
/// [`parse_beads_json`].
pub fn read_beads(path: &Path) -> Result<BeadBatch, ParseError> {
    let text = if path.as_os_str() == "-" {
        let mut text = String::new();
        std::io::stdin().read_to_string(&mut text)?;
        text
    } else {
        std::fs::read_to_string(path)?
    };
    parse_beads_json(&text)
}
