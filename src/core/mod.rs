//! Core data types for hairpin fitting.
//!
//! This module provides the value types shared by the whole library:
//!
//! - [`HairpinModel`]: Theoretical blockage positions of a hairpin, in base pairs
//! - [`Bead`]: Experimental blockage positions of one bead, in micrometers
//! - [`Distance`]: Cost and affine transform of a fit
//! - [`Range`]: Search range of a transform parameter
//! - [`FitResult`], [`AssignedPeak`]: Classification output
//!
//! ## Axes
//!
//! Experimental positions are measured in micrometers with an unknown
//! origin and scale. Theoretical positions are base pairs counted from the
//! closed end of the hairpin. A [`Distance`] maps the former onto the latter:
//!
//! ```text
//! theoretical = stretch * (experimental - bias)
//! ```

pub mod bead;
pub mod hairpin;
pub mod types;

pub use bead::{
    AssignedPeak, Bead, BeadConstraint, FitResult, PeakAssignment, PeakEvent, PivotContext,
    INVALID_SILHOUETTE,
};
pub use hairpin::{HairpinModel, ModelError};
pub use types::{Distance, Pivot, Range, RangeOverride, Symmetry, DEFAULT_BEST, DEFAULT_STRETCH};
