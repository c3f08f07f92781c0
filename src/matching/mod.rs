//! Fitting beads to hairpins and to reference beads.
//!
//! This module provides the fitting machinery:
//!
//! - [`BeadClassifier`]: Main entry point, fits a bead to every hairpin of a catalog
//! - [`HairpinFitter`]: Fits one bead to one hairpin
//! - [`PeakIdentifier`]: Labels peaks once a transform is known
//! - [`ReferenceAligner`]: Fits one bead onto a reference bead
//!
//! ## Fitting
//!
//! Every fit searches the affine transform `theoretical = stretch * (experimental - bias)`:
//!
//! 1. **Grid**: starting points are drawn from the stretch and bias ranges
//!    (or, for [`FitterKind::PeakGrid`], from every pair of peaks on both sides)
//! 2. **Local optimization**: each starting point is improved with a bounded
//!    Nelder-Mead search on a Gaussian cost, or with the chi-square refiner
//! 3. **Selection**: the lowest cost wins; the first one found on ties
//!
//! Beads with fewer than 2 peaks get a sentinel [`Distance`](crate::core::Distance)
//! whose cost is [`DEFAULT_BEST`](crate::core::DEFAULT_BEST).
//!
//! ## Example
//!
//! ```rust
//! use hairpin_solver::{Bead, BeadClassifier, HairpinCatalog, HairpinModel};
//!
//! let mut catalog = HairpinCatalog::new();
//! catalog.add("hp", HairpinModel::new(vec![0.0, 500.0, 1200.0, 2000.0], true).unwrap());
//!
//! let classifier = BeadClassifier::new(&catalog);
//! let result = classifier.classify(&Bead::new("bead 1", &[0.0, 0.44, 1.056, 1.76]), None);
//! assert_eq!(result.distances.len(), 1);
//! assert_eq!(result.silhouette, 1.0);
//! ```

pub mod chisquare;
pub mod cost;
pub mod engine;
pub mod fitter;
pub mod identify;
pub mod optimize;
pub mod reference;
pub mod scoring;
pub mod window;

pub use chisquare::ChiSquare;
pub use cost::GaussianCost;
pub use engine::{BeadClassifier, ClassifierConfig};
pub use fitter::{FitParams, FitterKind, Frame, HairpinFitter};
pub use identify::PeakIdentifier;
pub use optimize::{minimize, Bounds, OptimizerConfig, OptimizerError};
pub use reference::{with_transform, Density, ReferenceAligner, ReferenceConfig, ReferenceKind};
pub use scoring::{ranking, silhouette};
pub use window::{match_count, match_peaks};
