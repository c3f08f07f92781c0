//! # hairpin-solver
//!
//! A library for identifying DNA hairpins from the blockages measured on
//! unzipping beads.
//!
//! In a hairpin unzipping experiment, short oligos hybridize to a folded DNA
//! hairpin and transiently block its opening. The instrument records the
//! positions of these blockages ("peaks") in micrometers, with an unknown
//! origin and scale. The positions where the oligos bind are known in base
//! pairs from the hairpin's sequence.
//!
//! `hairpin-solver` finds, for each bead, the hairpin that best explains its
//! peaks, the affine transform from micrometers to base pairs, and which
//! hairpin position each peak corresponds to.
//!
//! ## Features
//!
//! - **Oligo scanning**: IUPAC motifs on both strands, palindromic markers
//!   and hairpin end sentinels
//! - **Robust fitting**: tolerates missing and extra peaks
//! - **Several fitters**: Gaussian cost grid, chi-square refinement, peak pair grid
//! - **Confidence**: silhouette score of the best hairpin against the runner-up
//! - **Reference alignment**: fits beads onto a reference bead when no sequence is known
//!
//! ## Example
//!
//! ```rust
//! use hairpin_solver::{Bead, BeadClassifier, HairpinCatalog};
//! use hairpin_solver::sequences::split;
//!
//! // Scan the hairpin sequences for the oligo bindings
//! let oligos = split("atat,ccc,$").unwrap();
//! let sequences = vec![("hp".to_string(), "atcgATATATgtcgCCCaaGGG".to_string())];
//! let catalog = HairpinCatalog::from_sequences(&sequences, &oligos);
//!
//! // Fit a bead
//! let classifier = BeadClassifier::new(&catalog);
//! let result = classifier.classify(&Bead::new(0, &[0.0, 0.007, 0.0088, 0.015]), None);
//!
//! println!("{:?}: {:.2}", result.hairpin, result.silhouette);
//! ```
//!
//! ## Modules
//!
//! - [`catalog`]: Hairpin catalog built from sequences
//! - [`core`]: Core data types for hairpins, beads, and fits
//! - [`matching`]: Fitters, classifier, and reference aligner
//! - [`parsing`]: Parsers for sequence files and bead batches
//! - [`sequences`]: Oligo specifications and the sequence scanner
//! - [`cli`]: Command-line interface implementation

pub mod catalog;
pub mod cli;
pub mod core;
pub mod matching;
pub mod parsing;
pub mod sequences;
pub mod utils;

// Re-export commonly used types for convenience
pub use catalog::store::HairpinCatalog;
pub use core::bead::{Bead, BeadConstraint, FitResult, INVALID_SILHOUETTE};
pub use core::hairpin::HairpinModel;
pub use core::types::*;
pub use matching::engine::{BeadClassifier, ClassifierConfig};
pub use matching::fitter::{FitParams, FitterKind, HairpinFitter};
pub use matching::reference::{ReferenceAligner, ReferenceConfig};
