//! Catalog of candidate hairpins.
//!
//! The catalog maps hairpin names to their theoretical peaks. It is built by
//! scanning hairpin sequences for an oligo set, and can be saved to JSON so
//! that later fits skip the scan.
//!
//! ## Example
//!
//! ```rust,no_run
//! use hairpin_solver::HairpinCatalog;
//! use hairpin_solver::sequences::split;
//! use std::path::Path;
//!
//! // Scan a FASTA file
//! let oligos = split("ctgt,$").unwrap();
//! let catalog = HairpinCatalog::load_sequences("hairpins.fasta", &oligos).unwrap();
//!
//! // Save, then reload without scanning
//! std::fs::write("catalog.json", catalog.to_json().unwrap()).unwrap();
//! let saved = HairpinCatalog::load_from_file(Path::new("catalog.json")).unwrap();
//! ```

pub mod store;
