//! Parsers for the inputs of a fit.
//!
//! This module provides parsers for:
//!
//! - **Sequence sources**: lenient FASTA files, plain or gzip compressed, or
//!   an inline sequence
//! - **Bead batches**: JSON documents holding the beads' peaks and per-bead
//!   constraints
//!
//! ## Example
//!
//! ```rust,no_run
//! use hairpin_solver::parsing::{beads::read_beads, fasta::read_sequences};
//! use std::path::Path;
//!
//! let sequences = read_sequences("hairpins.fasta").unwrap();
//! let batch = read_beads(Path::new("beads.json")).unwrap();
//! ```

use thiserror::Error;

pub mod beads;
pub mod fasta;

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    #[error("Too many records: {0} exceeds maximum allowed (100000)")]
    TooManyRecords(usize),

    #[error("Invalid peaks for bead {key}: {reason}")]
    InvalidPeaks { key: String, reason: String },
}
