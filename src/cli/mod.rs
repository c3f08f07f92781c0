//! Command-line interface for hairpin-solver.
//!
//! This module implements the CLI using clap. Available commands:
//!
//! - **peaks**: Scan hairpin sequences for oligo bindings
//! - **fit**: Find the hairpin and the transform of every bead in a batch
//! - **align**: Align every bead of a batch onto a reference bead
//!
//! ## Usage
//!
//! ```text
//! # Theoretical peaks of each hairpin
//! hairpin-solver peaks hairpins.fasta --oligos "ctgt,$"
//!
//! # Save them as a catalog for later fits
//! hairpin-solver peaks hairpins.fasta --oligos "ctgt,$" --catalog-out catalog.json
//!
//! # Fit beads, JSON output for scripting
//! hairpin-solver fit beads.json --sequences hairpins.fasta --oligos "ctgt,$" --format json
//!
//! # Align beads onto bead 12
//! hairpin-solver align beads.json --reference 12
//! ```

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Args, Parser, Subcommand};

use crate::catalog::store::HairpinCatalog;
use crate::parsing::ParseError;
use crate::sequences::split;
use crate::utils::validation::Validate;

pub mod align;
pub mod fit;
pub mod peaks;

#[derive(Parser)]
#[command(name = "hairpin-solver")]
#[command(version)]
#[command(about = "Identify hairpins and fit peak positions of DNA unzipping beads")]
#[command(
    long_about = "hairpin-solver matches the blockage positions measured on unzipping beads against the oligo binding positions of known hairpin sequences.\n\nFor each bead it provides:\n- The most likely hairpin and a confidence score\n- The stretch and bias converting micrometers to base pairs\n- The hairpin position matched by each peak"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format
    #[arg(short, long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Scan hairpin sequences for oligo bindings
    Peaks(peaks::PeaksArgs),

    /// Fit beads to hairpins
    Fit(fit::FitArgs),

    /// Align beads onto a reference bead
    Align(align::AlignArgs),
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
    Tsv,
}

/// Where hairpin models come from
#[derive(Args, Debug, Clone)]
pub struct HairpinArgs {
    /// Hairpin sequences: a FASTA file (optionally gzipped) or an inline sequence
    #[arg(long, requires = "oligos", conflicts_with = "catalog")]
    pub sequences: Option<String>,

    /// Oligos, a delimited list of motifs (e.g. "ctgt,$")
    #[arg(long)]
    pub oligos: Option<String>,

    /// Catalog of hairpin models written by `peaks --catalog-out`
    #[arg(long)]
    pub catalog: Option<PathBuf>,
}

impl HairpinArgs {
    /// Build the catalog of hairpin models
    ///
    /// # Errors
    ///
    /// Returns an error if neither sequences nor a catalog is given, or if
    /// they cannot be read.
    pub fn load(&self) -> anyhow::Result<HairpinCatalog> {
        match (&self.sequences, &self.catalog) {
            (Some(sequences), _) => {
                let oligos = split(self.oligos.as_deref().unwrap_or_default())?;
                Ok(HairpinCatalog::load_sequences(sequences, &oligos)?)
            }
            (None, Some(path)) => HairpinCatalog::load_from_file(path)
                .with_context(|| format!("cannot load catalog {}", path.display())),
            (None, None) => anyhow::bail!("either --sequences with --oligos or --catalog is required"),
        }
    }
}

/// Read a JSON configuration file, or the defaults
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, or if it holds
/// unusable values (negative range sizes, for example).
pub fn read_config<T>(path: Option<&Path>) -> anyhow::Result<T>
where
    T: serde::de::DeserializeOwned + Default + Validate,
{
    match path {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("cannot read configuration {}", path.display()))?;
            let config: T = serde_json::from_str(&text)
                .with_context(|| format!("invalid configuration {}", path.display()))?;
            if let Some(reason) = config.invalid() {
                return Err(ParseError::InvalidFormat(reason))
                    .with_context(|| format!("invalid configuration {}", path.display()));
            }
            Ok(config)
        }
        None => Ok(T::default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matching::{ClassifierConfig, ReferenceConfig};
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_read_config_defaults_and_partial() {
        let config: ClassifierConfig = read_config(None).unwrap();
        assert_eq!(config, ClassifierConfig::default());

        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, r#"{{"identify_window": 5.0, "params": {{"window": 3.0}}}}"#).unwrap();
        let config: ClassifierConfig = read_config(Some(file.path())).unwrap();
        assert_eq!(config.identify_window, 5.0);
        assert_eq!(config.params.window, 3.0);
        assert_eq!(config.params.stretch, ClassifierConfig::default().params.stretch);
    }

    #[test]
    fn test_read_config_rejects_negative_ranges() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, r#"{{"params": {{"bias": {{"size": -0.1, "step": 0.05}}}}}}"#).unwrap();
        let err = read_config::<ClassifierConfig>(Some(file.path())).unwrap_err();
        assert!(format!("{err:#}").contains("bias size"));

        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, r#"{{"stretch": {{"center": 1.0, "size": 1.0, "step": 0.5}}}}"#).unwrap();
        let err = read_config::<ReferenceConfig>(Some(file.path())).unwrap_err();
        assert!(format!("{err:#}").contains("lower bound"));
    }

    #[test]
    fn test_hairpin_args_load() {
        let args = HairpinArgs {
            sequences: Some("atcgATATATgtcgCCCaaGGG".to_string()),
            oligos: Some("atat,ccc".to_string()),
            catalog: None,
        };
        let catalog = args.load().unwrap();
        assert_eq!(catalog.len(), 1);
        assert!(catalog.get("hairpin 1").is_some());

        let empty = HairpinArgs {
            sequences: None,
            oligos: None,
            catalog: None,
        };
        assert!(empty.load().is_err());
    }
}
