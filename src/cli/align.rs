use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use rayon::prelude::*;
use tracing::info;

use crate::cli::{read_config, OutputFormat};
use crate::core::types::Distance;
use crate::matching::reference::{with_transform, ReferenceAligner, ReferenceConfig, ReferenceKind};
use crate::parsing::beads::read_beads;

#[derive(Args)]
pub struct AlignArgs {
    /// Bead batch (JSON), use '-' for stdin
    #[arg(required = true)]
    pub beads: PathBuf,

    /// Key of the reference bead
    #[arg(long, required = true)]
    pub reference: String,

    /// Batch holding the reference bead, if not the aligned batch
    #[arg(long)]
    pub reference_beads: Option<PathBuf>,

    /// Aligner configuration (JSON), missing fields take default values
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Refine the density fit with the chi-square refiner
    #[arg(long)]
    pub chi_square: bool,

    /// Stretch of the reference bead onto its hairpin, in bp/µm
    #[arg(long, requires = "reference_bias")]
    pub reference_stretch: Option<f64>,

    /// Bias of the reference bead onto its hairpin, in µm
    #[arg(long, requires = "reference_stretch")]
    pub reference_bias: Option<f64>,
}

/// Execute align subcommand
///
/// # Errors
///
/// Returns an error if the inputs cannot be read or the reference bead is missing.
#[allow(clippy::needless_pass_by_value)] // CLI entry point, values from clap
pub fn run(args: AlignArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    let batch = read_beads(&args.beads)?;
    let reference_batch = match &args.reference_beads {
        Some(path) => read_beads(path)?,
        None => batch.clone(),
    };
    let reference = reference_batch
        .find(&args.reference)
        .with_context(|| format!("reference bead {} not found", args.reference))?;

    let mut config: ReferenceConfig = read_config(args.config.as_deref())?;
    if args.chi_square {
        config.kind = ReferenceKind::ChiSquare;
    }
    let transform = match (args.reference_stretch, args.reference_bias) {
        (Some(stretch), Some(bias)) => Some(Distance::new(0.0, stretch, bias)),
        _ => None,
    };

    if verbose {
        eprintln!(
            "Aligning {} beads onto bead {} ({} peaks)",
            batch.beads.len(),
            args.reference,
            reference.peaks.len()
        );
    }

    let aligner = ReferenceAligner::new(&reference.positions(), config);
    let results: Vec<(String, Distance)> = batch
        .beads
        .par_iter()
        .map(|bead| {
            let found = aligner.optimize(&bead.positions());
            let found = match &transform {
                Some(transform) if found.is_fitted() => with_transform(&found, transform),
                _ => found,
            };
            (bead.key_string(), found)
        })
        .collect();
    info!("Aligned {} beads onto bead {}", results.len(), args.reference);

    match format {
        OutputFormat::Text => {
            for (key, found) in &results {
                if found.is_fitted() {
                    println!(
                        "Bead {key}: stretch {:.4}  bias {:.5}  cost {:.4}",
                        found.stretch, found.bias, found.value
                    );
                } else {
                    println!("Bead {key}: not enough peaks");
                }
            }
        }
        OutputFormat::Json => {
            let output = serde_json::json!({
                "generated_at": chrono::Utc::now().to_rfc3339(),
                "reference": args.reference,
                "config": aligner.config(),
                "results": results
                    .iter()
                    .map(|(key, found)| serde_json::json!({"key": key, "distance": found}))
                    .collect::<Vec<_>>(),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Tsv => {
            println!("bead\tcost\tstretch\tbias");
            for (key, found) in &results {
                println!(
                    "{key}\t{:.6}\t{:.6}\t{:.6}",
                    found.value, found.stretch, found.bias
                );
            }
        }
    }
    Ok(())
}
