use std::path::PathBuf;

use clap::Args;
use rayon::prelude::*;
use tracing::info;

use crate::cli::{read_config, HairpinArgs, OutputFormat};
use crate::core::bead::{BeadConstraint, FitResult};
use crate::matching::engine::{BeadClassifier, ClassifierConfig};
use crate::matching::fitter::FitterKind;
use crate::parsing::beads::read_beads;

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum FitterChoice {
    Gaussian,
    ChiSquare,
    PeakGrid,
}

impl From<FitterChoice> for FitterKind {
    fn from(choice: FitterChoice) -> Self {
        match choice {
            FitterChoice::Gaussian => Self::Gaussian,
            FitterChoice::ChiSquare => Self::ChiSquare,
            FitterChoice::PeakGrid => Self::PeakGrid,
        }
    }
}

#[derive(Args)]
pub struct FitArgs {
    /// Bead batch (JSON), use '-' for stdin
    #[arg(required = true)]
    pub beads: PathBuf,

    #[command(flatten)]
    pub hairpins: HairpinArgs,

    /// Classifier configuration (JSON), missing fields take default values
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Fitter flavor, overrides the configuration
    #[arg(long, value_enum)]
    pub fitter: Option<FitterChoice>,

    /// Fit every bead to this hairpin only, unless its constraint names another
    #[arg(long)]
    pub hairpin: Option<String>,

    /// Skip hairpins whose size does not match the bead extension
    #[arg(long)]
    pub pull_phase_ratio: Option<f64>,
}

/// Execute fit subcommand
///
/// # Errors
///
/// Returns an error if the inputs or the configuration cannot be read.
#[allow(clippy::needless_pass_by_value)] // CLI entry point, values from clap
pub fn run(args: FitArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    let catalog = args.hairpins.load()?;
    let batch = read_beads(&args.beads)?;

    let mut config: ClassifierConfig = read_config(args.config.as_deref())?;
    if let Some(fitter) = args.fitter {
        config.fitter = fitter.into();
    }
    if args.pull_phase_ratio.is_some() {
        config.pull_phase_ratio = args.pull_phase_ratio;
    }

    if verbose {
        eprintln!(
            "Loaded {} hairpins and {} beads, fitter {:?}",
            catalog.len(),
            batch.beads.len(),
            config.fitter
        );
    }
    if catalog.is_empty() {
        eprintln!("Warning: No hairpin to fit against.");
    }

    let constraints: Vec<Option<BeadConstraint>> = batch
        .beads
        .iter()
        .map(|bead| {
            let own = batch.constraint(bead).cloned();
            match &args.hairpin {
                Some(name) => {
                    let mut constraint = own.unwrap_or_default();
                    constraint.hairpin.get_or_insert_with(|| name.clone());
                    Some(constraint)
                }
                None => own,
            }
        })
        .collect();

    let classifier = BeadClassifier::with_config(&catalog, config);
    let results: Vec<FitResult> = batch
        .beads
        .par_iter()
        .zip(constraints.par_iter())
        .map(|(bead, constraint)| classifier.classify(bead, constraint.as_ref()))
        .collect();
    info!(
        "Classified {} beads against {} hairpins",
        results.len(),
        catalog.len()
    );

    match format {
        OutputFormat::Text => print_text_results(&results),
        OutputFormat::Json => print_json_results(&results, classifier.config())?,
        OutputFormat::Tsv => print_tsv_results(&results),
    }
    Ok(())
}

fn print_text_results(results: &[FitResult]) {
    for result in results {
        let key = result.key_string();
        match (&result.hairpin, result.best()) {
            (Some(hairpin), Some(best)) => {
                println!("Bead {key}: {hairpin}");
                println!(
                    "   Cost: {:.4}   Silhouette: {:.3}",
                    best.value, result.silhouette
                );
                println!(
                    "   Stretch: {:.2} bp/µm   Bias: {:.5} µm",
                    best.stretch, best.bias
                );
                println!(
                    "   Peaks: {}/{} assigned",
                    result.assigned(),
                    result.peaks.len()
                );
            }
            _ => println!("Bead {key}: no hairpin fitted"),
        }
    }
}

fn print_json_results(results: &[FitResult], config: &ClassifierConfig) -> anyhow::Result<()> {
    let output = serde_json::json!({
        "generated_at": chrono::Utc::now().to_rfc3339(),
        "config": config,
        "results": results,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn print_tsv_results(results: &[FitResult]) {
    println!("bead\thairpin\tcost\tstretch\tbias\tsilhouette\tassigned\tpeaks");
    for result in results {
        let key = result.key_string();
        match (&result.hairpin, result.best()) {
            (Some(hairpin), Some(best)) => println!(
                "{key}\t{hairpin}\t{:.6}\t{:.4}\t{:.6}\t{:.4}\t{}\t{}",
                best.value,
                best.stretch,
                best.bias,
                result.silhouette,
                result.assigned(),
                result.peaks.len()
            ),
            _ => println!(
                "{key}\t\t\t\t\t{:.4}\t0\t{}",
                result.silhouette,
                result.peaks.len()
            ),
        }
    }
}
