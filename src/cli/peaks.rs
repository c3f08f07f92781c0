use std::path::PathBuf;

use clap::Args;
use tracing::info;

use crate::catalog::store::HairpinCatalog;
use crate::cli::OutputFormat;
use crate::parsing::fasta::read_sequences;
use crate::sequences::{split, Scanner, SequencePeakSet};

#[derive(Args)]
pub struct PeaksArgs {
    /// Hairpin sequences: a FASTA file (optionally gzipped) or an inline sequence
    #[arg(required = true)]
    pub sequences: String,

    /// Oligos, a delimited list of motifs (e.g. "ctgt,$")
    #[arg(long, required = true)]
    pub oligos: String,

    /// Also print each sequence with the oligo bindings upper-cased
    #[arg(long)]
    pub mark: bool,

    /// Write the hairpin models to a catalog file
    #[arg(long)]
    pub catalog_out: Option<PathBuf>,
}

struct Scanned {
    name: String,
    size: usize,
    peaks: SequencePeakSet,
    marked: Option<String>,
}

/// Execute peaks subcommand
///
/// # Errors
///
/// Returns an error if the oligos are invalid or the sequences cannot be read.
#[allow(clippy::needless_pass_by_value)] // CLI entry point, values from clap
pub fn run(args: PeaksArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    let oligos = split(&args.oligos)?;
    let sequences = read_sequences(&args.sequences)?;
    if verbose {
        eprintln!("Scanning {} sequences for {oligos}", sequences.len());
    }

    let scanner = Scanner::new(&oligos);
    let scanned: Vec<Scanned> = sequences
        .iter()
        .map(|(name, sequence)| Scanned {
            name: name.clone(),
            size: sequence.len(),
            peaks: scanner.scan(sequence),
            marked: args.mark.then(|| scanner.mark(sequence)),
        })
        .collect();

    if let Some(path) = &args.catalog_out {
        let catalog = HairpinCatalog::from_sequences(&sequences, &oligos);
        std::fs::write(path, catalog.to_json()?)?;
        info!("Wrote {} hairpins to {}", catalog.len(), path.display());
    }

    match format {
        OutputFormat::Text => print_text_results(&scanned),
        OutputFormat::Json => print_json_results(&scanned)?,
        OutputFormat::Tsv => print_tsv_results(&scanned),
    }
    Ok(())
}

fn print_text_results(scanned: &[Scanned]) {
    for item in scanned {
        println!("{} ({} bp, {} peaks)", item.name, item.size, item.peaks.len());
        let positions: Vec<String> = item
            .peaks
            .iter()
            .map(|p| format!("{}{}", p.position, if p.orientation { "" } else { "-" }))
            .collect();
        println!("   {}", positions.join(" "));
        if let Some(marked) = &item.marked {
            println!("   {marked}");
        }
    }
}

fn print_json_results(scanned: &[Scanned]) -> anyhow::Result<()> {
    let output: Vec<serde_json::Value> = scanned
        .iter()
        .map(|item| {
            let mut value = serde_json::json!({
                "name": item.name,
                "size": item.size,
                "peaks": item.peaks,
            });
            if let Some(marked) = &item.marked {
                value["marked"] = serde_json::json!(marked);
            }
            value
        })
        .collect();
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn print_tsv_results(scanned: &[Scanned]) {
    println!("hairpin\tposition\torientation");
    for item in scanned {
        for peak in &item.peaks {
            println!("{}\t{}\t{}", item.name, peak.position, peak.orientation);
        }
    }
}
