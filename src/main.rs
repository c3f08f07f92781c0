use clap::Parser;
use tracing_subscriber::EnvFilter;

use hairpin_solver::cli;

fn main() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();

    // Initialize logging based on verbosity flag
    let filter = if cli.verbose {
        EnvFilter::new("hairpin_solver=debug,info")
    } else {
        EnvFilter::new("hairpin_solver=warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();

    match cli.command {
        cli::Commands::Peaks(args) => {
            cli::peaks::run(args, cli.format, cli.verbose)?;
        }
        cli::Commands::Fit(args) => {
            cli::fit::run(args, cli.format, cli.verbose)?;
        }
        cli::Commands::Align(args) => {
            cli::align::run(args, cli.format, cli.verbose)?;
        }
    }

    Ok(())
}
