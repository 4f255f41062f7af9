use anyhow::{Context, Result};
use clap::Parser;
use morphos::{cli::Cli, Converter};
use tracing::info;

/// Set up logging and tracing
fn setup_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_level(true)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    info!("Starting morphos v{}", morphos::VERSION);

    let config = cli.to_config().context("Invalid configuration")?;
    let mut converter = Converter::from_config(&config)?;

    let source = converter.source_path().to_path_buf();

    let report = converter
        .convert_to_pdf()
        .with_context(|| format!("Failed to convert {}", source.display()))?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("✅ Success: {} → {}", report.source.display(), report.output.display());
        println!("📊 {} rows, {} bytes", report.rows, report.bytes);
    }

    Ok(())
}
