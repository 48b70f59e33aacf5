use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::fmt;

#[derive(Parser)]
#[command(name = "metabridge", version, about = "MetaBridge EXIF Metadata Processor for Facebook data exports")]
struct Cli {
    /// Export root containing the `your_facebook_activity` directory
    path: PathBuf,

    /// Directory to save processed files
    #[arg(short = 'd', long, default_value = "./processed/")]
    save_path: PathBuf,

    /// Run without making changes
    #[arg(long)]
    dry_run: bool,

    /// Enable verbose output
    #[arg(long)]
    verbose: bool,

    /// Run log, truncated on every run, capturing all levels
    #[arg(long, default_value = "results.log")]
    log_file: PathBuf,
}

fn init_logging(log_file: &Path, verbose: bool) -> anyhow::Result<()> {
    let file = File::create(log_file)
        .with_context(|| format!("unable to create log file {}", log_file.display()))?;

    let console_level = if verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_filter(console_level),
        )
        .with(
            fmt::layer()
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .with_filter(LevelFilter::DEBUG),
        )
        .init();
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_file, cli.verbose)?;
    let t_total = std::time::Instant::now();

    let options = metabridge_core::ProcessOptions {
        export_root: cli.path,
        save_path: cli.save_path,
        dry_run: cli.dry_run,
    };

    let result = metabridge_core::process(&options)?;

    info!(
        "{} files placed across {} categories ({:.2}s)",
        result.total_processed,
        result.categories.iter().filter(|c| c.processed > 0).count(),
        t_total.elapsed().as_secs_f64()
    );
    Ok(())
}
