//! FABRIC: FASTA and BED Reference Integrity Checker
//!
//! Usage: fabric <FASTA> [BEDS]... --output <REPORT.json>

use clap::Parser;
use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::process;
use thiserror::Error;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use fabric_genomics::bed;
use fabric_genomics::interval::ValidationMode;
use fabric_genomics::samtools::{IndexerError, SamtoolsRunner};
use fabric_genomics::validate::Validator;

#[derive(Parser)]
#[command(name = "fabric")]
#[command(version)]
#[command(
    about = "FABRIC: FASTA and BED Reference Integrity Checker - cross validates a reference FASTA against BED interval files",
    long_about = None
)]
struct Cli {
    /// Reference genome FASTA (plain or gzipped)
    fasta: PathBuf,

    /// BED files to validate against the FASTA
    beds: Vec<PathBuf>,

    /// Path for the JSON validation report
    #[arg(short, long)]
    output: PathBuf,

    /// Explicit path to a samtools executable
    #[arg(long)]
    samtools: Option<PathBuf>,

    /// Analyze the FASTA in process even when samtools is installed
    #[arg(long, conflicts_with = "samtools")]
    no_samtools: bool,

    /// Regenerate FASTA index files even when usable ones already exist
    #[arg(long)]
    force_reindex: bool,
}

#[derive(Error, Debug)]
enum CliError {
    #[error(transparent)]
    Io(#[from] io::Error),

    #[error(transparent)]
    Indexer(#[from] IndexerError),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    UnsafeOutput(String),
}

fn main() {
    let cli = Cli::parse();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Err(e) = run_validation(cli) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run_validation(cli: Cli) -> Result<(), CliError> {
    if cli.beds.is_empty() {
        tracing::warn!("No BED file paths provided");
    }
    check_output_path(&cli.output)?;

    let validator = if cli.no_samtools {
        Validator::without_indexer()
    } else if let Some(samtools) = &cli.samtools {
        Validator::with_indexer(Box::new(SamtoolsRunner::at_path(samtools)?))
    } else {
        Validator::new()
    };
    let validator = validator.force_reindex(cli.force_reindex);

    let report = validator.run(&cli.fasta, &cli.beds);

    fs::write(&cli.output, report.to_json()?)?;
    report.log_summary();
    println!("{}", report);
    Ok(())
}

const BED_ENDINGS: [&str; 5] = [".bed", ".bed3", ".bed4", ".bed6", ".bed12"];

/// Refuse output paths that look like BED files, so a forgotten output
/// argument cannot silently overwrite an input.
fn check_output_path(output: &Path) -> Result<(), CliError> {
    let lowered = output.to_string_lossy().to_lowercase();
    for ending in BED_ENDINGS {
        if lowered.ends_with(ending) {
            return Err(CliError::UnsafeOutput(format!(
                "Given output file path of {} appears to end with {} and looks like it wants to be a BED file. \
                 This is not permitted here to avoid unintentional overwriting of a BED file when the intended \
                 output path was forgotten. Is that what happened here?",
                output.display(),
                ending
            )));
        }
    }

    if output.is_file() && fs::metadata(output)?.len() != 0 {
        // An existing output that parses cleanly as BED is almost
        // certainly an input file in the wrong argument slot.
        if bed::read_bed_file(output, ValidationMode::Accumulate).is_ok() {
            return Err(CliError::UnsafeOutput(format!(
                "Given output file path of {} was able to be read as a BED file. \
                 This is not permitted here to avoid unintentional overwriting of a BED file when the intended \
                 output path was forgotten. Is that what happened here?",
                output.display()
            )));
        }
    }

    // Probe for writability without truncating whatever is there.
    if let Err(error) = OpenOptions::new().create(true).append(true).open(output) {
        return Err(CliError::UnsafeOutput(format!(
            "Unable to open output file for writing at {}. Check permissions? Error generated: {}",
            output.display(),
            error
        )));
    }
    Ok(())
}
