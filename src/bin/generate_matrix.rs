use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;

use clap::Parser;
use log::{error, info, warn};

use mdbscan::config::subsystems::{IndexConfig, LoggingConfig};
use mdbscan::matrix::{matrix_path_for, DistanceMatrix};
use mdbscan::utils::{init_logging, phase_progress};
use mdbscan::{Corpus, Error, Result};

/// Write a brute-force Levenshtein distance matrix for every `.txt`
/// wordlist in a directory, as `<stem>_distance_matrix.npy` beside it.
#[derive(Parser, Debug)]
#[command(name = "generate_matrix", version, about)]
struct Cli {
    /// Directory containing wordlist files
    #[arg(long, alias = "generate_from", value_name = "DIR")]
    generate_from: PathBuf,

    /// Worker threads (0 = all CPUs)
    #[arg(long, default_value = "0")]
    threads: usize,

    /// Hide the per-file progress bar
    #[arg(long)]
    quiet: bool,

    /// error, warn, info, debug, trace or none
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn wordlists(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(Error::MissingInput(dir.to_path_buf()));
    }
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && path.extension().map_or(false, |ext| ext == "txt") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn process(path: &Path, show_progress: bool) -> Result<PathBuf> {
    let start = Instant::now();
    let corpus = Corpus::from_path(path)?;
    let progress = phase_progress(corpus.len() as u64, "Rows", show_progress);
    let matrix = DistanceMatrix::compute(&corpus, &progress)?;

    let output = matrix_path_for(path);
    matrix.save(&output)?;
    info!("Wrote {:?} ({} terms) in {:.2?}", output, corpus.len(), start.elapsed());
    Ok(output)
}

fn run(cli: Cli) -> Result<()> {
    let logging = LoggingConfig { level: cli.log_level.clone() };
    logging.validate()?;
    init_logging(&logging, None)?;

    let pool = IndexConfig { threads: cli.threads, show_progress: !cli.quiet }.build_thread_pool()?;
    let files = wordlists(&cli.generate_from)?;
    if files.is_empty() {
        warn!("No .txt wordlists found in {:?}", cli.generate_from);
    }

    for path in files {
        info!("Processing {:?}", path);
        pool.install(|| process(&path, !cli.quiet))?;
    }
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            eprintln!("generate_matrix: {}", e);
            ExitCode::from(e.exit_code())
        }
    }
}
