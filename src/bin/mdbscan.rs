use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use log::{error, info};

use mdbscan::config::subsystems::{CacheFormat, CorruptCachePolicy};
use mdbscan::utils::init_logging;
use mdbscan::{ClusterParams, ClusteringPipeline, MdbscanConfig, Result};

/// Cluster a newline-delimited corpus with DBSCAN or MDBSCAN.
///
/// Positional parameters are `eps1 [eps2] min_count corpus`. Giving eps2
/// selects MDBSCAN, which also requires members to be within eps2
/// Jaro-Winkler distance of their cluster's seed. The clusters are printed
/// to stdout as a JSON object keyed by cluster id, with "-1" for noise.
#[derive(Parser, Debug)]
#[command(name = "mdbscan", version, about, allow_negative_numbers = true)]
struct Cli {
    /// eps1 [eps2] min_count corpus
    #[arg(required = true, value_name = "PARAMS")]
    params: Vec<String>,

    /// INI configuration file
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Directory for neighborhood caches (default: next to the corpus)
    #[arg(long, value_name = "DIR")]
    cache_dir: Option<PathBuf>,

    /// Neither read nor write the neighborhood cache
    #[arg(long)]
    no_cache: bool,

    /// Cache file format: bincode or json
    #[arg(long, value_parser = parse_cache_format)]
    cache_format: Option<CacheFormat>,

    /// What to do with an unusable cache: rebuild or fail
    #[arg(long, value_parser = parse_corrupt_policy)]
    on_corrupt: Option<CorruptCachePolicy>,

    /// Worker threads for neighborhood construction (0 = all CPUs)
    #[arg(long)]
    threads: Option<usize>,

    /// Show progress bars on stderr
    #[arg(long)]
    progress: bool,

    /// error, warn, info, debug, trace or none
    #[arg(long)]
    log_level: Option<String>,

    /// Append log records to this file instead of stderr
    #[arg(long, value_name = "FILE")]
    log_file: Option<PathBuf>,

    /// Read neighborhoods from a .npy distance matrix instead of the index
    #[arg(long, value_name = "FILE")]
    matrix: Option<PathBuf>,
}

impl Cli {
    /// File configuration (or defaults) with command-line overrides applied.
    fn load_config(&self) -> Result<MdbscanConfig> {
        let mut config = match &self.config {
            Some(path) => MdbscanConfig::from_ini(path)?,
            None => MdbscanConfig::default(),
        };

        if let Some(dir) = &self.cache_dir {
            config.files.cache_dir = Some(dir.clone());
        }
        if let Some(path) = &self.log_file {
            config.files.log_file = Some(path.clone());
        }
        if self.no_cache {
            config.cache.enabled = false;
        }
        if let Some(format) = self.cache_format {
            config.cache.format = format;
        }
        if let Some(policy) = self.on_corrupt {
            config.cache.on_corrupt = policy;
        }
        if let Some(threads) = self.threads {
            config.index.threads = threads;
        }
        if self.progress {
            config.index.show_progress = true;
        }
        if let Some(level) = &self.log_level {
            config.logging.level = level.clone();
        }

        config.validate()?;
        Ok(config)
    }
}

fn parse_cache_format(value: &str) -> std::result::Result<CacheFormat, String> {
    CacheFormat::from_str(value).ok_or_else(|| format!("unknown cache format {:?}", value))
}

fn parse_corrupt_policy(value: &str) -> std::result::Result<CorruptCachePolicy, String> {
    CorruptCachePolicy::from_str(value).ok_or_else(|| format!("unknown policy {:?}", value))
}

fn run(cli: Cli) -> Result<()> {
    let (params, corpus_path) = ClusterParams::from_positional(&cli.params)?;
    let config = cli.load_config()?;
    init_logging(&config.logging, config.files.log_file.as_deref())?;
    info!("Starting mdbscan with log level: {:?}", config.logging.get_log_level());

    let mut pipeline = ClusteringPipeline::new(config, params);
    if let Some(matrix) = cli.matrix {
        pipeline = pipeline.with_matrix(matrix);
    }
    let output = pipeline.run(&corpus_path)?;

    let mut stdout = BufWriter::new(io::stdout().lock());
    output.write_json(&mut stdout)?;
    writeln!(stdout)?;
    stdout.flush()?;
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            eprintln!("mdbscan: {}", e);
            ExitCode::from(e.exit_code())
        }
    }
}
