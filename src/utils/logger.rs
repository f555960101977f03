// src/utils/logger.rs

use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

use chrono::Local;
use env_logger::{Builder, Target};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

use crate::config::subsystems::LoggingConfig;
use crate::error::Result;

/// Installs the global logger.
///
/// Records go to stderr unless `log_file` is set, in which case they are
/// appended to that file. Stdout is never written, it carries the result.
/// Calling this twice is harmless; the second call keeps the first logger.
pub fn init_logging(config: &LoggingConfig, log_file: Option<&Path>) -> Result<()> {
    let mut builder = Builder::new();
    builder
        .format(|buf, record| {
            writeln!(buf,
                "{} [{}] {} - {}",
                Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.level(),
                record.target(),
                record.args()
            )
        })
        .filter(None, config.get_log_level());

    match log_file {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            builder.target(Target::Pipe(Box::new(file)));
        }
        None => {
            builder.target(Target::Stderr);
        }
    }

    let _ = builder.try_init();
    Ok(())
}

/// Progress bar for a phase of `len` steps, drawn on stderr when `visible`.
pub fn phase_progress(len: u64, label: &str, visible: bool) -> ProgressBar {
    if !visible {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::with_draw_target(Some(len), ProgressDrawTarget::stderr());
    if let Ok(style) = ProgressStyle::default_bar()
        .template("{spinner:.green} {prefix}: [{wide_bar:.cyan/blue}] {pos}/{len} ({percent}%) | ETA: {eta_precise} | Elapsed: {elapsed_precise}")
    {
        pb.set_style(style.progress_chars("=>-"));
    }
    pb.set_prefix(label.to_string());
    pb
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hidden_bar_when_not_visible() {
        let pb = phase_progress(10, "terms", false);
        assert!(pb.is_hidden());
        pb.inc(3);
        assert_eq!(pb.position(), 3);
    }

    #[test]
    fn log_file_parent_is_created() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs").join("run.log");
        init_logging(&LoggingConfig::default(), Some(&path)).unwrap();
        assert!(path.exists());
    }
}
