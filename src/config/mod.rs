pub mod file;
pub mod subsystems;

use serde::{Serialize, Deserialize};
use std::path::Path;
use std::fs;
use crate::error::{Error, Result};
use log::{warn, trace};

pub trait FromIni {
    fn from_ini_section(&mut self, section_name: &str, key: &str, value: &str) -> Option<Result<()>>;
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MdbscanConfig {
    // File paths
    pub files: file::FileConfig,

    // Subsystem configs
    pub index: subsystems::IndexConfig,
    pub cache: subsystems::CacheConfig,
    pub logging: subsystems::LoggingConfig,
}

impl MdbscanConfig {
    pub fn validate(&self) -> Result<()> {
        self.files.validate()?;
        self.index.validate()?;
        self.cache.validate()?;
        self.logging.validate()?;
        Ok(())
    }

    pub fn from_ini<P: AsRef<Path>>(path: P) -> Result<Self> {
        trace!("Loading configuration from: {:?}", path.as_ref());

        let content = fs::read_to_string(&path)
            .map_err(|e| Error::config(format!("Cannot read {:?}: {}", path.as_ref(), e)))?;
        let config = Self::from_ini_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Parses INI text on top of the defaults. Unknown keys are logged and
    /// skipped, malformed values are errors.
    pub fn from_ini_str(content: &str) -> Result<Self> {
        let mut config = Self::default();
        let mut current_section = String::new();

        for (line_num, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
                continue;
            }

            if line.starts_with('[') && line.ends_with(']') {
                current_section = line[1..line.len() - 1].trim().to_string();
                trace!("  Line {}: Found section: [{}]", line_num + 1, current_section);
                continue;
            }

            let Some((key, value)) = line.split_once('=') else {
                return Err(Error::config(format!(
                    "Line {}: expected `key = value`, got {:?}", line_num + 1, line
                )));
            };
            let key = key.trim();
            let value = value.trim();

            let handled = match current_section.as_str() {
                "file" => config.files.from_ini_section(&current_section, key, value),
                "index" => config.index.from_ini_section(&current_section, key, value),
                "cache" => config.cache.from_ini_section(&current_section, key, value),
                "logging" => config.logging.from_ini_section(&current_section, key, value),
                _ => None,
            };

            match handled {
                Some(result) => result.map_err(|e| Error::config(format!(
                    "Line {}: [{}] {}: {}", line_num + 1, current_section, key, e
                )))?,
                None => warn!("Unrecognized config key: {}={} in section [{}]", key, value, current_section),
            }
        }

        Ok(config)
    }
}

/// Parses a boolean the way INI files tend to spell them.
pub(crate) fn parse_bool(value: &str) -> Option<bool> {
    match value.trim_matches('"').to_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Some(true),
        "false" | "no" | "off" | "0" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use subsystems::{CacheFormat, CorruptCachePolicy};
    use log::LevelFilter;

    #[test]
    fn parses_all_sections() {
        let ini = r#"
# sample
[file]
cache_dir = "/tmp/mdbscan"

[index]
threads = 4
show_progress = yes

[cache]
enabled = true
format = json
on_corrupt = fail

[logging]
level = debug
"#;
        let config = MdbscanConfig::from_ini_str(ini).unwrap();
        assert_eq!(config.files.cache_dir.as_deref(), Some(Path::new("/tmp/mdbscan")));
        assert_eq!(config.index.threads, 4);
        assert!(config.index.show_progress);
        assert_eq!(config.cache.format, CacheFormat::Json);
        assert_eq!(config.cache.on_corrupt, CorruptCachePolicy::Fail);
        assert_eq!(config.logging.get_log_level(), LevelFilter::Debug);
    }

    #[test]
    fn unknown_keys_are_skipped() {
        let config = MdbscanConfig::from_ini_str("[index]\nwibble = 3\n[other]\nx = 1\n").unwrap();
        assert_eq!(config.index.threads, 0);
    }

    #[test]
    fn malformed_values_are_errors() {
        assert!(MdbscanConfig::from_ini_str("[index]\nthreads = many\n").is_err());
        assert!(MdbscanConfig::from_ini_str("[cache]\nformat = xml\n").is_err());
        assert!(MdbscanConfig::from_ini_str("[index]\njust a line\n").is_err());
    }

    #[test]
    fn shipped_default_ini_matches_defaults() {
        let config = MdbscanConfig::from_ini(concat!(env!("CARGO_MANIFEST_DIR"), "/default.ini")).unwrap();
        let defaults = MdbscanConfig::default();
        assert_eq!(config.files.cache_dir, defaults.files.cache_dir);
        assert_eq!(config.index.threads, defaults.index.threads);
        assert_eq!(config.cache.enabled, defaults.cache.enabled);
        assert_eq!(config.cache.format, defaults.cache.format);
        assert_eq!(config.logging.level, defaults.logging.level);
    }
}
