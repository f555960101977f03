// src/config/subsystems/logging.rs

use log::LevelFilter;
use serde::{Serialize, Deserialize};
use crate::error::{Error, Result};
use crate::config::FromIni;

const LEVELS: [&str; 6] = ["error", "warn", "info", "debug", "trace", "none"];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "warn".to_string() }
    }
}

impl LoggingConfig {
    pub fn get_log_level(&self) -> LevelFilter {
        match self.level.trim().to_lowercase().as_str() {
            "error" => LevelFilter::Error,
            "warn" => LevelFilter::Warn,
            "info" => LevelFilter::Info,
            "debug" => LevelFilter::Debug,
            "trace" => LevelFilter::Trace,
            "none" => LevelFilter::Off,
            _ => LevelFilter::Warn,
        }
    }

    pub fn validate(&self) -> Result<()> {
        let level = self.level.trim().to_lowercase();
        if !LEVELS.contains(&level.as_str()) {
            return Err(Error::Config(format!(
                "Invalid log level {:?}, expected one of {}", self.level, LEVELS.join(", ")
            )));
        }
        Ok(())
    }
}

impl FromIni for LoggingConfig {
    fn from_ini_section(&mut self, _section_name: &str, key: &str, value: &str) -> Option<Result<()>> {
        match key {
            "level" => {
                self.level = value.trim_matches('"').to_string();
                Some(self.validate())
            },
            _ => None,
        }
    }
}
