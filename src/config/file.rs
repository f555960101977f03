// src/config/file.rs

use serde::{Serialize, Deserialize};
use std::path::{Path, PathBuf};
use crate::error::{Error, Result};
use super::FromIni;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FileConfig {
    /// Where neighborhood caches live. `None` puts them next to the corpus.
    pub cache_dir: Option<PathBuf>,
    /// Append log records here instead of stderr.
    pub log_file: Option<PathBuf>,
}

impl FromIni for FileConfig {
    fn from_ini_section(&mut self, _section_name: &str, key: &str, value: &str) -> Option<Result<()>> {
        match key {
            "cache_dir" => {
                self.cache_dir = non_empty_path(value);
                Some(Ok(()))
            },
            "log_file" => {
                self.log_file = non_empty_path(value);
                Some(Ok(()))
            },
            _ => None,
        }
    }
}

fn non_empty_path(value: &str) -> Option<PathBuf> {
    let value = value.trim_matches('"');
    if value.is_empty() {
        None
    } else {
        Some(PathBuf::from(value))
    }
}

impl FileConfig {
    pub fn validate(&self) -> Result<()> {
        if let Some(dir) = &self.cache_dir {
            if dir.exists() && !dir.is_dir() {
                return Err(Error::Config(
                    format!("Cache directory is not a directory: {:?}", dir)
                ));
            }
        }
        Ok(())
    }

    /// Directory holding the cache for `corpus_path`, created on demand.
    pub fn resolve_cache_dir(&self, corpus_path: &Path) -> Result<PathBuf> {
        match &self.cache_dir {
            Some(dir) => {
                std::fs::create_dir_all(dir)?;
                Ok(dir.clone())
            },
            None => Ok(corpus_path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from("."))),
        }
    }
}
