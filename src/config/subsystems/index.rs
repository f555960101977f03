// src/config/subsystems/index.rs

use serde::{Serialize, Deserialize};
use crate::error::{Error, Result};
use crate::config::{FromIni, parse_bool};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IndexConfig {
    /// Worker threads for neighborhood construction; 0 means one per logical CPU.
    pub threads: usize,
    /// Draw progress bars on stderr while building.
    pub show_progress: bool,
}

impl IndexConfig {
    pub fn validate(&self) -> Result<()> {
        Ok(())
    }

    pub fn effective_threads(&self) -> usize {
        if self.threads == 0 {
            num_cpus::get()
        } else {
            self.threads
        }
    }

    /// Dedicated pool for the parallel phases, sized from `threads`.
    pub fn build_thread_pool(&self) -> Result<rayon::ThreadPool> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.effective_threads())
            .thread_name(|i| format!("mdbscan-worker-{}", i))
            .build()?;
        Ok(pool)
    }
}

impl FromIni for IndexConfig {
    fn from_ini_section(&mut self, _section_name: &str, key: &str, value: &str) -> Option<Result<()>> {
        match key {
            "threads" => match value.trim_matches('"').parse() {
                Ok(threads) => {
                    self.threads = threads;
                    Some(Ok(()))
                },
                Err(_) => Some(Err(Error::Config(
                    format!("Invalid threads: {}", value)
                ))),
            },
            "show_progress" => match parse_bool(value) {
                Some(flag) => {
                    self.show_progress = flag;
                    Some(Ok(()))
                },
                None => Some(Err(Error::Config(
                    format!("Invalid show_progress: {}", value)
                ))),
            },
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_threads_means_all_cpus() {
        let config = IndexConfig::default();
        assert_eq!(config.effective_threads(), num_cpus::get());
        let config = IndexConfig { threads: 3, show_progress: false };
        assert_eq!(config.build_thread_pool().unwrap().current_num_threads(), 3);
    }
}
