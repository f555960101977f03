// src/config/subsystems/cache.rs

use serde::{Serialize, Deserialize};
use crate::error::{Error, Result};
use crate::config::{FromIni, parse_bool};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CacheFormat {
    /// Compact binary snapshot: term table plus neighbor id lists.
    Bincode,
    /// Plain `term -> [neighbor terms]` object.
    Json,
}

impl CacheFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheFormat::Bincode => "bincode",
            CacheFormat::Json => "json",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            CacheFormat::Bincode => "bin",
            CacheFormat::Json => "json",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim_matches('"').to_lowercase().as_str() {
            "bincode" | "bin" | "binary" => Some(Self::Bincode),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

impl Default for CacheFormat {
    fn default() -> Self {
        Self::Bincode
    }
}

/// What to do with a cache file that fails validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CorruptCachePolicy {
    Rebuild,
    Fail,
}

impl CorruptCachePolicy {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim_matches('"').to_lowercase().as_str() {
            "rebuild" => Some(Self::Rebuild),
            "fail" | "abort" => Some(Self::Fail),
            _ => None,
        }
    }
}

impl Default for CorruptCachePolicy {
    fn default() -> Self {
        Self::Rebuild
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    pub enabled: bool,
    pub format: CacheFormat,
    pub on_corrupt: CorruptCachePolicy,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            format: CacheFormat::default(),
            on_corrupt: CorruptCachePolicy::default(),
        }
    }
}

impl CacheConfig {
    pub fn validate(&self) -> Result<()> {
        Ok(())
    }
}

impl FromIni for CacheConfig {
    fn from_ini_section(&mut self, _section_name: &str, key: &str, value: &str) -> Option<Result<()>> {
        match key {
            "enabled" => match parse_bool(value) {
                Some(flag) => {
                    self.enabled = flag;
                    Some(Ok(()))
                },
                None => Some(Err(Error::Config(
                    format!("Invalid enabled flag: {}", value)
                ))),
            },
            "format" => match CacheFormat::from_str(value) {
                Some(format) => {
                    self.format = format;
                    Some(Ok(()))
                },
                None => Some(Err(Error::Config(
                    format!("Invalid cache format (bincode or json): {}", value)
                ))),
            },
            "on_corrupt" => match CorruptCachePolicy::from_str(value) {
                Some(policy) => {
                    self.on_corrupt = policy;
                    Some(Ok(()))
                },
                None => Some(Err(Error::Config(
                    format!("Invalid on_corrupt policy (rebuild or fail): {}", value)
                ))),
            },
            _ => None,
        }
    }
}
