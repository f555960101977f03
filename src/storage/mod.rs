// storage/mod.rs

pub mod file;

use std::path::{Path, PathBuf};

use crate::config::subsystems::CacheFormat;
use crate::corpus::Corpus;
use crate::error::{Error, Result};
use crate::matcher::neighborhoods::Neighborhoods;

pub use self::file::FileCache;

/// Identity of a neighborhood snapshot: which corpus file, at which eps1.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    dir: PathBuf,
    corpus_name: String,
    eps1: usize,
}

impl CacheKey {
    pub fn new<P: AsRef<Path>>(dir: P, corpus_path: &Path, eps1: usize) -> Result<Self> {
        let corpus_name = corpus_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .ok_or_else(|| Error::input(format!("Corpus path has no file name: {:?}", corpus_path)))?;
        Ok(Self {
            dir: dir.as_ref().to_path_buf(),
            corpus_name,
            eps1,
        })
    }

    pub fn eps1(&self) -> usize {
        self.eps1
    }

    pub fn corpus_name(&self) -> &str {
        &self.corpus_name
    }

    pub fn file_name(&self, format: CacheFormat) -> String {
        format!(".mdbscan-cache.{}.{}.{}", self.eps1, self.corpus_name, format.extension())
    }

    pub fn path(&self, format: CacheFormat) -> PathBuf {
        self.dir.join(self.file_name(format))
    }
}

/// Persistence for neighborhoods keyed by [`CacheKey`].
///
/// Implementations resolve stored terms against the live corpus, so a
/// snapshot that does not describe exactly this corpus is reported as a
/// cache integrity error rather than returned partially.
pub trait NeighborhoodStore {
    /// `Ok(None)` when nothing is stored under `key`.
    fn load(&self, key: &CacheKey, corpus: &Corpus) -> Result<Option<Neighborhoods>>;

    fn store(&self, key: &CacheKey, corpus: &Corpus, neighborhoods: &Neighborhoods) -> Result<()>;

    /// Drops whatever is stored under `key`.
    fn invalidate(&self, key: &CacheKey) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_names_include_eps1_and_corpus() {
        let key = CacheKey::new("/cache", Path::new("/data/rockyou.txt"), 2).unwrap();
        assert_eq!(key.file_name(CacheFormat::Bincode), ".mdbscan-cache.2.rockyou.txt.bin");
        assert_eq!(key.path(CacheFormat::Json), PathBuf::from("/cache/.mdbscan-cache.2.rockyou.txt.json"));
        assert_ne!(key, CacheKey::new("/cache", Path::new("/data/rockyou.txt"), 1).unwrap());
    }

    #[test]
    fn key_needs_a_file_name() {
        assert!(CacheKey::new("/cache", Path::new("/"), 1).is_err());
    }
}
