// src/matcher/pipeline.rs

use std::path::{Path, PathBuf};
use std::time::Instant;

use log::{debug, info, warn};

use crate::config::MdbscanConfig;
use crate::config::subsystems::CorruptCachePolicy;
use crate::corpus::Corpus;
use crate::error::{Error, Result};
use crate::matrix::DistanceMatrix;
use crate::storage::{CacheKey, FileCache, NeighborhoodStore};
use crate::types::ClusterParams;
use crate::utils::phase_progress;
use super::cluster::{ClusterEngine, ClusterOutput};
use super::index::FuzzyIndex;
use super::neighborhoods::Neighborhoods;

/// Where a run's neighborhoods came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NeighborhoodSource {
    Cache,
    Index,
    Matrix,
}

/// Loads a corpus, obtains its eps1 neighborhoods and clusters it.
///
/// Neighborhoods come from a distance matrix when one is given, otherwise
/// from the on-disk cache, otherwise from a freshly built fuzzy index whose
/// result is then cached.
pub struct ClusteringPipeline {
    config: MdbscanConfig,
    params: ClusterParams,
    matrix: Option<PathBuf>,
}

impl ClusteringPipeline {
    pub fn new(config: MdbscanConfig, params: ClusterParams) -> Self {
        Self { config, params, matrix: None }
    }

    pub fn with_matrix<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.matrix = Some(path.into());
        self
    }

    pub fn config(&self) -> &MdbscanConfig {
        &self.config
    }

    pub fn params(&self) -> &ClusterParams {
        &self.params
    }

    pub fn run<P: AsRef<Path>>(&self, corpus_path: P) -> Result<ClusterOutput> {
        let corpus_path = corpus_path.as_ref();
        self.config.validate()?;
        self.params.validate()?;
        info!("Clustering {:?} with {} (eps1={}, min_count={})",
              corpus_path, self.params.mode(), self.params.eps1, self.params.min_count);

        let start = Instant::now();
        let corpus = Corpus::from_path(corpus_path)?;
        info!("Corpus phase: {} terms in {:.2?}", corpus.len(), start.elapsed());

        let start = Instant::now();
        let (neighborhoods, source) = self.neighborhoods(&corpus, corpus_path)?;
        info!("Neighborhood phase ({:?}): {:.2?}, {} core terms",
              source, start.elapsed(), neighborhoods.core_count(self.params.min_count));

        self.cluster(&corpus, &neighborhoods)
    }

    /// Clusters `corpus` given its precomputed neighborhoods.
    pub fn cluster(&self, corpus: &Corpus, neighborhoods: &Neighborhoods) -> Result<ClusterOutput> {
        let start = Instant::now();
        let clustering = ClusterEngine::new(self.params.min_count, self.params.mode())
            .run(corpus, neighborhoods)?;
        info!("Clustering phase: {} clusters, {} noise terms in {:.2?}",
              clustering.cluster_count(), clustering.noise_count(), start.elapsed());

        Ok(ClusterOutput::from_clustering(corpus, &clustering))
    }

    pub fn neighborhoods(&self, corpus: &Corpus, corpus_path: &Path) -> Result<(Neighborhoods, NeighborhoodSource)> {
        let pool = self.config.index.build_thread_pool()?;
        debug!("Using {} worker threads", pool.current_num_threads());

        if let Some(matrix_path) = &self.matrix {
            let matrix = DistanceMatrix::load(matrix_path)?;
            let neighborhoods = pool.install(|| matrix.neighborhoods(corpus, self.params.eps1))?;
            return Ok((neighborhoods, NeighborhoodSource::Matrix));
        }

        if !self.config.cache.enabled {
            let neighborhoods = pool.install(|| self.build(corpus))?;
            return Ok((neighborhoods, NeighborhoodSource::Index));
        }

        let key = CacheKey::new(self.config.files.resolve_cache_dir(corpus_path)?, corpus_path, self.params.eps1)?;
        let store = FileCache::new(self.config.cache.format);
        debug!("Neighborhood cache slot for {:?} at eps1={}: {:?}", key.corpus_name(), key.eps1(), key.path(store.format()));

        match store.load(&key, corpus) {
            Ok(Some(neighborhoods)) => return Ok((neighborhoods, NeighborhoodSource::Cache)),
            Ok(None) => {}
            Err(e @ Error::CacheIntegrity(_)) => match self.config.cache.on_corrupt {
                CorruptCachePolicy::Fail => return Err(e),
                CorruptCachePolicy::Rebuild => {
                    warn!("Discarding unusable cache {:?}: {}", key.path(store.format()), e);
                    store.invalidate(&key)?;
                }
            },
            Err(e) => return Err(e),
        }

        let neighborhoods = pool.install(|| self.build(corpus))?;
        if let Err(e) = store.store(&key, corpus, &neighborhoods) {
            warn!("Could not write neighborhood cache {:?}: {}", key.path(store.format()), e);
        }
        Ok((neighborhoods, NeighborhoodSource::Index))
    }

    fn build(&self, corpus: &Corpus) -> Result<Neighborhoods> {
        let visible = self.config.index.show_progress;

        let progress = phase_progress(corpus.len() as u64, "Indexing", visible);
        let index = FuzzyIndex::build_with_progress(corpus, self.params.eps1, &progress);
        progress.finish_and_clear();
        let stats = index.stats();
        info!("Index holds {} terms under {} variant keys", stats.terms, stats.variant_keys);

        let progress = phase_progress(corpus.len() as u64, "Neighborhoods", visible);
        let neighborhoods = Neighborhoods::build(&index, corpus, &progress);
        progress.finish_and_clear();
        neighborhoods
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use crate::config::subsystems::CacheFormat;

    fn write_corpus(dir: &Path, words: &[&str]) -> PathBuf {
        let path = dir.join("words.txt");
        fs::write(&path, words.join("\n")).unwrap();
        path
    }

    fn pipeline(params: ClusterParams) -> ClusteringPipeline {
        let mut config = MdbscanConfig::default();
        config.index.threads = 2;
        ClusteringPipeline::new(config, params)
    }

    #[test]
    fn builds_then_reuses_the_cache() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_corpus(dir.path(), &["cat", "bat", "hat", "dog"]);
        let p = pipeline(ClusterParams::new(1, None, 2).unwrap());
        let corpus = Corpus::from_path(&path).unwrap();

        let (first, source) = p.neighborhoods(&corpus, &path).unwrap();
        assert_eq!(source, NeighborhoodSource::Index);
        assert!(dir.path().join(".mdbscan-cache.1.words.txt.bin").is_file());

        let (second, source) = p.neighborhoods(&corpus, &path).unwrap();
        assert_eq!(source, NeighborhoodSource::Cache);
        assert_eq!(first, second);

        assert_eq!(p.run(&path).unwrap().to_json().unwrap(), r#"{"-1":["dog"],"0":["cat","bat","hat"]}"#);
    }

    #[test]
    fn corrupt_cache_is_rebuilt_or_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_corpus(dir.path(), &["cat", "bat", "hat", "dog"]);
        let cache_path = dir.path().join(".mdbscan-cache.1.words.txt.json");
        fs::write(&cache_path, "{\"cat\": [\"cat\"]}").unwrap();

        let mut p = pipeline(ClusterParams::new(1, None, 2).unwrap());
        p.config.cache.format = CacheFormat::Json;
        p.config.cache.on_corrupt = CorruptCachePolicy::Fail;
        assert!(matches!(p.run(&path), Err(Error::CacheIntegrity(_))));

        p.config.cache.on_corrupt = CorruptCachePolicy::Rebuild;
        let output = p.run(&path).unwrap();
        assert_eq!(output.cluster(0).unwrap(), &["cat", "bat", "hat"]);
        let rewritten: serde_json::Value = serde_json::from_str(&fs::read_to_string(&cache_path).unwrap()).unwrap();
        assert_eq!(rewritten["cat"], serde_json::json!(["cat", "bat", "hat"]));
    }

    #[test]
    fn disabled_cache_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_corpus(dir.path(), &["cat", "bat"]);
        let mut p = pipeline(ClusterParams::new(1, None, 2).unwrap());
        p.config.cache.enabled = false;
        p.run(&path).unwrap();
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn separate_cache_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_corpus(dir.path(), &["cat", "bat"]);
        let cache_dir = dir.path().join("cache");
        let mut p = pipeline(ClusterParams::new(1, None, 2).unwrap());
        p.config.files.cache_dir = Some(cache_dir.clone());
        p.run(&path).unwrap();
        assert!(cache_dir.join(".mdbscan-cache.1.words.txt.bin").is_file());
    }

    #[test]
    fn matrix_source_matches_index_source() {
        let dir = tempfile::tempdir().unwrap();
        let words = ["color", "colour", "colors", "flavor", "flavour"];
        let path = write_corpus(dir.path(), &words);
        let corpus = Corpus::from_path(&path).unwrap();
        let matrix_path = dir.path().join("words_distance_matrix.npy");
        DistanceMatrix::compute(&corpus, &indicatif::ProgressBar::hidden()).unwrap().save(&matrix_path).unwrap();

        let params = ClusterParams::new(2, None, 2).unwrap();
        let from_index = pipeline(params.clone()).run(&path).unwrap();
        let from_matrix = pipeline(params).with_matrix(&matrix_path).run(&path).unwrap();
        assert_eq!(from_index, from_matrix);
    }

    #[test]
    fn matrix_of_wrong_size_is_an_input_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_corpus(dir.path(), &["cat", "bat", "hat"]);
        let matrix_path = dir.path().join("m.npy");
        DistanceMatrix::from_cells(2, vec![0, 1, 1, 0]).unwrap().save(&matrix_path).unwrap();

        let err = pipeline(ClusterParams::new(1, None, 2).unwrap())
            .with_matrix(&matrix_path)
            .run(&path)
            .unwrap_err();
        assert!(err.is_input());
    }

    #[test]
    fn missing_corpus_is_an_input_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = pipeline(ClusterParams::new(1, None, 2).unwrap())
            .run(dir.path().join("absent.txt"))
            .unwrap_err();
        assert!(matches!(err, Error::MissingInput(_)));
    }
}
