use std::fs;
use std::path::{Path, PathBuf};

use mdbscan::config::subsystems::CacheFormat;
use mdbscan::matcher::NeighborhoodSource;
use mdbscan::{ClusterParams, ClusteringPipeline, Corpus, Error, MdbscanConfig};

fn write_corpus(dir: &Path, name: &str, words: &[&str]) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, words.join("\n")).unwrap();
    path
}

fn config(format: CacheFormat) -> MdbscanConfig {
    let mut config = MdbscanConfig::default();
    config.index.threads = 2;
    config.cache.format = format;
    config
}

#[test]
fn scenario_color_colour_colors() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_corpus(dir.path(), "spelling.txt", &["color", "colour", "colors"]);

    let params = ClusterParams::new(2, Some(0.03), 2).unwrap();
    let output = ClusteringPipeline::new(config(CacheFormat::Bincode), params).run(&path).unwrap();
    assert_eq!(output.label_of("color"), output.label_of("colors"));
    assert_ne!(output.label_of("color"), output.label_of("colour"));

    // Without eps2 all three share one cluster.
    let params = ClusterParams::new(2, None, 2).unwrap();
    let output = ClusteringPipeline::new(config(CacheFormat::Bincode), params).run(&path).unwrap();
    assert_eq!(output.cluster_count(), 1);
    assert_eq!(output.cluster(0).unwrap(), &["color", "colour", "colors"]);
}

#[test]
fn cached_neighborhoods_equal_rebuilt_ones() {
    let dir = tempfile::tempdir().unwrap();
    let words = ["password", "passw0rd", "password1", "p4ssword", "letmein", "letmein!", "qwerty", "dragon"];
    let path = write_corpus(dir.path(), "leak.txt", &words);
    let corpus = Corpus::from_path(&path).unwrap();

    for format in [CacheFormat::Bincode, CacheFormat::Json] {
        let params = ClusterParams::new(2, None, 2).unwrap();
        let pipeline = ClusteringPipeline::new(config(format), params);

        let (built, source) = pipeline.neighborhoods(&corpus, &path).unwrap();
        assert_eq!(source, NeighborhoodSource::Index);
        let (loaded, source) = pipeline.neighborhoods(&corpus, &path).unwrap();
        assert_eq!(source, NeighborhoodSource::Cache);
        assert_eq!(built, loaded);
    }
}

#[test]
fn eps1_values_get_separate_caches() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_corpus(dir.path(), "leak.txt", &["abc", "abd", "xyz"]);

    for eps1 in [1, 2] {
        let params = ClusterParams::new(eps1, None, 2).unwrap();
        ClusteringPipeline::new(config(CacheFormat::Bincode), params).run(&path).unwrap();
    }
    assert!(dir.path().join(".mdbscan-cache.1.leak.txt.bin").is_file());
    assert!(dir.path().join(".mdbscan-cache.2.leak.txt.bin").is_file());
}

#[test]
fn stale_cache_for_an_edited_corpus_is_rebuilt() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_corpus(dir.path(), "leak.txt", &["cat", "bat", "dog"]);
    let params = ClusterParams::new(1, None, 2).unwrap();
    let pipeline = ClusteringPipeline::new(config(CacheFormat::Bincode), params);
    pipeline.run(&path).unwrap();

    write_corpus(dir.path(), "leak.txt", &["cat", "bat", "dog", "dot"]);
    let output = pipeline.run(&path).unwrap();
    assert_eq!(output.clusters(), &[vec!["cat".to_string(), "bat".to_string()], vec!["dog".to_string(), "dot".to_string()]]);
}

#[test]
fn duplicate_terms_stop_the_run() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_corpus(dir.path(), "leak.txt", &["cat", "", "cat"]);
    let params = ClusterParams::new(1, None, 2).unwrap();
    let err = ClusteringPipeline::new(config(CacheFormat::Bincode), params).run(&path).unwrap_err();
    assert!(matches!(err, Error::DuplicateTerm { line: 3, first_line: 1, .. }));
    assert_eq!(err.exit_code(), 2);
}
