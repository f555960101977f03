//! mdbscan groups a corpus of short strings (typically leaked passwords)
//! into clusters of structurally similar values.
//!
//! Neighborhoods under a Levenshtein bound come from a deletion-variant
//! fuzzy index and are cached on disk per corpus and bound. Clusters are
//! grown from them with DBSCAN, or with MDBSCAN, which additionally gates
//! membership on Jaro-Winkler distance to each cluster's seed.

// Module declarations
pub mod error;
pub mod corpus;
pub mod storage;
pub mod matcher;
pub mod matrix;
pub mod utils;
pub mod config;
pub mod types;

// Re-exports
pub use error::{Error, Result};
pub use corpus::Corpus;
pub use matcher::{ClusterEngine, ClusterOutput, ClusteringPipeline, FuzzyIndex, JaroWinkler, Neighborhoods};
pub use matrix::DistanceMatrix;
pub use types::{ClusterMode, ClusterParams, Label, TermId};

// Re-export the config from config module
pub use config::MdbscanConfig;
