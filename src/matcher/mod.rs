pub mod algorithms;
pub mod index;
pub mod neighborhoods;
pub mod cluster;
pub mod pipeline;
// Re-export the main types
pub use self::algorithms::{JaroWinkler, SecondaryMetric, levenshtein_distance, bounded_levenshtein};
pub use self::index::{FuzzyIndex, IndexStats};
pub use self::neighborhoods::Neighborhoods;
pub use self::cluster::{ClusterEngine, Clustering, ClusterOutput};
pub use self::pipeline::{ClusteringPipeline, NeighborhoodSource};
