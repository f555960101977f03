// cluster/mod.rs
pub mod engine;
pub mod output;

pub use self::engine::{ClusterEngine, Clustering};
pub use self::output::ClusterOutput;
