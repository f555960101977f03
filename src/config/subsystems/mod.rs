pub mod index;
pub mod cache;
pub mod logging;

pub use index::IndexConfig;
pub use cache::{CacheConfig, CacheFormat, CorruptCachePolicy};
pub use logging::LoggingConfig;
