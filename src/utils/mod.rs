pub mod logger;
pub mod mmap;

pub use self::logger::{init_logging, phase_progress};
pub use self::mmap::MmapFileHandler;
