pub mod compression;
pub mod jitter;
pub mod observability;

pub use compression::{compress, decompress, CompressionError};
pub use jitter::Jitter;
pub use observability::init_tracing;
