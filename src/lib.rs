/*!
 * treegauge - Describe a directory tree by staleness and compressed size
 *
 * Given a path, this library produces a nested description of it: for a
 * file, its name, modification time and gzip-compressed size; for a
 * directory, the same plus the description of every entry below it,
 * measured concurrently. The binary serves these descriptions over HTTP.
 */

pub mod config;
pub mod error;
pub mod estimator;
pub mod server;
pub mod types;
pub mod walker;


// Re-export main components for easier access
pub use config::Config;
pub use error::{EstimateError, Result, WalkError};
pub use estimator::estimate_compressed_size;
pub use types::FileMetadata;
pub use walker::{walk, TreeWalker};

/// Version of the library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
