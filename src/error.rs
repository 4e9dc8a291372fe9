//! Error handling for treegauge
//!
//! Every failure a walk can hit is terminal for the request that triggered
//! it. The dispatcher only needs to tell "nothing there" apart from
//! everything else, see [`WalkError::is_not_found`].

use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Error produced while walking a path
#[derive(Error, Debug)]
pub enum WalkError {
    /// The path does not exist
    #[error("Path not found: {}", path.display())]
    NotFound { path: PathBuf },

    /// The filesystem refused access
    #[error("Access denied: {}: {source}", path.display())]
    AccessDenied { path: PathBuf, source: io::Error },

    /// Any other stat, open, enumerate, or read failure
    #[error("IO error: {}: {source}", path.display())]
    Io { path: PathBuf, source: io::Error },

    /// The compressor could not finalize its output
    #[error("Compression failed for {}: {source}", path.display())]
    Compression { path: PathBuf, source: io::Error },
}

impl WalkError {
    /// Classify an I/O error raised while handling `path`
    pub fn from_io(path: impl Into<PathBuf>, err: io::Error) -> Self {
        let path = path.into();
        match err.kind() {
            io::ErrorKind::NotFound => WalkError::NotFound { path },
            io::ErrorKind::PermissionDenied => WalkError::AccessDenied { path, source: err },
            _ => WalkError::Io { path, source: err },
        }
    }

    /// Map a size estimator failure for the file at `path`
    pub fn from_estimate(path: impl Into<PathBuf>, err: EstimateError) -> Self {
        match err {
            EstimateError::Read(e) => Self::from_io(path, e),
            EstimateError::Compression(e) => WalkError::Compression {
                path: path.into(),
                source: e,
            },
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, WalkError::NotFound { .. })
    }

    /// Path of the entry that failed
    pub fn path(&self) -> &Path {
        match self {
            WalkError::NotFound { path }
            | WalkError::AccessDenied { path, .. }
            | WalkError::Io { path, .. }
            | WalkError::Compression { path, .. } => path,
        }
    }
}

/// Error produced by the size estimator
#[derive(Error, Debug)]
pub enum EstimateError {
    /// The input stream could not be read to completion
    #[error("read failed: {0}")]
    Read(#[source] io::Error),

    /// The compressor rejected input or could not finish
    #[error("compression failed: {0}")]
    Compression(#[source] io::Error),
}

/// Specialized Result type for walk operations
pub type Result<T> = std::result::Result<T, WalkError>;
