/*!
 * Concurrent recursive tree walking
 */

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use once_cell::sync::OnceCell;
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuildError, ThreadPoolBuilder};
use tracing::{debug, trace};

use crate::error::{Result, WalkError};
use crate::estimator::estimate_compressed_size;
use crate::types::FileMetadata;

/// Stack reserved for each walker thread.
///
/// Every directory level costs a few rayon frames, and a thread blocked in a
/// join may run stolen subtrees on top of its own. This leaves room for trees
/// as deep as PATH_MAX permits, since full paths bound the depth.
const WALKER_STACK_SIZE: usize = 128 * 1024 * 1024;

/// Walks a path and describes it as a [`FileMetadata`] tree.
///
/// Every child of every directory is handed to rayon as its own task, so
/// siblings are measured concurrently. Results are collected by position,
/// which keeps children in enumeration order no matter which task finishes
/// first. A failing child stops further siblings from being scheduled, and the
/// parent only returns after every started sibling has finished. When several
/// children fail at once, which of their errors is reported is unspecified.
///
/// Walks always run on the walker's own pool, never on the calling thread.
pub struct TreeWalker {
    pool: ThreadPool,
}

impl TreeWalker {
    /// Create a walker with one thread per CPU
    pub fn new() -> std::result::Result<Self, ThreadPoolBuildError> {
        Self::with_threads(0)
    }

    /// Create a walker with `num_threads` workers (0 picks one per CPU)
    pub fn with_threads(num_threads: usize) -> std::result::Result<Self, ThreadPoolBuildError> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(num_threads)
            .stack_size(WALKER_STACK_SIZE)
            .thread_name(|i| format!("treegauge-walk-{}", i))
            .build()?;
        Ok(Self { pool })
    }

    /// Number of worker threads in the pool
    pub fn num_threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Walk `path` and return its record, or the first error found in its subtree
    pub fn walk(&self, path: &Path) -> Result<FileMetadata> {
        self.pool.install(|| walk_entry(path))
    }

    /// Walk `path` and hand the record to `render`, all on the walker's pool.
    ///
    /// Serializing and dropping a record recurse as deep as the tree, so
    /// callers on small stacks should go through this instead of [`walk`](Self::walk).
    pub fn walk_with<T, F>(&self, path: &Path, render: F) -> Result<T>
    where
        F: FnOnce(FileMetadata) -> T + Send,
        T: Send,
    {
        self.pool.install(|| walk_entry(path).map(render))
    }
}

static SHARED_WALKER: OnceCell<TreeWalker> = OnceCell::new();

/// Walk `path` on a process-wide walker created on first use
pub fn walk(path: impl AsRef<Path>) -> Result<FileMetadata> {
    let path = path.as_ref();
    let walker = SHARED_WALKER
        .get_or_try_init(TreeWalker::new)
        .map_err(|e| WalkError::Io {
            path: path.to_path_buf(),
            source: io::Error::new(io::ErrorKind::Other, e),
        })?;
    walker.walk(path)
}

fn walk_entry(path: &Path) -> Result<FileMetadata> {
    let metadata = fs::metadata(path).map_err(|e| WalkError::from_io(path, e))?;
    let modified_at = metadata
        .modified()
        .map(DateTime::<Utc>::from)
        .map_err(|e| WalkError::from_io(path, e))?;
    let name = entry_name(path);

    if metadata.is_dir() {
        let children = walk_children(path)?;
        return Ok(FileMetadata::directory(name, modified_at, children));
    }

    if !metadata.is_file() {
        // FIFOs, sockets and devices are reported but never opened
        trace!(path = %path.display(), "special file, not measured");
        return Ok(FileMetadata::leaf(name, modified_at, 0));
    }

    let file = File::open(path).map_err(|e| WalkError::from_io(path, e))?;
    let compressed_size =
        estimate_compressed_size(file).map_err(|e| WalkError::from_estimate(path, e))?;
    trace!(path = %path.display(), compressed_size, "measured file");

    Ok(FileMetadata::leaf(name, modified_at, compressed_size))
}

fn walk_children(dir: &Path) -> Result<Vec<FileMetadata>> {
    let entries: Vec<PathBuf> = fs::read_dir(dir)
        .map_err(|e| WalkError::from_io(dir, e))?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<io::Result<_>>()
        .map_err(|e| WalkError::from_io(dir, e))?;

    debug!(path = %dir.display(), entries = entries.len(), "fanning out");

    entries.par_iter().map(|child| walk_entry(child)).collect()
}

/// Base name of `path`, or the whole path when it has none (e.g. `/`)
fn entry_name(path: &Path) -> String {
    match path.file_name() {
        Some(name) => name.to_string_lossy().to_string(),
        None => path.display().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Nest `d/d/.../leaf.txt` `depth` levels below `root`
    fn make_deep_tree(root: &Path, depth: usize) -> PathBuf {
        let mut deepest = root.to_path_buf();
        for _ in 0..depth {
            deepest.push("d");
        }
        fs::create_dir_all(&deepest).unwrap();
        fs::write(deepest.join("leaf.txt"), b"bottom").unwrap();
        deepest
    }

    #[test]
    fn deep_tree_does_not_overflow() {
        let dir = tempfile::tempdir().unwrap();
        // Stay under PATH_MAX whatever the temp directory is called
        let room = 4000usize.saturating_sub(dir.path().as_os_str().len() + 16);
        let depth = (room / 2).min(2000);
        assert!(depth >= 1500, "temp dir path too long for a deep tree");
        make_deep_tree(dir.path(), depth);

        let record = walk(dir.path()).expect("deep walk should succeed");

        // Unwind level by level so dropping the record never recurses deeply
        let mut levels = 0;
        let mut node = record;
        loop {
            let mut children = node.into_children();
            assert!(children.len() <= 1);
            match children.pop() {
                Some(child) if child.is_dir() => {
                    assert_eq!(child.name(), "d");
                    levels += 1;
                    node = child;
                }
                Some(leaf) => {
                    assert_eq!(leaf.name(), "leaf.txt");
                    assert!(leaf.compressed_size() > 20);
                    break;
                }
                None => panic!("tree ended early at level {}", levels),
            }
        }
        assert_eq!(levels, depth);
    }

    #[test]
    fn name_is_final_component() {
        assert_eq!(entry_name(Path::new("/srv/data/report.csv")), "report.csv");
        assert_eq!(entry_name(Path::new("/")), "/");
    }

    #[test]
    fn dedicated_pool_walks() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("one"), b"1").unwrap();

        let walker = TreeWalker::with_threads(2).unwrap();
        assert_eq!(walker.num_threads(), 2);
        let record = walker.walk(dir.path()).unwrap();
        assert_eq!(record.children().len(), 1);
        assert_eq!(record.children()[0].name(), "one");
    }

    #[test]
    fn deep_tree_renders_on_pool() {
        let dir = tempfile::tempdir().unwrap();
        let room = 4000usize.saturating_sub(dir.path().as_os_str().len() + 16);
        let depth = (room / 2).min(2000);
        make_deep_tree(dir.path(), depth);

        let walker = TreeWalker::with_threads(2).unwrap();
        let json = walker
            .walk_with(dir.path(), |record| serde_json::to_string(&record))
            .unwrap()
            .unwrap();
        assert_eq!(json.matches("\"filename\":\"d\"").count(), depth);
        assert!(json.contains("\"filename\":\"leaf.txt\""));
    }
}
