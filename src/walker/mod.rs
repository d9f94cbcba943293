//! Recursive device-tree walker
//!
//! Enumerates filesystem entries under a root path to a bounded or unbounded
//! depth, classifying each entry and handing every non-directory leaf to a
//! caller-supplied visitor. The erase orchestrator drives this over the
//! device root; the walker itself knows nothing about erasure.
//!
//! The walk is strict: an unreadable directory or an unstattable entry fails
//! the whole call rather than silently skipping. On a panic run, "some
//! devices were quietly never visited" is the failure mode this tool exists
//! to avoid, and the caller decides what a failed walk means.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Classification of a directory entry, derived from a metadata query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// A directory; candidate for descent, never visited as a leaf
    Directory,
    /// A regular file or a device node (block, char, fifo, socket)
    RegularOrDevice,
    /// Anything the metadata query could not place in the other two
    Unknown,
}

/// Remaining recursion depth for a walk.
///
/// `Bounded(n)` permits `n` further levels of descent; a directory reached
/// with `Bounded(0)` is skipped entirely. `Unbounded` never decrements and
/// terminates only because the directory graph is acyclic (`.` and `..` are
/// excluded from recursion).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecursionBudget {
    /// Descend at most this many more levels
    Bounded(u32),
    /// Descend without a depth limit
    Unbounded,
}

impl RecursionBudget {
    /// Budget for one level deeper, or `None` if descent is not permitted.
    pub fn descend(self) -> Option<RecursionBudget> {
        match self {
            RecursionBudget::Unbounded => Some(RecursionBudget::Unbounded),
            RecursionBudget::Bounded(0) => None,
            RecursionBudget::Bounded(n) => Some(RecursionBudget::Bounded(n - 1)),
        }
    }
}

/// Traversal errors
#[derive(Debug, Error)]
pub enum WalkError {
    /// The directory itself could not be opened; nothing under it was visited
    #[error("cannot open directory {path}: {source}")]
    DirectoryUnavailable {
        /// Directory that failed to open
        path: PathBuf,
        /// Underlying I/O error
        source: io::Error,
    },

    /// Metadata for an entry could not be read; the walk is abandoned
    #[error("cannot read metadata for {path}: {source}")]
    MetadataUnavailable {
        /// Entry that failed to stat
        path: PathBuf,
        /// Underlying I/O error
        source: io::Error,
    },
}

/// Per-leaf action capability.
///
/// The walker ignores anything `visit` does; errors inside a visitor are the
/// visitor's responsibility to handle and log, and must not abort the walk.
pub trait LeafVisitor {
    /// Called once per non-directory entry
    fn visit(&mut self, path: &Path, kind: EntryKind);
}

impl<F: FnMut(&Path, EntryKind)> LeafVisitor for F {
    fn visit(&mut self, path: &Path, kind: EntryKind) {
        self(path, kind)
    }
}

/// Walk `root`, visiting every non-directory entry down to `budget` levels.
///
/// Directories named `.` and `..` are never descended into, which guarantees
/// termination on self/parent references. Returns `Ok(())` when every
/// reachable entry was classified and every leaf visited; the walk never
/// retries.
pub fn walk(
    root: &Path,
    budget: RecursionBudget,
    visitor: &mut dyn LeafVisitor,
) -> Result<(), WalkError> {
    let entries = fs::read_dir(root).map_err(|source| WalkError::DirectoryUnavailable {
        path: root.to_path_buf(),
        source,
    })?;

    for entry in entries {
        let entry = entry.map_err(|source| WalkError::MetadataUnavailable {
            path: root.to_path_buf(),
            source,
        })?;

        // read_dir already omits these on every supported platform, but the
        // termination argument for Unbounded rests on the exclusion, so it
        // is enforced here rather than assumed.
        let name = entry.file_name();
        if name == "." || name == ".." {
            continue;
        }

        let path = entry.path();
        // Follows symlinks, so /dev/disk-style links classify as their target
        let metadata = fs::metadata(&path).map_err(|source| WalkError::MetadataUnavailable {
            path: path.clone(),
            source,
        })?;

        match classify(&metadata) {
            EntryKind::Directory => {
                if let Some(remaining) = budget.descend() {
                    walk(&path, remaining, visitor)?;
                }
            }
            kind => visitor.visit(&path, kind),
        }
    }

    Ok(())
}

fn classify(metadata: &fs::Metadata) -> EntryKind {
    use std::os::unix::fs::FileTypeExt;

    let file_type = metadata.file_type();
    if file_type.is_dir() {
        EntryKind::Directory
    } else if file_type.is_file()
        || file_type.is_block_device()
        || file_type.is_char_device()
        || file_type.is_fifo()
        || file_type.is_socket()
    {
        EntryKind::RegularOrDevice
    } else {
        EntryKind::Unknown
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use tempfile::TempDir;

    /// depth 0: leaf0
    /// depth 1: d1/leaf1
    /// depth 2: d1/d2/leaf2
    fn three_level_tree() -> TempDir {
        let dir = TempDir::new().expect("Failed to create temp dir");
        File::create(dir.path().join("leaf0")).unwrap();
        fs::create_dir(dir.path().join("d1")).unwrap();
        File::create(dir.path().join("d1/leaf1")).unwrap();
        fs::create_dir(dir.path().join("d1/d2")).unwrap();
        File::create(dir.path().join("d1/d2/leaf2")).unwrap();
        dir
    }

    fn collect_leaves(root: &Path, budget: RecursionBudget) -> Result<Vec<String>, WalkError> {
        let mut names = Vec::new();
        let mut visit = |path: &Path, _kind: EntryKind| {
            names.push(path.file_name().unwrap().to_string_lossy().into_owned());
        };
        walk(root, budget, &mut visit)?;
        names.sort();
        Ok(names)
    }

    #[test]
    fn test_budget_zero_visits_only_top_level_leaves() {
        let dir = three_level_tree();
        let leaves = collect_leaves(dir.path(), RecursionBudget::Bounded(0)).unwrap();
        assert_eq!(leaves, vec!["leaf0"]);
    }

    #[test]
    fn test_budget_one_reaches_one_level_of_grouping() {
        let dir = three_level_tree();
        let leaves = collect_leaves(dir.path(), RecursionBudget::Bounded(1)).unwrap();
        assert_eq!(leaves, vec!["leaf0", "leaf1"]);
    }

    #[test]
    fn test_budget_beyond_tree_depth_visits_everything() {
        let dir = three_level_tree();
        let leaves = collect_leaves(dir.path(), RecursionBudget::Bounded(7)).unwrap();
        assert_eq!(leaves, vec!["leaf0", "leaf1", "leaf2"]);
    }

    #[test]
    fn test_unbounded_visits_everything() {
        let dir = three_level_tree();
        let leaves = collect_leaves(dir.path(), RecursionBudget::Unbounded).unwrap();
        assert_eq!(leaves, vec!["leaf0", "leaf1", "leaf2"]);
    }

    #[test]
    fn test_descend_decrements_bounded_budget() {
        assert_eq!(
            RecursionBudget::Bounded(2).descend(),
            Some(RecursionBudget::Bounded(1))
        );
        assert_eq!(RecursionBudget::Bounded(0).descend(), None);
        assert_eq!(
            RecursionBudget::Unbounded.descend(),
            Some(RecursionBudget::Unbounded)
        );
    }

    #[test]
    fn test_missing_root_is_directory_unavailable() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope");
        let err = collect_leaves(&missing, RecursionBudget::Bounded(1)).unwrap_err();
        assert!(matches!(err, WalkError::DirectoryUnavailable { .. }));
    }

    #[test]
    fn test_dangling_symlink_is_metadata_unavailable() {
        let dir = TempDir::new().unwrap();
        std::os::unix::fs::symlink(dir.path().join("gone"), dir.path().join("dangling")).unwrap();
        let err = collect_leaves(dir.path(), RecursionBudget::Bounded(1)).unwrap_err();
        match err {
            WalkError::MetadataUnavailable { path, .. } => {
                assert_eq!(path.file_name().unwrap(), "dangling");
            }
            other => panic!("expected MetadataUnavailable, got {:?}", other),
        }
    }

    #[test]
    fn test_directory_at_exhausted_budget_is_not_visited_as_leaf() {
        let dir = three_level_tree();
        let mut visited_dirs = 0;
        let mut visit = |_path: &Path, kind: EntryKind| {
            if kind == EntryKind::Directory {
                visited_dirs += 1;
            }
        };
        walk(dir.path(), RecursionBudget::Bounded(0), &mut visit).unwrap();
        assert_eq!(visited_dirs, 0);
    }

    #[test]
    fn test_leaves_classify_as_regular_or_device() {
        let dir = three_level_tree();
        let mut kinds = Vec::new();
        let mut visit = |_path: &Path, kind: EntryKind| kinds.push(kind);
        walk(dir.path(), RecursionBudget::Unbounded, &mut visit).unwrap();
        assert_eq!(kinds.len(), 3);
        assert!(kinds.iter().all(|k| *k == EntryKind::RegularOrDevice));
    }
}
