//! Device-walker traversal invariant tests
//!
//! Tests for invariants:
//! - T1: a walk with budget `b` over a tree of depth `d` visits leaves only
//!   down to depth `min(b, d)`; an unbounded walk visits all of them
//! - T2: strict metadata failure: one unstattable entry abandons the call
//! - T3: visitor behavior never aborts the walk

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use scuttle::walker::{walk, EntryKind, RecursionBudget, WalkError};

// =============================================================================
// Test Utilities
// =============================================================================

/// Builds a chain of nested directories, one leaf file at every depth:
/// root/leaf-0, root/n1/leaf-1, root/n1/n2/leaf-2, ...
fn chain_of_depth(depth: u32) -> TempDir {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let mut current = dir.path().to_path_buf();
    File::create(current.join("leaf-0")).unwrap();
    for level in 1..=depth {
        current = current.join(format!("n{}", level));
        fs::create_dir(&current).unwrap();
        File::create(current.join(format!("leaf-{}", level))).unwrap();
    }
    dir
}

fn visited_leaves(root: &Path, budget: RecursionBudget) -> Vec<String> {
    let mut names = Vec::new();
    let mut visit = |path: &Path, _kind: EntryKind| {
        names.push(path.file_name().unwrap().to_string_lossy().into_owned());
    };
    walk(root, budget, &mut visit).expect("walk should succeed");
    names.sort();
    names
}

fn expected_leaves(down_to: u32) -> Vec<String> {
    (0..=down_to).map(|level| format!("leaf-{}", level)).collect()
}

// =============================================================================
// INVARIANT T1: Depth Bounding
// =============================================================================

/// T1: for budgets 0..6 over a depth-4 chain, exactly the leaves down to
/// min(budget, depth) are visited.
#[test]
fn test_t1_budget_bounds_visits_to_min_of_budget_and_depth() {
    const DEPTH: u32 = 4;
    let dir = chain_of_depth(DEPTH);

    for budget in 0..=6u32 {
        let leaves = visited_leaves(dir.path(), RecursionBudget::Bounded(budget));
        assert_eq!(
            leaves,
            expected_leaves(budget.min(DEPTH)),
            "T1 VIOLATION at budget {}",
            budget
        );
    }
}

/// T1: unbounded visits every leaf regardless of depth.
#[test]
fn test_t1_unbounded_visits_all_leaves() {
    const DEPTH: u32 = 9;
    let dir = chain_of_depth(DEPTH);
    let leaves = visited_leaves(dir.path(), RecursionBudget::Unbounded);
    assert_eq!(leaves, expected_leaves(DEPTH));
}

// =============================================================================
// INVARIANT T2: Strict Metadata Failure
// =============================================================================

/// T2: a single unstattable entry (dangling symlink) fails the whole call;
/// nothing is silently skipped.
#[test]
fn test_t2_unstattable_entry_abandons_the_walk() {
    let dir = TempDir::new().unwrap();
    File::create(dir.path().join("x0")).unwrap();
    std::os::unix::fs::symlink(dir.path().join("gone"), dir.path().join("dangling")).unwrap();

    let mut visit = |_path: &Path, _kind: EntryKind| {};
    let result = walk(dir.path(), RecursionBudget::Bounded(1), &mut visit);
    assert!(
        matches!(result, Err(WalkError::MetadataUnavailable { .. })),
        "T2 VIOLATION: walk must fail on unreadable metadata"
    );
}

/// T2: an unopenable root reports DirectoryUnavailable and visits nothing.
#[test]
fn test_t2_unopenable_root_visits_nothing() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("absent");

    let mut visited: Vec<PathBuf> = Vec::new();
    let mut visit = |path: &Path, _kind: EntryKind| visited.push(path.to_path_buf());
    let result = walk(&missing, RecursionBudget::Unbounded, &mut visit);

    assert!(matches!(result, Err(WalkError::DirectoryUnavailable { .. })));
    assert!(visited.is_empty());
}

// =============================================================================
// INVARIANT T3: Visitor Independence
// =============================================================================

/// T3: whatever the visitor does per leaf (here: deleting the leaf it was
/// handed), the walk still completes and visits every sibling.
#[test]
fn test_t3_destructive_visitor_does_not_abort_the_walk() {
    let dir = TempDir::new().unwrap();
    for name in ["a", "b", "c"] {
        File::create(dir.path().join(name)).unwrap();
    }

    let mut visits = 0;
    let mut visit = |path: &Path, _kind: EntryKind| {
        visits += 1;
        // Destroying the entry mid-walk mirrors what the erase passes do
        let _ = fs::remove_file(path);
    };
    walk(dir.path(), RecursionBudget::Bounded(1), &mut visit).unwrap();

    assert_eq!(visits, 3, "T3 VIOLATION: walk must visit every sibling");
}
