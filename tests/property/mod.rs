//! Property-based testing for cron-backup
//!
//! Uses proptest to check that an archive holds exactly one entry per object
//! of a randomly generated tree, with identical file contents.

use cron_backup::{Archiver, SourceTree};
use proptest::prelude::*;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// One object of a generated tree
#[derive(Debug, Clone)]
pub enum TreeNode {
    File { path: PathBuf, content: Vec<u8> },
    Dir { path: PathBuf },
}

/// Generate random relative paths (0-3 directories deep)
fn path_strategy() -> impl Strategy<Value = PathBuf> {
    let dir_strategy = prop::collection::vec("[a-d]{1,3}", 0..=3);
    let name_strategy = prop_oneof![
        "file[0-9]{1,2}\\.txt".prop_map(|s| s),
        "[e-h]{1,4}".prop_map(|s| s),
    ];

    (dir_strategy, name_strategy).prop_map(|(dirs, name)| {
        let mut path = PathBuf::new();
        for dir in dirs {
            path.push(dir);
        }
        path.join(name)
    })
}

/// Generate random file content
fn content_strategy() -> impl Strategy<Value = Vec<u8>> {
    prop_oneof![
        "[a-zA-Z0-9 \r\n]{0,200}".prop_map(|s| s.into_bytes()),
        prop::collection::vec(any::<u8>(), 0..4096),
        (any::<u8>(), 1..2000usize).prop_map(|(byte, count)| vec![byte; count]),
    ]
}

fn node_strategy() -> impl Strategy<Value = TreeNode> {
    prop_oneof![
        3 => (path_strategy(), content_strategy())
            .prop_map(|(path, content)| TreeNode::File { path, content }),
        1 => path_strategy().prop_map(|path| TreeNode::Dir { path }),
    ]
}

/// Materialize nodes, skipping any that collide with an existing object.
/// Returns expected archive contents keyed by entry name.
fn build_tree(root: &Path, nodes: &[TreeNode]) -> BTreeMap<String, Option<Vec<u8>>> {
    for node in nodes {
        match node {
            TreeNode::Dir { path } => {
                let _ = fs::create_dir_all(root.join(path));
            }
            TreeNode::File { path, content } => {
                let full = root.join(path);
                if let Some(parent) = full.parent() {
                    if fs::create_dir_all(parent).is_err() {
                        continue;
                    }
                }
                if full.is_dir() {
                    continue;
                }
                let _ = fs::write(&full, content);
            }
        }
    }

    // Whatever actually landed on disk is the source of truth
    let mut expected = BTreeMap::new();
    for entry in list_tree(root) {
        let relative = entry.strip_prefix(root).unwrap();
        let name = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join("/");
        if entry.is_dir() {
            expected.insert(format!("{}/", name), None);
        } else {
            expected.insert(name, Some(fs::read(&entry).unwrap()));
        }
    }
    expected
}

fn list_tree(root: &Path) -> Vec<PathBuf> {
    let mut out = Vec::new();
    let mut stack = vec![root.to_path_buf()];
    while let Some(dir) = stack.pop() {
        for entry in fs::read_dir(&dir).unwrap() {
            let path = entry.unwrap().path();
            if path.is_dir() {
                stack.push(path.clone());
            }
            out.push(path);
        }
    }
    out
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_archive_is_complete_and_exact(nodes in prop::collection::vec(node_strategy(), 0..25)) {
        let source = TempDir::new().unwrap();
        let dest = TempDir::new().unwrap();
        let expected = build_tree(source.path(), &nodes);

        let out = dest.path().join("snapshot.zip");
        let summary = Archiver::new().archive_to(&out, source.path()).unwrap();
        let actual = crate::read_archive(&out);

        prop_assert_eq!(summary.entries, expected.len());
        prop_assert_eq!(
            summary.bytes_copied,
            expected.values().flatten().map(|d| d.len() as u64).sum::<u64>()
        );
        prop_assert_eq!(&actual, &expected);
    }

    #[test]
    fn prop_traversal_is_deterministic(nodes in prop::collection::vec(node_strategy(), 0..25)) {
        let source = TempDir::new().unwrap();
        build_tree(source.path(), &nodes);
        let tree = SourceTree::new(source.path());

        let first: Vec<PathBuf> = tree.entries().map(|e| e.unwrap().relative_path).collect();
        let second: Vec<PathBuf> = tree.entries().map(|e| e.unwrap().relative_path).collect();
        prop_assert_eq!(&first, &second);

        // Every directory precedes its contents
        let mut seen = BTreeSet::new();
        for path in &first {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                prop_assert!(seen.contains(parent), "{:?} before its parent", path);
            }
            seen.insert(path.clone());
        }
    }
}
