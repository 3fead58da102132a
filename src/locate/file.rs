//! Target file lookup under a project root.
//!
//! Search order:
//! 1. `<root>/<name>`
//! 2. conventional component directories ([`COMPONENT_DIRS`])
//! 3. recursive search under `<root>/src`, at most [`MAX_DEPTH`] levels deep

use std::path::{Path, PathBuf};

/// Conventional directories checked before any recursive search.
pub const COMPONENT_DIRS: &[&str] = &[
    "src/components",
    "components",
    "src",
    "app",
    "app/components",
    "client/components",
    "client/src/components",
];

/// Directories never descended into.
pub const SKIP_DIRS: &[&str] = &["node_modules", ".git", "dist", "build"];

/// Maximum recursion depth below `src`.
pub const MAX_DEPTH: usize = 3;

/// Whether a directory entry name should be skipped during traversal.
pub fn is_skipped_dir(name: &str) -> bool {
    SKIP_DIRS.contains(&name)
}

/// Locate `file_name` under `root`.
///
/// Returns `None` once the search order is exhausted. Callers treat that as
/// recoverable for the element at hand.
pub fn find_file(root: &Path, file_name: &str) -> Option<PathBuf> {
    if file_name.is_empty() {
        return None;
    }

    let direct = root.join(file_name);
    if direct.is_file() {
        return Some(direct);
    }

    for dir in COMPONENT_DIRS {
        let candidate = root.join(dir).join(file_name);
        if candidate.is_file() {
            return Some(candidate);
        }
    }

    let src = root.join("src");
    if src.is_dir() {
        return search_recursive(&src, file_name, 0);
    }

    None
}

/// Files in `dir` first, then subdirectories in name order.
fn search_recursive(dir: &Path, file_name: &str, depth: usize) -> Option<PathBuf> {
    if depth > MAX_DEPTH {
        return None;
    }

    let Ok(entries) = std::fs::read_dir(dir) else {
        return None;
    };

    let mut subdirs = Vec::new();
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            let skipped = entry.file_name().to_str().is_some_and(is_skipped_dir);
            if !skipped {
                subdirs.push(path);
            }
        } else if entry.file_name() == file_name {
            return Some(path);
        }
    }

    subdirs.sort();
    subdirs
        .iter()
        .find_map(|sub| search_recursive(sub, file_name, depth + 1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(root: &Path, rel: &str) -> PathBuf {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "export default null;\n").unwrap();
        path
    }

    #[test]
    fn test_direct_path_wins() {
        let dir = TempDir::new().unwrap();
        let direct = touch(dir.path(), "Card.tsx");
        touch(dir.path(), "src/components/Card.tsx");
        assert_eq!(find_file(dir.path(), "Card.tsx"), Some(direct));
    }

    #[test]
    fn test_component_dirs_in_order() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "app/Card.tsx");
        let first = touch(dir.path(), "components/Card.tsx");
        assert_eq!(find_file(dir.path(), "Card.tsx"), Some(first));
    }

    #[test]
    fn test_recursive_under_src() {
        let dir = TempDir::new().unwrap();
        let nested = touch(dir.path(), "src/features/cards/Card.tsx");
        assert_eq!(find_file(dir.path(), "Card.tsx"), Some(nested));
    }

    #[test]
    fn test_depth_limit() {
        let dir = TempDir::new().unwrap();
        // src/a/b/c is depth 3 (reachable), src/a/b/c/d is depth 4
        touch(dir.path(), "src/a/b/c/d/Deep.tsx");
        assert_eq!(find_file(dir.path(), "Deep.tsx"), None);
        let ok = touch(dir.path(), "src/a/b/c/Shallow.tsx");
        assert_eq!(find_file(dir.path(), "Shallow.tsx"), Some(ok));
    }

    #[test]
    fn test_skipped_dirs() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "src/node_modules/Card.tsx");
        touch(dir.path(), "src/dist/Card.tsx");
        assert_eq!(find_file(dir.path(), "Card.tsx"), None);
    }

    #[test]
    fn test_not_found() {
        let dir = TempDir::new().unwrap();
        assert_eq!(find_file(dir.path(), "Missing.tsx"), None);
        assert_eq!(find_file(dir.path(), ""), None);
    }
}
