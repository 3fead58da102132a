//! Project root resolution.
//!
//! Roots come from config files, CLI flags and apply requests. They may use
//! `~` and `..`, and are resolved lexically so a root that does not exist
//! yet still yields a stable path.

use std::path::{Component, Path, PathBuf};

/// Expand a leading `~` to the home directory. Nothing else is touched.
pub fn expand_tilde(raw: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(raw).as_ref())
}

/// Drop `.` components and fold `..` into the preceding component.
///
/// `..` directly under the filesystem root stays at the root; leading `..`
/// of a relative path is kept.
pub fn clean_path(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => out.push(".."),
            },
            other => out.push(other),
        }
    }
    out
}

/// `raw` (tilde-expanded) joined onto `base` unless already absolute, then
/// cleaned.
pub fn resolve_root(raw: &str, base: &Path) -> PathBuf {
    let path = expand_tilde(raw);
    if path.is_absolute() {
        clean_path(&path)
    } else {
        clean_path(&base.join(path))
    }
}
