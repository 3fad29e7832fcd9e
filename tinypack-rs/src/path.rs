//! Path helpers shared by resolution and module identifiers.
//!
//! Module ids must not depend on the platform's separator or on the relative
//! route a file was reached through, so every id goes through
//! [`normalize_path`] and [`to_unix_path`].

use std::path::{Component, Path, PathBuf};

/// Replaces every backslash with a forward slash.
pub fn to_unix_path(path: &str) -> String {
    path.replace('\\', "/")
}

/// Lexically normalizes a path: `.` segments are dropped and `..` pops the
/// previous normal segment. The filesystem is not consulted.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match normalized.components().next_back() {
                Some(Component::Normal(_)) => {
                    normalized.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => normalized.push(".."),
            },
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}

/// Canonical module id of `file`: `./` followed by its forward-slash path
/// relative to `root`.
pub fn module_id(root: &Path, file: &Path) -> String {
    let file = normalize_path(file);
    let relative = pathdiff::diff_paths(&file, root).unwrap_or(file);
    format!("./{}", to_unix_path(&relative.to_string_lossy()))
}
