//! Path helpers for registry keys.
//!
//! Registry paths are stored with forward slashes on every platform so that
//! include directives written on one system resolve on another.

use std::path::Path;

/// Convert a path to the `/`-separated form used as a registry key.
///
/// Windows extended-length prefixes are stripped before separators are
/// normalized.
#[must_use]
pub fn normalize_path_for_storage<P: AsRef<Path>>(path: P) -> String {
    let path_str = path.as_ref().to_string_lossy();

    let cleaned = if let Some(stripped) = path_str.strip_prefix(r"\\?\UNC\") {
        format!("//{stripped}")
    } else if let Some(stripped) = path_str.strip_prefix(r"\\?\") {
        stripped.to_string()
    } else {
        path_str.to_string()
    };

    cleaned.replace('\\', "/")
}

/// Whether the final component of `path` is a dot file.
#[must_use]
pub fn is_hidden(path: &str) -> bool {
    path.rsplit(['/', '\\']).next().is_some_and(|name| name.starts_with('.'))
}
