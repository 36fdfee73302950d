//! Repository-relative path helpers.
//!
//! All paths handled here are `/`-separated strings relative to the
//! repository root or to a package directory, never absolute.

use std::path::Path;

/// Python source suffix.
pub const PY_SUFFIX: &str = ".py";

/// Joins two relative paths, treating an empty side as the current directory.
///
/// # Example
///
/// ```ignore
/// assert_eq!(join_rel("a/b", "c.py"), "a/b/c.py");
/// assert_eq!(join_rel("", "c.py"), "c.py");
/// ```
#[must_use]
pub fn join_rel(base: &str, path: &str) -> String {
    let base = base.trim_end_matches('/');
    let path = path.trim_start_matches('/');
    match (base.is_empty(), path.is_empty()) {
        (true, _) => path.to_string(),
        (false, true) => base.to_string(),
        (false, false) => format!("{base}/{path}"),
    }
}

/// Converts a relative [`Path`] into a `/`-separated string.
#[must_use]
pub fn to_slash(path: &Path) -> String {
    path.components()
        .filter_map(|c| match c {
            std::path::Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Final component of a `/`-separated path.
#[must_use]
pub fn base_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// Directory part of a `/`-separated path (empty when there is none).
#[must_use]
pub fn dir_name(path: &str) -> &str {
    path.rsplit_once('/').map_or("", |(dir, _)| dir)
}

/// File name without the `.py` suffix; used as a per-file target name.
#[must_use]
pub fn stem(path: &str) -> &str {
    let name = base_name(path);
    name.strip_suffix(PY_SUFFIX).unwrap_or(name)
}

/// Relative path from directory `from` to directory `to`.
///
/// Returns `"."` when both are the same directory.
#[must_use]
pub fn relative_path(from: &str, to: &str) -> String {
    let from: Vec<&str> = from.split('/').filter(|p| !p.is_empty()).collect();
    let to: Vec<&str> = to.split('/').filter(|p| !p.is_empty()).collect();

    let common = from
        .iter()
        .zip(to.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let parts: Vec<&str> = std::iter::repeat("..")
        .take(from.len() - common)
        .chain(to[common..].iter().copied())
        .collect();

    if parts.is_empty() {
        ".".to_string()
    } else {
        parts.join("/")
    }
}

/// Dotted module name of `file` in package `package`, relative to `project_root`.
///
/// # Example
///
/// ```ignore
/// // src/foo/bar.py under python root "src"
/// assert_eq!(module_from_src("src", "src/foo", "bar.py"), "foo.bar");
/// ```
#[must_use]
pub fn module_from_src(project_root: &str, package: &str, file: &str) -> String {
    let repo_path = join_rel(package, file);
    let rel = strip_dir_prefix(&repo_path, project_root).unwrap_or(&repo_path);
    let rel = rel.strip_suffix(PY_SUFFIX).unwrap_or(rel);
    rel.replace('/', ".")
}

/// Strips a directory prefix on a component boundary.
#[must_use]
pub fn strip_dir_prefix<'a>(path: &'a str, dir: &str) -> Option<&'a str> {
    if dir.is_empty() {
        return Some(path);
    }
    if path == dir {
        return Some("");
    }
    path.strip_prefix(dir)?.strip_prefix('/')
}
