//! Boundary-aware subdirectory walking.
//!
//! Collects the source files of a package's subdirectories without ever
//! crossing into a nested package or, outside project mode, into a
//! directory that will generate its own declarations.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use tracing::debug;
use walkdir::WalkDir;

use crate::classify::{has_entrypoint_file, is_entrypoint_file, is_source_file, Classification};
use crate::config::PythonConfig;
use crate::utils::paths::{join_rel, to_slash};
use crate::utils::ExcludeSet;

/// Filesystem and pattern failures while walking a package.
#[derive(Debug, thiserror::Error)]
pub enum WalkError {
    /// The directory walk itself failed.
    #[error("Failed to walk {path}: {source}")]
    Walk {
        /// Directory being walked.
        path: PathBuf,
        /// Underlying error.
        source: walkdir::Error,
    },

    /// An exclude pattern does not compile.
    #[error("Invalid exclude pattern `{pattern}`: {source}")]
    Pattern {
        /// The offending pattern.
        pattern: String,
        /// Underlying error.
        source: glob::PatternError,
    },

    /// A file could not be inspected.
    #[error("Failed to stat {path}: {source}")]
    Stat {
        /// File that failed.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },
}

/// Returns true if `dir` owns one of the build files.
#[must_use]
pub fn is_package(dir: &Path, build_file_names: &[String]) -> bool {
    build_file_names.iter().any(|name| dir.join(name).is_file())
}

/// Compiles the exclude patterns of a configuration.
///
/// # Errors
///
/// Returns [`WalkError::Pattern`] for the first malformed pattern.
pub fn compile_excludes(config: &PythonConfig) -> Result<ExcludeSet, WalkError> {
    ExcludeSet::compile(config.excluded_patterns())
        .map_err(|(pattern, source)| WalkError::Pattern { pattern, source })
}

/// Walks the subdirectories of one package directory.
pub struct SubdirWalker<'a> {
    dir: &'a Path,
    rel: &'a str,
    config: &'a PythonConfig,
    excludes: &'a ExcludeSet,
    visible: Option<&'a BTreeSet<PathBuf>>,
    closed: Vec<PathBuf>,
}

impl<'a> SubdirWalker<'a> {
    /// Creates a walker for the package at `dir` (repository-relative `rel`).
    #[must_use]
    pub fn new(
        dir: &'a Path,
        rel: &'a str,
        config: &'a PythonConfig,
        excludes: &'a ExcludeSet,
    ) -> Self {
        Self {
            dir,
            rel,
            config,
            excludes,
            visible: None,
            closed: Vec::new(),
        }
    }

    /// Limits the walk to the absolute paths in `visible`.
    #[must_use]
    pub fn restrict_to(mut self, visible: Option<&'a BTreeSet<PathBuf>>) -> Self {
        self.visible = visible;
        self
    }

    /// Walks the immediate subdirectory `subdir` depth-first and adds every
    /// qualifying file to `out` with a package-relative path.
    ///
    /// # Errors
    ///
    /// Any walk failure aborts the whole walk; nothing collected so far
    /// should be used by the caller.
    pub fn walk(&mut self, subdir: &str, out: &mut Classification) -> Result<(), WalkError> {
        let root = self.dir.join(subdir);
        let mut entries = WalkDir::new(&root).sort_by_file_name().into_iter();

        while let Some(entry) = entries.next() {
            let entry = entry.map_err(|source| WalkError::Walk {
                path: root.clone(),
                source,
            })?;
            let path = entry.path();

            if self.closed.iter().any(|boundary| path.starts_with(boundary)) {
                continue;
            }
            if self.visible.is_some_and(|visible| !visible.contains(path)) {
                if entry.file_type().is_dir() {
                    entries.skip_current_dir();
                }
                continue;
            }

            if entry.file_type().is_dir() {
                if self.config.per_file_generation() {
                    entries.skip_current_dir();
                    continue;
                }
                if is_package(path, self.config.build_file_names()) {
                    debug!("Closing package boundary {}", path.display());
                    self.closed.push(path.to_path_buf());
                    entries.skip_current_dir();
                    continue;
                }
                if !self.config.coarse_grained_generation() && has_entrypoint_file(path) {
                    debug!("Skipping {}: has its own entrypoint", path.display());
                    entries.skip_current_dir();
                }
                continue;
            }

            self.visit_file(path, out);
        }

        Ok(())
    }

    fn visit_file(&self, path: &Path, out: &mut Classification) {
        let Ok(relative) = path.strip_prefix(self.dir) else {
            return;
        };
        let src = to_slash(relative);
        if !is_source_file(&src) {
            return;
        }
        if !self.config.coarse_grained_generation() && is_entrypoint_file(&src) {
            return;
        }

        let repo_path = join_rel(self.rel, &src);
        if let Some(pattern) = self.excludes.matching(&repo_path) {
            debug!("Excluding {repo_path} (matches `{pattern}`)");
            return;
        }

        out.add_walked(src);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GenerationMode;
    use std::fs;
    use tempfile::TempDir;

    fn touch(root: &Path, rel: &str) {
        let path = root.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create dirs");
        }
        fs::write(path, "").expect("write file");
    }

    fn walk_all(root: &Path, rel: &str, config: &PythonConfig, subdirs: &[&str]) -> Classification {
        let excludes = compile_excludes(config).expect("valid patterns");
        let mut walker = SubdirWalker::new(root, rel, config, &excludes);
        let mut out = Classification::default();
        for subdir in subdirs {
            walker.walk(subdir, &mut out).expect("walk succeeds");
        }
        out
    }

    #[test]
    fn collects_plain_subdirectories() {
        let tmp = TempDir::new().expect("tempdir");
        touch(tmp.path(), "sub/a.py");
        touch(tmp.path(), "sub/deeper/b_test.py");
        touch(tmp.path(), "sub/notes.txt");

        let out = walk_all(tmp.path(), "pkg", &PythonConfig::default(), &["sub"]);

        assert_eq!(
            out.library_sources.iter().collect::<Vec<_>>(),
            ["sub/a.py"]
        );
        assert_eq!(
            out.test_sources.iter().collect::<Vec<_>>(),
            ["sub/deeper/b_test.py"]
        );
    }

    #[test]
    fn never_crosses_a_package_boundary() {
        let tmp = TempDir::new().expect("tempdir");
        touch(tmp.path(), "sub/a.py");
        touch(tmp.path(), "sub/inner/BUILD");
        touch(tmp.path(), "sub/inner/hidden.py");
        touch(tmp.path(), "sub/inner/deep/hidden_test.py");
        touch(tmp.path(), "sub/zz/c.py");

        let cfg = PythonConfig::default().with_generation_mode(GenerationMode::Project);
        let excludes = compile_excludes(&cfg).expect("valid patterns");
        let mut walker = SubdirWalker::new(tmp.path(), "", &cfg, &excludes);
        let mut out = Classification::default();
        walker.walk("sub", &mut out).expect("walk succeeds");

        assert!(out.library_sources.contains("sub/a.py"));
        assert!(out.library_sources.contains("sub/zz/c.py"));
        assert!(out
            .library_sources
            .iter()
            .chain(out.test_sources.iter())
            .all(|src| !src.starts_with("sub/inner/")));
        assert_eq!(walker.closed.len(), 1);
    }

    #[test]
    fn boundary_check_is_component_wise() {
        let tmp = TempDir::new().expect("tempdir");
        touch(tmp.path(), "sub/lib/BUILD.bazel");
        touch(tmp.path(), "sub/libx/kept.py");

        let cfg = PythonConfig::default().with_generation_mode(GenerationMode::Project);
        let out = walk_all(tmp.path(), "", &cfg, &["sub"]);

        assert!(out.library_sources.contains("sub/libx/kept.py"));
    }

    #[test]
    fn entrypoint_directories_are_skipped_outside_project_mode() {
        let tmp = TempDir::new().expect("tempdir");
        touch(tmp.path(), "sub/own/__init__.py");
        touch(tmp.path(), "sub/own/x.py");
        touch(tmp.path(), "sub/y.py");

        let out = walk_all(tmp.path(), "", &PythonConfig::default(), &["sub"]);
        assert_eq!(
            out.library_sources.iter().collect::<Vec<_>>(),
            ["sub/y.py"]
        );

        let cfg = PythonConfig::default().with_generation_mode(GenerationMode::Project);
        let out = walk_all(tmp.path(), "", &cfg, &["sub"]);
        assert!(out.library_sources.contains("sub/own/__init__.py"));
        assert!(out.library_sources.contains("sub/own/x.py"));
    }

    #[test]
    fn per_file_mode_never_descends() {
        let tmp = TempDir::new().expect("tempdir");
        touch(tmp.path(), "sub/a.py");

        let cfg = PythonConfig::default().with_generation_mode(GenerationMode::File);
        let out = walk_all(tmp.path(), "", &cfg, &["sub"]);
        assert!(out.library_sources.is_empty());
    }

    #[test]
    fn exclude_patterns_use_repository_paths() {
        let tmp = TempDir::new().expect("tempdir");
        touch(tmp.path(), "sub/gen/out.py");
        touch(tmp.path(), "sub/keep.py");

        let cfg = PythonConfig::default().with_exclude("pkg/**/gen/**");
        let out = walk_all(tmp.path(), "pkg", &cfg, &["sub"]);
        assert_eq!(
            out.library_sources.iter().collect::<Vec<_>>(),
            ["sub/keep.py"]
        );
    }

    #[test]
    fn entries_outside_the_visible_set_are_not_walked() {
        let tmp = TempDir::new().expect("tempdir");
        touch(tmp.path(), "sub/a.py");
        touch(tmp.path(), "sub/stale.py");
        touch(tmp.path(), "sub/gen/x.py");
        let visible: BTreeSet<PathBuf> = ["sub", "sub/a.py"]
            .iter()
            .map(|rel| tmp.path().join(rel))
            .collect();

        let cfg = PythonConfig::default();
        let excludes = compile_excludes(&cfg).expect("valid patterns");
        let mut walker =
            SubdirWalker::new(tmp.path(), "pkg", &cfg, &excludes).restrict_to(Some(&visible));
        let mut out = Classification::default();
        walker.walk("sub", &mut out).expect("walk succeeds");

        assert_eq!(
            out.library_sources.iter().collect::<Vec<_>>(),
            ["sub/a.py"]
        );
    }

    #[test]
    fn malformed_pattern_is_a_walk_error() {
        let cfg = PythonConfig::default().with_exclude("[oops");
        assert!(matches!(
            compile_excludes(&cfg),
            Err(WalkError::Pattern { .. })
        ));
    }

    #[test]
    fn missing_subdirectory_is_a_walk_error() {
        let tmp = TempDir::new().expect("tempdir");
        let cfg = PythonConfig::default();
        let excludes = compile_excludes(&cfg).expect("valid patterns");
        let mut walker = SubdirWalker::new(tmp.path(), "", &cfg, &excludes);
        let mut out = Classification::default();
        assert!(matches!(
            walker.walk("absent", &mut out),
            Err(WalkError::Walk { .. })
        ));
    }
}
