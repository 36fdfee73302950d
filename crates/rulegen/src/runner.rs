//! Repository-wide generation.
//!
//! The [`Runner`] visits every directory of a repository, children before
//! parents, and hands each one to [`generate_rules`]. Per-directory walk
//! failures are logged and leave that directory empty; a resolver failure
//! stops the run; collisions are gathered from every directory and reported
//! together, in which case no declarations are returned at all.

use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use rulegen_core::utils::paths::to_slash;
use rulegen_core::{
    compile_excludes, generate_rules, CollisionError, Configs, DeclarationReader,
    DependencyResolver, GenerateArgs, GenerateError, GenerateResult, ResolveError,
};
use rulegen_ts::{BuildFileReader, TreeSitterResolver};
use tracing::{debug, error, info, warn};

/// Configuration file names looked up at the repository root, in order.
pub const CONFIG_CANDIDATES: &[&str] = &["rulegen.toml", ".rulegen.toml"];

/// Files marking the root of a Bazel workspace.
const REPO_MARKERS: &[&str] = &["MODULE.bazel", "WORKSPACE", "WORKSPACE.bazel"];

/// Prefix of the convenience symlinks Bazel creates at the workspace root.
const OUTPUT_DIR_PREFIX: &str = "bazel-";

/// Declarations generated for one directory.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct PackageOutput {
    /// Repository-relative directory (`""` for the root).
    pub rel: String,
    /// What the directory produced.
    pub result: GenerateResult,
}

/// Outcome of a successful run.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct RunReport {
    /// Directories that produced declarations, ordered by `rel`.
    pub packages: Vec<PackageOutput>,
    /// Number of directories visited.
    pub visited: usize,
}

impl RunReport {
    /// Output of the directory `rel`, if it produced anything.
    #[must_use]
    pub fn package(&self, rel: &str) -> Option<&PackageOutput> {
        self.packages.iter().find(|p| p.rel == rel)
    }

    /// Total number of declarations across all packages.
    #[must_use]
    pub fn declaration_count(&self) -> usize {
        self.packages.iter().map(|p| p.result.len()).sum()
    }
}

/// Why a run failed.
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    /// Dependency resolution failed; nothing was generated.
    #[error("dependency resolution failed in //{rel}: {source}")]
    Resolve {
        /// Directory being generated.
        rel: String,
        /// Underlying resolver error.
        #[source]
        source: ResolveError,
    },

    /// Generated names collide with existing declarations.
    #[error("{} naming collision(s)", .0.len())]
    Collisions(Vec<CollisionError>),
}

/// Runs generation over a whole repository.
pub struct Runner {
    repo_root: PathBuf,
    configs: Configs,
    resolver: Box<dyn DependencyResolver>,
    reader: Box<dyn DeclarationReader>,
}

impl Runner {
    /// Creates a runner reading existing build files with [`BuildFileReader`].
    #[must_use]
    pub fn new(
        repo_root: impl Into<PathBuf>,
        configs: Configs,
        resolver: impl DependencyResolver + 'static,
    ) -> Self {
        Self {
            repo_root: repo_root.into(),
            configs,
            resolver: Box::new(resolver),
            reader: Box::new(BuildFileReader::new()),
        }
    }

    /// Creates a runner resolving dependencies with [`TreeSitterResolver`].
    #[must_use]
    pub fn python(repo_root: impl Into<PathBuf>, configs: Configs) -> Self {
        Self::new(repo_root, configs, TreeSitterResolver::new())
    }

    /// Replaces the reader of existing declarations.
    #[must_use]
    pub fn with_reader(mut self, reader: impl DeclarationReader + 'static) -> Self {
        self.reader = Box::new(reader);
        self
    }

    /// The repository being generated.
    #[must_use]
    pub fn repo_root(&self) -> &Path {
        &self.repo_root
    }

    /// Generates every directory of the repository.
    ///
    /// # Errors
    ///
    /// Returns [`RunError::Resolve`] on the first resolver failure and
    /// [`RunError::Collisions`] with every collision of the run.
    pub fn run(&self) -> Result<RunReport, RunError> {
        let Scan { dirs, visible } = self.scan();
        info!(
            "Generating {} directories under {}",
            dirs.len(),
            self.repo_root.display()
        );

        let mut report = RunReport {
            packages: Vec::new(),
            visited: dirs.len(),
        };
        let mut collisions = Vec::new();

        for rel in dirs {
            match self.generate_dir(&rel, &visible) {
                Ok(result) if result.is_empty() => {}
                Ok(result) => report.packages.push(PackageOutput { rel, result }),
                Err(GenerateError::Walk(e)) => {
                    error!("Skipping //{rel}: {e}");
                }
                Err(GenerateError::Resolve(source)) => {
                    return Err(RunError::Resolve { rel, source });
                }
                Err(GenerateError::Collisions(found)) => collisions.extend(found),
            }
        }

        if !collisions.is_empty() {
            return Err(RunError::Collisions(collisions));
        }

        report.packages.sort_by(|a, b| a.rel.cmp(&b.rel));
        info!(
            "Generated {} declarations in {} packages",
            report.declaration_count(),
            report.packages.len()
        );
        Ok(report)
    }

    fn generate_dir(
        &self,
        rel: &str,
        visible: &BTreeSet<PathBuf>,
    ) -> Result<GenerateResult, GenerateError> {
        let dir = self.repo_root.join(rel);
        let config = self.configs.for_dir(rel);
        let parent = self.configs.parent(rel);

        let (regular_files, subdirs) = match list_dir(&dir, visible) {
            Ok(listing) => listing,
            Err(e) => {
                error!("Skipping //{rel}: cannot list {}: {e}", dir.display());
                return Ok(GenerateResult::new());
            }
        };

        let existing = match self.reader.read(&dir, config.build_file_names()) {
            Ok(existing) => existing,
            Err(e) => {
                error!("Skipping //{rel}: {e}");
                return Ok(GenerateResult::new());
            }
        };

        let args = GenerateArgs {
            repo_root: &self.repo_root,
            dir: &dir,
            rel,
            config: &config,
            parent: parent.as_ref(),
            regular_files: &regular_files,
            subdirs: &subdirs,
            existing: existing.as_ref(),
            visible: Some(visible),
        };
        debug!("Generating //{rel}");
        generate_rules(&args, self.resolver.as_ref())
    }

    /// Directories to generate in post-order, plus every entry the walk
    /// did not ignore.
    fn scan(&self) -> Scan {
        let walker = ignore::WalkBuilder::new(&self.repo_root)
            .require_git(false)
            .filter_entry(|entry| !is_skipped_name(&entry.file_name().to_string_lossy()))
            .build();

        let mut dirs = Vec::new();
        let mut visible = BTreeSet::new();
        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Failed to read directory entry: {e}");
                    continue;
                }
            };
            visible.insert(entry.path().to_path_buf());
            if !entry.file_type().is_some_and(|t| t.is_dir()) {
                continue;
            }
            let rel = entry
                .path()
                .strip_prefix(&self.repo_root)
                .map(to_slash)
                .unwrap_or_default();
            dirs.push(rel);
        }

        dirs.sort_by(|a, b| post_order(a, b));
        dirs.retain(|rel| !self.is_excluded(rel));
        Scan { dirs, visible }
    }

    /// Whether `rel` or one of its ancestors matches an exclude pattern.
    fn is_excluded(&self, rel: &str) -> bool {
        let mut current = rel;
        while !current.is_empty() {
            let parent = current.rsplit_once('/').map_or("", |(parent, _)| parent);
            // A malformed pattern is reported by the directory's own pass.
            if let Ok(excludes) = compile_excludes(&self.configs.for_dir(parent)) {
                if excludes.matches(current) {
                    debug!("Skipping excluded directory //{rel}");
                    return true;
                }
            }
            current = parent;
        }
        false
    }
}

/// Finds the repository root: the nearest ancestor of `start` holding a
/// workspace marker or a configuration file, else `start` itself.
#[must_use]
pub fn find_repo_root(start: &Path) -> PathBuf {
    let mut candidate = start;
    loop {
        let marked = REPO_MARKERS
            .iter()
            .chain(CONFIG_CANDIDATES)
            .any(|name| candidate.join(name).is_file());
        if marked {
            return candidate.to_path_buf();
        }
        match candidate.parent() {
            Some(parent) => candidate = parent,
            None => return start.to_path_buf(),
        }
    }
}

fn is_skipped_name(name: &str) -> bool {
    name == ".git" || name.starts_with(OUTPUT_DIR_PREFIX)
}

/// Result of the repository walk.
struct Scan {
    dirs: Vec<String>,
    /// Absolute paths of the files and directories not ignored by
    /// `.gitignore` or `.ignore` rules.
    visible: BTreeSet<PathBuf>,
}

/// Sorted regular file names and sorted subdirectory names of `dir`,
/// limited to `visible` entries.
fn list_dir(dir: &Path, visible: &BTreeSet<PathBuf>) -> io::Result<(Vec<String>, Vec<String>)> {
    let mut files = Vec::new();
    let mut subdirs = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        let path = entry.path();
        if !visible.contains(&path) {
            continue;
        }
        if path.is_dir() {
            if !is_skipped_name(&name) && !name.starts_with('.') {
                subdirs.push(name);
            }
        } else if path.is_file() {
            files.push(name);
        }
    }
    files.sort();
    subdirs.sort();
    Ok((files, subdirs))
}

/// Orders paths so that every directory comes after all of its descendants.
fn post_order(a: &str, b: &str) -> Ordering {
    let mut left = a.split('/').filter(|p| !p.is_empty());
    let mut right = b.split('/').filter(|p| !p.is_empty());
    loop {
        match (left.next(), right.next()) {
            (Some(x), Some(y)) => match x.cmp(y) {
                Ordering::Equal => {}
                other => return other,
            },
            (Some(_), None) => return Ordering::Less,
            (None, Some(_)) => return Ordering::Greater,
            (None, None) => return Ordering::Equal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn post_order_puts_children_first() {
        let mut dirs = vec!["", "a", "a/b", "a/b/c", "ab", "b"];
        dirs.sort_by(|a, b| post_order(a, b));
        assert_eq!(dirs, ["a/b/c", "a/b", "a", "ab", "b", ""]);
    }

    #[test]
    fn list_dir_sorts_and_skips_outputs() {
        let tmp = TempDir::new().expect("tempdir");
        for dir in ["zeta", "alpha", "bazel-out", ".git"] {
            fs::create_dir(tmp.path().join(dir)).expect("mkdir");
        }
        for file in ["b.py", "a.py", "BUILD"] {
            fs::write(tmp.path().join(file), "").expect("write");
        }
        let visible = fs::read_dir(tmp.path())
            .expect("read dir")
            .map(|entry| entry.expect("entry").path())
            .collect();

        let (files, subdirs) = list_dir(tmp.path(), &visible).expect("lists");
        assert_eq!(files, ["BUILD", "a.py", "b.py"]);
        assert_eq!(subdirs, ["alpha", "zeta"]);
    }

    #[test]
    fn list_dir_drops_ignored_entries() {
        let tmp = TempDir::new().expect("tempdir");
        fs::create_dir(tmp.path().join("gen")).expect("mkdir");
        fs::write(tmp.path().join("a.py"), "").expect("write");
        fs::write(tmp.path().join("out.py"), "").expect("write");
        let visible = BTreeSet::from([tmp.path().join("a.py")]);

        let (files, subdirs) = list_dir(tmp.path(), &visible).expect("lists");
        assert_eq!(files, ["a.py"]);
        assert!(subdirs.is_empty());
    }

    #[test]
    fn scan_leaves_gitignored_entries_invisible() {
        let tmp = TempDir::new().expect("tempdir");
        fs::create_dir_all(tmp.path().join("pkg/gen")).expect("mkdir");
        fs::write(tmp.path().join(".gitignore"), "gen/\n*.log\n").expect("write");
        fs::write(tmp.path().join("pkg/a.py"), "").expect("write");
        fs::write(tmp.path().join("pkg/run.log"), "").expect("write");
        fs::write(tmp.path().join("pkg/gen/x.py"), "").expect("write");
        let runner = Runner::python(tmp.path(), Configs::default());

        let scan = runner.scan();
        assert_eq!(scan.dirs, ["pkg", ""]);
        assert!(scan.visible.contains(&tmp.path().join("pkg/a.py")));
        assert!(!scan.visible.contains(&tmp.path().join("pkg/run.log")));
        assert!(!scan.visible.contains(&tmp.path().join("pkg/gen")));
        assert!(!scan.visible.contains(&tmp.path().join("pkg/gen/x.py")));
    }

    #[test]
    fn repo_root_is_the_nearest_marked_ancestor() {
        let tmp = TempDir::new().expect("tempdir");
        fs::write(tmp.path().join("MODULE.bazel"), "").expect("write");
        let nested = tmp.path().join("a/b");
        fs::create_dir_all(&nested).expect("mkdir");

        assert_eq!(find_repo_root(&nested), tmp.path());
    }

    #[test]
    fn unmarked_start_is_its_own_root() {
        let tmp = TempDir::new().expect("tempdir");
        let nested = tmp.path().join("x");
        fs::create_dir_all(&nested).expect("mkdir");
        // Ancestors outside the tempdir may carry markers; only check the
        // marker-free case when none is found above.
        let root = find_repo_root(&nested);
        assert!(nested.starts_with(&root));
    }

    #[test]
    fn excluded_directories_are_not_visited() {
        let tmp = TempDir::new().expect("tempdir");
        for dir in ["keep", "vendor/lib", "bazel-bin"] {
            fs::create_dir_all(tmp.path().join(dir)).expect("mkdir");
        }
        let config = rulegen_core::Config::parse("[python]\nexclude = [\"vendor\"]\n")
            .expect("parses");
        let runner = Runner::python(tmp.path(), Configs::new(config));

        assert_eq!(runner.scan().dirs, ["keep", ""]);
    }
}
