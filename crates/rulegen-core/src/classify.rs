//! File classification by conventional filenames.
//!
//! Every Python file of a directory gets exactly one [`FileRole`]. The
//! conventional names are fixed:
//!
//! | file | role |
//! |---|---|
//! | `__init__.py` | library entrypoint |
//! | `__main__.py` | binary entrypoint |
//! | `__test__.py` | test entrypoint |
//! | `conftest.py` | fixture |
//! | `*_test.py`, `test_*` | test source |
//! | anything else | library source |

use std::collections::BTreeSet;
use std::path::Path;

use crate::utils::paths::{base_name, PY_SUFFIX};

/// Library entrypoint filename.
pub const LIBRARY_ENTRYPOINT_FILENAME: &str = "__init__.py";
/// Binary entrypoint filename.
pub const BINARY_ENTRYPOINT_FILENAME: &str = "__main__.py";
/// Test entrypoint filename.
pub const TEST_ENTRYPOINT_FILENAME: &str = "__test__.py";
/// Name of an existing target acting as test entrypoint.
pub const TEST_ENTRYPOINT_TARGET_NAME: &str = "__test__";
/// Fixture filename.
pub const FIXTURE_FILENAME: &str = "conftest.py";
/// Name of the generated fixture target.
pub const FIXTURE_TARGET_NAME: &str = "conftest";

const ENTRYPOINT_FILENAMES: [&str; 3] = [
    LIBRARY_ENTRYPOINT_FILENAME,
    BINARY_ENTRYPOINT_FILENAME,
    TEST_ENTRYPOINT_FILENAME,
];

/// Role of a source file, derived from its filename.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileRole {
    /// `__init__.py`
    LibraryEntry,
    /// `__main__.py`
    BinaryEntry,
    /// `__test__.py`
    TestEntry,
    /// `conftest.py`
    Fixture,
    /// A test source by naming convention.
    Test,
    /// Any other source.
    Library,
}

impl FileRole {
    /// Derives the role of a file from its basename.
    #[must_use]
    pub fn of(path: &str) -> Self {
        match base_name(path) {
            LIBRARY_ENTRYPOINT_FILENAME => Self::LibraryEntry,
            BINARY_ENTRYPOINT_FILENAME => Self::BinaryEntry,
            TEST_ENTRYPOINT_FILENAME => Self::TestEntry,
            FIXTURE_FILENAME => Self::Fixture,
            name if is_test_file(name) => Self::Test,
            _ => Self::Library,
        }
    }
}

/// A package-relative source path with its role.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct SourceFile {
    path: String,
    role: FileRole,
}

impl SourceFile {
    /// Creates a source file, computing its role once.
    #[must_use]
    pub fn new(path: impl Into<String>) -> Self {
        let path = path.into();
        let role = FileRole::of(&path);
        Self { path, role }
    }

    /// The derived role.
    #[must_use]
    pub fn role(&self) -> FileRole {
        self.role
    }
}

/// Checks the test naming convention on a basename.
#[must_use]
pub fn is_test_file(name: &str) -> bool {
    name.ends_with("_test.py") || name.starts_with("test_")
}

/// Checks the Python source suffix.
#[must_use]
pub fn is_source_file(path: &str) -> bool {
    path.ends_with(PY_SUFFIX)
}

/// Whether the basename of `path` is one of the entrypoint filenames.
#[must_use]
pub fn is_entrypoint_file(path: &str) -> bool {
    ENTRYPOINT_FILENAMES.contains(&base_name(path))
}

/// Whether `dir` contains any entrypoint file.
#[must_use]
pub fn has_entrypoint_file(dir: &Path) -> bool {
    ENTRYPOINT_FILENAMES
        .iter()
        .any(|name| dir.join(name).exists())
}

/// Source sets of one generation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Classification {
    /// Library sources, package-relative.
    pub library_sources: BTreeSet<String>,
    /// Test sources, package-relative.
    pub test_sources: BTreeSet<String>,
    /// Every Python file of the package directory itself.
    pub all_sources: BTreeSet<String>,
    /// A `__main__.py` was found.
    pub has_binary_entry: bool,
    /// A `__test__.py` was found.
    pub has_test_entry: bool,
    /// A `conftest.py` was found.
    pub has_fixture: bool,
}

impl Classification {
    /// Adds a file found below a subdirectory.
    ///
    /// Only the test naming convention decides here; entrypoint and fixture
    /// flags belong to the package directory's own files.
    pub fn add_walked(&mut self, src: String) {
        if is_test_file(base_name(&src)) {
            self.test_sources.insert(src);
        } else {
            self.library_sources.insert(src);
        }
    }
}

/// Classifies the regular files of a package directory.
///
/// Files rejected by `ignored` and files without the Python suffix are
/// skipped. Only the first binary and test entrypoint are honored; a later
/// file with the same conventional name falls through to the other rules.
pub fn classify_files<I, S, F>(files: I, ignored: F) -> Classification
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
    F: Fn(&str) -> bool,
{
    let mut out = Classification::default();

    for file in files {
        let file = file.as_ref();
        if ignored(base_name(file)) || !is_source_file(file) {
            continue;
        }
        out.all_sources.insert(file.to_string());

        let source = SourceFile::new(file);
        match source.role() {
            FileRole::BinaryEntry if !out.has_binary_entry => out.has_binary_entry = true,
            FileRole::TestEntry if !out.has_test_entry => out.has_test_entry = true,
            FileRole::Fixture => out.has_fixture = true,
            FileRole::Test => {
                out.test_sources.insert(source.path);
            }
            _ => {
                out.library_sources.insert(source.path);
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roles_from_names() {
        assert_eq!(FileRole::of("__init__.py"), FileRole::LibraryEntry);
        assert_eq!(FileRole::of("__main__.py"), FileRole::BinaryEntry);
        assert_eq!(FileRole::of("__test__.py"), FileRole::TestEntry);
        assert_eq!(FileRole::of("conftest.py"), FileRole::Fixture);
        assert_eq!(FileRole::of("foo_test.py"), FileRole::Test);
        assert_eq!(FileRole::of("sub/test_bar.py"), FileRole::Test);
        assert_eq!(FileRole::of("helper.py"), FileRole::Library);
        assert_eq!(SourceFile::new("a/b.py").role(), FileRole::Library);
    }

    #[test]
    fn classifies_package_files() {
        let files = [
            "__init__.py",
            "__main__.py",
            "__test__.py",
            "conftest.py",
            "a.py",
            "a_test.py",
            "test_b.py",
            "README.md",
        ];
        let c = classify_files(files, |_| false);

        assert!(c.has_binary_entry);
        assert!(c.has_test_entry);
        assert!(c.has_fixture);
        assert_eq!(
            c.library_sources.iter().collect::<Vec<_>>(),
            ["__init__.py", "a.py"]
        );
        assert_eq!(
            c.test_sources.iter().collect::<Vec<_>>(),
            ["a_test.py", "test_b.py"]
        );
        assert_eq!(c.all_sources.len(), 7);
    }

    #[test]
    fn ignored_files_are_skipped() {
        let c = classify_files(["a.py", "setup.py"], |name| name == "setup.py");
        assert_eq!(c.library_sources.len(), 1);
        assert!(!c.all_sources.contains("setup.py"));
    }

    #[test]
    fn second_binary_entry_falls_through() {
        let c = classify_files(["__main__.py", "__main__.py"], |_| false);
        assert!(c.has_binary_entry);
        assert!(c.library_sources.contains("__main__.py"));
    }

    #[test]
    fn walked_files_split_on_test_convention() {
        let mut c = Classification::default();
        c.add_walked("sub/x.py".to_string());
        c.add_walked("sub/x_test.py".to_string());
        c.add_walked("sub/__init__.py".to_string());

        assert!(c.library_sources.contains("sub/x.py"));
        assert!(c.library_sources.contains("sub/__init__.py"));
        assert!(c.test_sources.contains("sub/x_test.py"));
        assert!(c.all_sources.is_empty());
    }

    #[test]
    fn entrypoint_names() {
        assert!(is_entrypoint_file("a/__init__.py"));
        assert!(is_entrypoint_file("__test__.py"));
        assert!(!is_entrypoint_file("conftest.py"));
    }
}
