//! Declarations already present on disk.

use std::path::{Path, PathBuf};

/// One declaration found in an existing build file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExistingRule {
    /// Target name.
    pub name: String,
    /// Kind as written in the build file (e.g. `py_library`).
    pub kind: String,
}

impl ExistingRule {
    /// Creates an existing rule.
    #[must_use]
    pub fn new(name: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: kind.into(),
        }
    }
}

/// The parsed build file of one directory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExistingFile {
    /// Path of the build file.
    pub path: PathBuf,
    /// Declarations in file order.
    pub rules: Vec<ExistingRule>,
}

impl ExistingFile {
    /// Creates an empty record for `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            rules: Vec::new(),
        }
    }

    /// Adds a rule (builder style, mostly for tests).
    #[must_use]
    pub fn with_rule(mut self, name: impl Into<String>, kind: impl Into<String>) -> Self {
        self.rules.push(ExistingRule::new(name, kind));
        self
    }

    /// Whether any rule is named `name`.
    #[must_use]
    pub fn has_rule(&self, name: &str) -> bool {
        self.rule_named(name).is_some()
    }

    /// First rule named `name`.
    #[must_use]
    pub fn rule_named(&self, name: &str) -> Option<&ExistingRule> {
        self.rules.iter().find(|r| r.name == name)
    }
}

/// Loads the existing build file of a directory.
pub trait DeclarationReader: Send + Sync {
    /// Reads the first build file of `dir` named in `build_file_names`.
    ///
    /// Returns `Ok(None)` when the directory has no build file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    fn read(
        &self,
        dir: &Path,
        build_file_names: &[String],
    ) -> Result<Option<ExistingFile>, ExistingError>;
}

/// Errors reading existing declarations.
#[derive(Debug, thiserror::Error)]
pub enum ExistingError {
    /// The build file could not be read.
    #[error("Failed to read {path}: {source}")]
    Io {
        /// Build file path.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },

    /// The build file is not valid syntax.
    #[error("Failed to parse {path}: {message}")]
    Parse {
        /// Build file path.
        path: PathBuf,
        /// What went wrong.
        message: String,
    },
}
