//! Configuration types for rulegen.
//!
//! A repository is configured by one TOML file. The `[python]` section holds
//! the settings of the repository root; `[dirs."<path>"]` sections override
//! them for a directory and everything below it.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use crate::types::RuleKind;
use crate::utils::paths::join_rel;

/// Placeholder replaced by the package name in naming conventions.
pub const PACKAGE_NAME_PLACEHOLDER: &str = "$package_name$";

/// Setting name of the library naming convention.
pub const LIBRARY_NAMING_CONVENTION: &str = "library_naming_convention";
/// Setting name of the binary naming convention.
pub const BINARY_NAMING_CONVENTION: &str = "binary_naming_convention";
/// Setting name of the test naming convention.
pub const TEST_NAMING_CONVENTION: &str = "test_naming_convention";

/// How many targets a directory produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GenerationMode {
    /// One target of each kind per package.
    #[default]
    Package,
    /// One target per source file.
    File,
    /// The whole subtree is aggregated into the nearest enabled ancestor.
    Project,
}

/// Top-level configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Settings for the repository root.
    #[serde(default)]
    pub python: Settings,

    /// Per-directory overrides keyed by repository-relative path.
    #[serde(default)]
    pub dirs: BTreeMap<String, Settings>,
}

impl Config {
    /// Creates a new default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::parse(&content)
    }

    /// Parses configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is invalid.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse {
            message: e.to_string(),
        })
    }

    /// Checks naming conventions and exclude patterns of every section.
    ///
    /// # Errors
    ///
    /// Returns the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let sections =
            std::iter::once(("[python]".to_string(), &self.python)).chain(
                self.dirs
                    .iter()
                    .map(|(dir, s)| (format!("[dirs.\"{dir}\"]"), s)),
            );

        for (section, settings) in sections {
            for (key, value) in [
                (LIBRARY_NAMING_CONVENTION, &settings.library_naming_convention),
                (BINARY_NAMING_CONVENTION, &settings.binary_naming_convention),
                (TEST_NAMING_CONVENTION, &settings.test_naming_convention),
            ] {
                if value.as_deref().is_some_and(|v| v.trim().is_empty()) {
                    return Err(ConfigError::Validation(format!(
                        "{section}: {key} must not be empty"
                    )));
                }
            }
            for pattern in &settings.exclude {
                if let Err(e) = glob::Pattern::new(pattern) {
                    return Err(ConfigError::Validation(format!(
                        "{section}: invalid exclude pattern `{pattern}`: {e}"
                    )));
                }
            }
        }

        Ok(())
    }
}

/// One settings section. Unset keys inherit from the enclosing directory.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    /// Whether generation runs at all.
    #[serde(default)]
    pub enabled: Option<bool>,

    /// Generation granularity.
    #[serde(default)]
    pub generation_mode: Option<GenerationMode>,

    /// In package mode, only aggregate tests when a `__test__` entrypoint exists.
    #[serde(default)]
    pub per_package_require_test_entry_point: Option<bool>,

    /// Python root directory, repository-relative.
    #[serde(default)]
    pub project_root: Option<String>,

    /// Library target naming convention.
    #[serde(default)]
    pub library_naming_convention: Option<String>,

    /// Binary target naming convention.
    #[serde(default)]
    pub binary_naming_convention: Option<String>,

    /// Test target naming convention.
    #[serde(default)]
    pub test_naming_convention: Option<String>,

    /// File basenames to ignore (accumulates).
    #[serde(default)]
    pub ignore_files: Vec<String>,

    /// Module names never reported as dependencies (accumulates).
    #[serde(default)]
    pub ignore_dependencies: Vec<String>,

    /// Glob patterns relative to the section's directory (accumulates).
    #[serde(default)]
    pub exclude: Vec<String>,

    /// Build file names marking a package boundary.
    #[serde(default)]
    pub build_file_names: Option<Vec<String>>,

    /// Extra visibility labels (accumulates).
    #[serde(default)]
    pub visibility: Vec<String>,

    /// Maps a generated kind name to the kind name used in build files.
    #[serde(default)]
    pub kind_map: BTreeMap<String, String>,
}

/// Effective configuration of one directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PythonConfig {
    enabled: bool,
    generation_mode: GenerationMode,
    require_test_entry_point: bool,
    project_root: String,
    library_naming: String,
    binary_naming: String,
    test_naming: String,
    ignore_files: BTreeSet<String>,
    ignore_dependencies: BTreeSet<String>,
    exclude: Vec<String>,
    build_file_names: Vec<String>,
    visibility: Vec<String>,
    kind_map: BTreeMap<String, String>,
}

impl Default for PythonConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            generation_mode: GenerationMode::Package,
            require_test_entry_point: true,
            project_root: String::new(),
            library_naming: PACKAGE_NAME_PLACEHOLDER.to_string(),
            binary_naming: format!("{PACKAGE_NAME_PLACEHOLDER}_bin"),
            test_naming: format!("{PACKAGE_NAME_PLACEHOLDER}_test"),
            ignore_files: BTreeSet::new(),
            ignore_dependencies: BTreeSet::new(),
            exclude: Vec::new(),
            build_file_names: vec!["BUILD".to_string(), "BUILD.bazel".to_string()],
            visibility: Vec::new(),
            kind_map: BTreeMap::new(),
        }
    }
}

impl PythonConfig {
    /// Creates the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Overlays a settings section declared for directory `rel`.
    pub fn apply(&mut self, settings: &Settings, rel: &str) {
        if let Some(enabled) = settings.enabled {
            self.enabled = enabled;
        }
        if let Some(mode) = settings.generation_mode {
            self.generation_mode = mode;
        }
        if let Some(require) = settings.per_package_require_test_entry_point {
            self.require_test_entry_point = require;
        }
        if let Some(root) = &settings.project_root {
            self.project_root = root.trim_matches('/').to_string();
        }
        if let Some(naming) = &settings.library_naming_convention {
            self.library_naming.clone_from(naming);
        }
        if let Some(naming) = &settings.binary_naming_convention {
            self.binary_naming.clone_from(naming);
        }
        if let Some(naming) = &settings.test_naming_convention {
            self.test_naming.clone_from(naming);
        }
        if let Some(names) = &settings.build_file_names {
            self.build_file_names.clone_from(names);
        }
        self.ignore_files
            .extend(settings.ignore_files.iter().cloned());
        self.ignore_dependencies
            .extend(settings.ignore_dependencies.iter().cloned());
        self.exclude
            .extend(settings.exclude.iter().map(|p| join_rel(rel, p)));
        for label in &settings.visibility {
            if !self.visibility.contains(label) {
                self.visibility.push(label.clone());
            }
        }
        self.kind_map.extend(
            settings
                .kind_map
                .iter()
                .map(|(k, v)| (k.clone(), v.clone())),
        );
    }

    /// Sets the generation mode.
    #[must_use]
    pub fn with_generation_mode(mut self, mode: GenerationMode) -> Self {
        self.generation_mode = mode;
        self
    }

    /// Sets the python project root.
    #[must_use]
    pub fn with_project_root(mut self, root: impl Into<String>) -> Self {
        self.project_root = root.into();
        self
    }

    /// Enables or disables generation.
    #[must_use]
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Sets whether package-mode test aggregation needs a `__test__` entrypoint.
    #[must_use]
    pub fn with_require_test_entry_point(mut self, require: bool) -> Self {
        self.require_test_entry_point = require;
        self
    }

    /// Adds a repository-relative exclude pattern.
    #[must_use]
    pub fn with_exclude(mut self, pattern: impl Into<String>) -> Self {
        self.exclude.push(pattern.into());
        self
    }

    /// Adds an ignored file basename.
    #[must_use]
    pub fn with_ignore_file(mut self, name: impl Into<String>) -> Self {
        self.ignore_files.insert(name.into());
        self
    }

    /// Adds an ignored dependency.
    #[must_use]
    pub fn with_ignore_dependency(mut self, module: impl Into<String>) -> Self {
        self.ignore_dependencies.insert(module.into());
        self
    }

    /// Maps a generated kind to the kind name used in build files.
    #[must_use]
    pub fn with_kind_mapping(mut self, kind: RuleKind, actual: impl Into<String>) -> Self {
        self.kind_map.insert(kind.as_str().to_string(), actual.into());
        self
    }

    /// Whether the extension is enabled for this directory.
    #[must_use]
    pub fn extension_enabled(&self) -> bool {
        self.enabled
    }

    /// The generation mode.
    #[must_use]
    pub fn generation_mode(&self) -> GenerationMode {
        self.generation_mode
    }

    /// True in per-file mode.
    #[must_use]
    pub fn per_file_generation(&self) -> bool {
        self.generation_mode == GenerationMode::File
    }

    /// True in coarse-grained (project) mode.
    #[must_use]
    pub fn coarse_grained_generation(&self) -> bool {
        self.generation_mode == GenerationMode::Project
    }

    /// Whether package-mode test aggregation needs a `__test__` entrypoint.
    #[must_use]
    pub fn per_package_require_test_entry_point(&self) -> bool {
        self.require_test_entry_point
    }

    /// Whether the file with this basename is ignored.
    #[must_use]
    pub fn ignores_file(&self, name: &str) -> bool {
        self.ignore_files.contains(name)
    }

    /// Whether this module, or any dotted prefix of it, is ignored.
    #[must_use]
    pub fn ignores_dependency(&self, module: &str) -> bool {
        if self.ignore_dependencies.contains(module) {
            return true;
        }
        module
            .match_indices('.')
            .any(|(i, _)| self.ignore_dependencies.contains(&module[..i]))
    }

    /// Repository-relative exclude patterns.
    #[must_use]
    pub fn excluded_patterns(&self) -> &[String] {
        &self.exclude
    }

    /// The python project root, repository-relative (empty for the root).
    #[must_use]
    pub fn project_root(&self) -> &str {
        &self.project_root
    }

    /// Build file names marking a package boundary.
    #[must_use]
    pub fn build_file_names(&self) -> &[String] {
        &self.build_file_names
    }

    /// Extra visibility labels.
    #[must_use]
    pub fn visibility(&self) -> &[String] {
        &self.visibility
    }

    /// Kind name a generated kind appears as in build files.
    #[must_use]
    pub fn actual_kind_name(&self, kind: RuleKind) -> &str {
        self.kind_map
            .get(kind.as_str())
            .map_or(kind.as_str(), String::as_str)
    }

    /// Renders the library target name for a package.
    #[must_use]
    pub fn render_library_name(&self, package_name: &str) -> String {
        self.library_naming
            .replace(PACKAGE_NAME_PLACEHOLDER, package_name)
    }

    /// Renders the binary target name for a package.
    #[must_use]
    pub fn render_binary_name(&self, package_name: &str) -> String {
        self.binary_naming
            .replace(PACKAGE_NAME_PLACEHOLDER, package_name)
    }

    /// Renders the test target name for a package.
    #[must_use]
    pub fn render_test_name(&self, package_name: &str) -> String {
        self.test_naming.replace(PACKAGE_NAME_PLACEHOLDER, package_name)
    }
}

/// Resolves the effective configuration of any directory.
#[derive(Debug, Clone, Default)]
pub struct Configs {
    config: Config,
}

impl Configs {
    /// Wraps a parsed configuration file.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// The underlying configuration file.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Effective configuration of `rel` (repository-relative, `""` for the root).
    ///
    /// Applies `[python]` and then every `[dirs]` section declared for `rel`
    /// or one of its ancestors, shallowest first.
    #[must_use]
    pub fn for_dir(&self, rel: &str) -> PythonConfig {
        let mut cfg = PythonConfig::default();
        cfg.apply(&self.config.python, "");

        let rel = normalize_rel(rel);
        let mut ancestors = vec![String::new()];
        let mut current = String::new();
        for part in rel.split('/').filter(|p| !p.is_empty()) {
            current = join_rel(&current, part);
            ancestors.push(current.clone());
        }

        for dir in &ancestors {
            for (key, settings) in &self.config.dirs {
                if normalize_rel(key) == *dir {
                    cfg.apply(settings, dir);
                }
            }
        }

        cfg
    }

    /// Effective configuration of the parent of `rel`, or `None` for the root.
    #[must_use]
    pub fn parent(&self, rel: &str) -> Option<PythonConfig> {
        let rel = normalize_rel(rel);
        if rel.is_empty() {
            return None;
        }
        let parent = rel.rsplit_once('/').map_or("", |(parent, _)| parent);
        Some(self.for_dir(parent))
    }
}

fn normalize_rel(rel: &str) -> String {
    let trimmed = rel.trim_matches('/');
    if trimmed == "." {
        String::new()
    } else {
        trimmed.to_string()
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// IO error reading config file.
    #[error("Failed to read config file {path}: {source}")]
    Io {
        /// Path that failed to read.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },

    /// Parse error in config file.
    #[error("Failed to parse config: {message}")]
    Parse {
        /// Parse error message.
        message: String,
    },

    /// Config is structurally invalid.
    #[error("Invalid config: {0}")]
    Validation(String),
}
