//! Core types for generated declarations and generation results.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Kind of a generated declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleKind {
    /// `py_library`
    Library,
    /// `py_binary`
    Binary,
    /// `py_test`
    Test,
}

impl RuleKind {
    /// Returns the build-system kind name emitted for this kind.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Library => "py_library",
            Self::Binary => "py_binary",
            Self::Test => "py_test",
        }
    }
}

impl fmt::Display for RuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A module dependency discovered in a source file.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Module {
    /// Dotted module name (e.g., `foo.bar.baz`).
    pub name: String,
    /// Line of the import statement (1-indexed, 0 when synthesized).
    pub line: usize,
    /// Package-relative path of the file containing the import.
    pub filepath: String,
    /// The `from` part of a `from x import y` statement, empty otherwise.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub from: String,
}

impl Module {
    /// Creates a module reference with no source location.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            line: 0,
            filepath: String::new(),
            from: String::new(),
        }
    }

    /// Sets the file and line this module was imported from.
    #[must_use]
    pub fn at(mut self, filepath: impl Into<String>, line: usize) -> Self {
        self.filepath = filepath.into();
        self.line = line;
        self
    }

    /// Sets the `from` part of the import.
    #[must_use]
    pub fn with_from(mut self, from: impl Into<String>) -> Self {
        self.from = from.into();
        self
    }
}

/// Fully-qualified identity of a target: `//package:name`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TargetLabel {
    /// Repository-relative package path (empty for the root package).
    pub package: String,
    /// Target name.
    pub name: String,
}

impl TargetLabel {
    /// Creates a new label.
    #[must_use]
    pub fn new(package: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for TargetLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "//{}:{}", self.package, self.name)
    }
}

/// A finalized build declaration.
///
/// Produced only by [`crate::TargetBuilder::build`]; there is no way to
/// mutate a declaration once it exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Declaration {
    kind: RuleKind,
    name: String,
    srcs: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    visibility: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    imports: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    main: Option<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    testonly: bool,
    deps: Vec<Module>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    resolved_deps: Vec<String>,
}

impl Declaration {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        kind: RuleKind,
        name: String,
        srcs: Vec<String>,
        visibility: Vec<String>,
        imports: Vec<String>,
        main: Option<String>,
        testonly: bool,
        deps: Vec<Module>,
        resolved_deps: Vec<String>,
    ) -> Self {
        Self {
            kind,
            name,
            srcs,
            visibility,
            imports,
            main,
            testonly,
            deps,
            resolved_deps,
        }
    }

    /// Kind of this declaration.
    #[must_use]
    pub fn kind(&self) -> RuleKind {
        self.kind
    }

    /// Target name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Source files, sorted.
    #[must_use]
    pub fn srcs(&self) -> &[String] {
        &self.srcs
    }

    /// Visibility labels, sorted.
    #[must_use]
    pub fn visibility(&self) -> &[String] {
        &self.visibility
    }

    /// The `imports` attribute (path from the package to the project root).
    #[must_use]
    pub fn imports(&self) -> &[String] {
        &self.imports
    }

    /// The designated main file, if any.
    #[must_use]
    pub fn main(&self) -> Option<&str> {
        self.main.as_deref()
    }

    /// Whether the target is test-only.
    #[must_use]
    pub fn testonly(&self) -> bool {
        self.testonly
    }

    /// Module dependencies in first-added order.
    ///
    /// This is the opaque payload handed to cross-package import resolution;
    /// it is never emitted as an attribute.
    #[must_use]
    pub fn deps(&self) -> &[Module] {
        &self.deps
    }

    /// Dependencies already expressed as labels (e.g., `:__test__`).
    #[must_use]
    pub fn resolved_deps(&self) -> &[String] {
        &self.resolved_deps
    }

    /// Returns the fully-qualified label of this declaration in `package`.
    #[must_use]
    pub fn label(&self, package: &str) -> TargetLabel {
        TargetLabel::new(package, &self.name)
    }
}

/// Declarations generated for one directory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GenerateResult {
    /// Declarations in emission order.
    pub declarations: Vec<Declaration>,
    /// Per-declaration imports payload, parallel to `declarations`.
    pub imports: Vec<Vec<Module>>,
}

impl GenerateResult {
    /// Creates an empty result.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a declaration together with its imports payload.
    pub fn push(&mut self, declaration: Declaration) {
        self.imports.push(declaration.deps().to_vec());
        self.declarations.push(declaration);
    }

    /// Returns true if nothing was generated.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.declarations.is_empty()
    }

    /// Number of generated declarations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.declarations.len()
    }

    /// Finds a declaration by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Declaration> {
        self.declarations.iter().find(|d| d.name() == name)
    }

    /// Returns all declarations of a given kind.
    #[must_use]
    pub fn by_kind(&self, kind: RuleKind) -> Vec<&Declaration> {
        self.declarations
            .iter()
            .filter(|d| d.kind() == kind)
            .collect()
    }

    /// Names carried by more than one declaration, in first-seen order.
    #[must_use]
    pub fn duplicate_names(&self) -> Vec<&str> {
        let mut seen = BTreeSet::new();
        let mut duplicates = Vec::new();
        for name in self.declarations.iter().map(Declaration::name) {
            if !seen.insert(name) && !duplicates.contains(&name) {
                duplicates.push(name);
            }
        }
        duplicates
    }
}
