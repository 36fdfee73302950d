//! Step-wise construction of one declaration.

use std::collections::BTreeSet;

use indexmap::IndexMap;

use crate::types::{Declaration, Module, RuleKind};
use crate::utils::paths::{base_name, module_from_src, relative_path, PY_SUFFIX};

/// Consuming builder for a [`Declaration`].
///
/// Every step takes the builder by value and returns it, so a draft can only
/// be finalized once and never observed half-configured.
///
/// # Example
///
/// ```ignore
/// let decl = TargetBuilder::new(RuleKind::Library, "pkg", "", "pkg", &siblings)
///     .add_srcs(["a.py", "b.py"])
///     .add_visibility("//:__subpackages__")
///     .generate_imports_attribute()
///     .build();
/// ```
#[derive(Debug, Clone)]
#[must_use]
pub struct TargetBuilder {
    kind: RuleKind,
    name: String,
    project_root: String,
    package: String,
    siblings: BTreeSet<String>,
    srcs: BTreeSet<String>,
    deps: IndexMap<String, Module>,
    resolved_deps: BTreeSet<String>,
    visibility: BTreeSet<String>,
    main: Option<String>,
    testonly: bool,
    imports: Vec<String>,
}

impl TargetBuilder {
    /// Starts a draft.
    ///
    /// `siblings` is every Python filename of the package directory; it
    /// drives the rewriting of sibling imports into absolute module names.
    pub fn new(
        kind: RuleKind,
        name: impl Into<String>,
        project_root: impl Into<String>,
        package: impl Into<String>,
        siblings: &BTreeSet<String>,
    ) -> Self {
        Self {
            kind,
            name: name.into(),
            project_root: project_root.into(),
            package: package.into(),
            siblings: siblings.clone(),
            srcs: BTreeSet::new(),
            deps: IndexMap::new(),
            resolved_deps: BTreeSet::new(),
            visibility: BTreeSet::new(),
            main: None,
            testonly: false,
            imports: Vec::new(),
        }
    }

    /// Adds one source.
    pub fn add_src(mut self, src: impl Into<String>) -> Self {
        self.srcs.insert(src.into());
        self
    }

    /// Adds many sources.
    pub fn add_srcs<I, S>(mut self, srcs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.srcs.extend(srcs.into_iter().map(Into::into));
        self
    }

    /// Adds a module dependency; the first module with a given name wins.
    pub fn add_module_dependency(mut self, mut dep: Module) -> Self {
        let file_name = if dep.from.is_empty() {
            format!("{}{PY_SUFFIX}", dep.name)
        } else {
            format!("{}{PY_SUFFIX}", dep.from)
        };
        if self.siblings.contains(&file_name) && file_name != base_name(&dep.filepath) {
            dep.name = module_from_src(&self.project_root, &self.package, &file_name);
        }
        self.deps.entry(dep.name.clone()).or_insert(dep);
        self
    }

    /// Adds many module dependencies in order.
    pub fn add_module_dependencies<I>(self, deps: I) -> Self
    where
        I: IntoIterator<Item = Module>,
    {
        deps.into_iter()
            .fold(self, TargetBuilder::add_module_dependency)
    }

    /// Adds a dependency already expressed as a label.
    pub fn add_resolved_dependency(mut self, label: impl Into<String>) -> Self {
        self.resolved_deps.insert(label.into());
        self
    }

    /// Adds a visibility label.
    pub fn add_visibility(mut self, label: impl Into<String>) -> Self {
        self.visibility.insert(label.into());
        self
    }

    /// Designates the main file.
    pub fn set_main(mut self, main: impl Into<String>) -> Self {
        self.main = Some(main.into());
        self
    }

    /// Marks the target test-only.
    pub fn set_testonly(mut self) -> Self {
        self.testonly = true;
        self
    }

    /// Records the path from the package to the project root as `imports`.
    pub fn generate_imports_attribute(mut self) -> Self {
        if !self.project_root.is_empty() {
            let path = relative_path(&self.package, &self.project_root);
            if path != "." {
                self.imports = vec![path];
            }
        }
        self
    }

    /// Kind of the draft.
    #[must_use]
    pub fn kind(&self) -> RuleKind {
        self.kind
    }

    /// Name of the draft.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Finalizes the draft.
    #[must_use]
    pub fn build(self) -> Declaration {
        Declaration::new(
            self.kind,
            self.name,
            self.srcs.into_iter().collect(),
            self.visibility.into_iter().collect(),
            self.imports,
            self.main,
            self.testonly,
            self.deps.into_values().collect(),
            self.resolved_deps.into_iter().collect(),
        )
    }
}
