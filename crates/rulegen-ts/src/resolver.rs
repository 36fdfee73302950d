//! Dependency resolution backed by the Python extractor.

use std::collections::BTreeSet;
use std::fs;

use indexmap::IndexMap;
use rulegen_core::utils::paths::{dir_name, join_rel, strip_dir_prefix};
use rulegen_core::{DependencyResolver, Module, PackageContext, Resolution, ResolveError};
use tracing::debug;

use crate::extractor::LanguageExtractor;
use crate::python::PythonExtractor;
use crate::stdlib::is_stdlib_module;

/// Resolves imports of Python sources by parsing them with Tree-sitter.
///
/// Standard library modules and configured ignored dependencies are
/// dropped; the remaining modules are deduplicated by name, first import
/// wins, and returned sorted by name.
#[derive(Default)]
pub struct TreeSitterResolver {
    extractor: PythonExtractor,
}

impl TreeSitterResolver {
    /// Creates a resolver.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl DependencyResolver for TreeSitterResolver {
    fn resolve(
        &self,
        ctx: &PackageContext<'_>,
        srcs: &BTreeSet<String>,
    ) -> Result<Resolution, ResolveError> {
        let package_dir = ctx.package_dir();
        let mut modules: IndexMap<String, Module> = IndexMap::new();
        let mut main_modules = Vec::new();

        for src in srcs {
            let path = package_dir.join(src);
            let source = fs::read_to_string(&path).map_err(|source| ResolveError::Io {
                path: path.clone(),
                source,
            })?;
            let analysis = self
                .extractor
                .analyze(&source)
                .map_err(|e| ResolveError::Parse {
                    path: path.clone(),
                    message: e.to_string(),
                })?;

            if analysis.is_main {
                main_modules.push(src.clone());
            }

            let repo_path = join_rel(ctx.rel, src);
            let import_root = ctx.config.project_root();
            let dir = strip_dir_prefix(dir_name(&repo_path), import_root)
                .unwrap_or_else(|| dir_name(&repo_path));

            for import in analysis.imports {
                let (name, from) = import.absolute(dir);
                if name.is_empty() || is_stdlib_module(&name) {
                    continue;
                }
                if ctx.config.ignores_dependency(&name) {
                    debug!("Ignoring dependency {name} of {repo_path}");
                    continue;
                }
                modules.entry(name.clone()).or_insert_with(|| {
                    Module::new(name)
                        .at(src.as_str(), import.line)
                        .with_from(from)
                });
            }
        }

        let mut modules: Vec<Module> = modules.into_values().collect();
        modules.sort_by(|a, b| a.name.cmp(&b.name));
        main_modules.sort();

        Ok(Resolution {
            modules,
            main_modules,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rulegen_core::PythonConfig;
    use std::path::Path;
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().expect("has parent")).expect("create dirs");
        fs::write(path, content).expect("write file");
    }

    fn resolve(root: &Path, rel: &str, config: &PythonConfig, srcs: &[&str]) -> Resolution {
        let ctx = PackageContext {
            repo_root: root,
            rel,
            config,
        };
        let srcs: BTreeSet<String> = srcs.iter().map(|s| (*s).to_string()).collect();
        TreeSitterResolver::new()
            .resolve(&ctx, &srcs)
            .expect("resolves")
    }

    fn names(res: &Resolution) -> Vec<&str> {
        res.modules.iter().map(|m| m.name.as_str()).collect()
    }

    #[test]
    fn drops_stdlib_and_sorts() {
        let tmp = TempDir::new().expect("tempdir");
        write(
            tmp.path(),
            "pkg/a.py",
            "import sys\nimport requests\nfrom os import path\nimport boto3.s3\n",
        );

        let res = resolve(tmp.path(), "pkg", &PythonConfig::default(), &["a.py"]);
        assert_eq!(names(&res), ["boto3.s3", "requests"]);
        assert_eq!(res.modules[1].line, 2);
        assert_eq!(res.modules[1].filepath, "a.py");
    }

    #[test]
    fn first_import_wins_across_files() {
        let tmp = TempDir::new().expect("tempdir");
        write(tmp.path(), "pkg/a.py", "import yaml\n");
        write(tmp.path(), "pkg/b.py", "\n\nimport yaml\n");

        let res = resolve(tmp.path(), "pkg", &PythonConfig::default(), &["a.py", "b.py"]);
        assert_eq!(res.modules.len(), 1);
        assert_eq!(res.modules[0].filepath, "a.py");
    }

    #[test]
    fn ignored_dependencies_are_dropped() {
        let tmp = TempDir::new().expect("tempdir");
        write(
            tmp.path(),
            "pkg/a.py",
            "import google.protobuf.message\nimport numpy\n",
        );

        let cfg = PythonConfig::default().with_ignore_dependency("google.protobuf");
        let res = resolve(tmp.path(), "pkg", &cfg, &["a.py"]);
        assert_eq!(names(&res), ["numpy"]);
    }

    #[test]
    fn relative_imports_resolve_from_the_project_root() {
        let tmp = TempDir::new().expect("tempdir");
        write(
            tmp.path(),
            "src/p/s1/s2/x.py",
            "from ...my_library import f\nfrom .. import g\nfrom .library import m\n",
        );

        let cfg = PythonConfig::default().with_project_root("src");
        let res = resolve(tmp.path(), "src/p/s1/s2", &cfg, &["x.py"]);
        assert_eq!(
            names(&res),
            ["p.my_library.f", "p.s1.g", "p.s1.s2.library.m"]
        );
        assert_eq!(res.modules[0].from, "p.my_library");
    }

    #[test]
    fn reports_main_modules_sorted() {
        let tmp = TempDir::new().expect("tempdir");
        write(tmp.path(), "pkg/z.py", "if __name__ == '__main__':\n    pass\n");
        write(tmp.path(), "pkg/a.py", "if __name__ == '__main__':\n    pass\n");
        write(tmp.path(), "pkg/lib.py", "X = 1\n");

        let res = resolve(
            tmp.path(),
            "pkg",
            &PythonConfig::default(),
            &["lib.py", "z.py", "a.py"],
        );
        assert_eq!(res.main_modules, ["a.py", "z.py"]);
    }

    #[test]
    fn unreadable_and_unparsable_files_fail() {
        let tmp = TempDir::new().expect("tempdir");
        write(tmp.path(), "pkg/bad.py", "def (:\n");
        let cfg = PythonConfig::default();
        let ctx = PackageContext {
            repo_root: tmp.path(),
            rel: "pkg",
            config: &cfg,
        };
        let resolver = TreeSitterResolver::new();

        assert!(matches!(
            resolver.resolve_single(&ctx, "bad.py"),
            Err(ResolveError::Parse { .. })
        ));
        assert!(matches!(
            resolver.resolve_single(&ctx, "missing.py"),
            Err(ResolveError::Io { .. })
        ));
    }
}
