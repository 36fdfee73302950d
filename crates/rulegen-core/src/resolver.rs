//! The dependency-resolver seam.
//!
//! The core never parses source files itself. A [`DependencyResolver`]
//! turns a set of package-relative files into module dependencies and
//! reports which of them are runnable main modules.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::config::PythonConfig;
use crate::types::Module;

/// Where the files handed to a resolver live.
#[derive(Debug, Clone, Copy)]
pub struct PackageContext<'a> {
    /// Repository root on disk.
    pub repo_root: &'a Path,
    /// Repository-relative package directory.
    pub rel: &'a str,
    /// Effective configuration of the package.
    pub config: &'a PythonConfig,
}

impl PackageContext<'_> {
    /// Absolute directory of the package.
    #[must_use]
    pub fn package_dir(&self) -> PathBuf {
        if self.rel.is_empty() {
            self.repo_root.to_path_buf()
        } else {
            self.repo_root.join(self.rel)
        }
    }
}

/// Output of one resolver call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolution {
    /// Deduplicated module dependencies.
    pub modules: Vec<Module>,
    /// Package-relative files detected as main modules.
    pub main_modules: Vec<String>,
}

/// Resolves module dependencies of source files.
///
/// Implementations must be deterministic for a fixed file tree.
pub trait DependencyResolver: Send + Sync {
    /// Resolves every file of `srcs` together.
    ///
    /// # Errors
    ///
    /// Any failure is fatal for the whole run; no partial result is used.
    fn resolve(
        &self,
        ctx: &PackageContext<'_>,
        srcs: &BTreeSet<String>,
    ) -> Result<Resolution, ResolveError>;

    /// Resolves a single file.
    ///
    /// # Errors
    ///
    /// Same as [`DependencyResolver::resolve`].
    fn resolve_single(
        &self,
        ctx: &PackageContext<'_>,
        src: &str,
    ) -> Result<Resolution, ResolveError> {
        self.resolve(ctx, &BTreeSet::from([src.to_string()]))
    }
}

/// Resolver failures.
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    /// A source file could not be read.
    #[error("Failed to read {path}: {source}")]
    Io {
        /// File that failed.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },

    /// A source file could not be parsed.
    #[error("Failed to parse {path}: {message}")]
    Parse {
        /// File that failed.
        path: PathBuf,
        /// Parser message.
        message: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Echo;

    impl DependencyResolver for Echo {
        fn resolve(
            &self,
            _ctx: &PackageContext<'_>,
            srcs: &BTreeSet<String>,
        ) -> Result<Resolution, ResolveError> {
            Ok(Resolution {
                modules: srcs.iter().map(Module::new).collect(),
                main_modules: Vec::new(),
            })
        }
    }

    #[test]
    fn resolve_single_wraps_one_file() {
        let config = PythonConfig::default();
        let ctx = PackageContext {
            repo_root: Path::new("/repo"),
            rel: "pkg",
            config: &config,
        };
        let res = Echo.resolve_single(&ctx, "a.py").expect("resolves");
        assert_eq!(res.modules, vec![Module::new("a.py")]);
        assert_eq!(ctx.package_dir(), Path::new("/repo/pkg"));
    }
}
