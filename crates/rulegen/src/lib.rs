//! # rulegen
//!
//! Generates Bazel `py_library`, `py_binary` and `py_test` declarations
//! from the Python sources of a repository.
//!
//! This is the facade crate: it re-exports the core engine and the
//! Tree-sitter collaborators, and adds the repository-wide [`Runner`].
//!
//! ## Programmatic Usage
//!
//! ```rust,ignore
//! use rulegen::{Config, Configs, Runner};
//!
//! let config = Config::from_file("rulegen.toml".as_ref())?;
//! let report = Runner::python(".", Configs::new(config)).run()?;
//! for package in &report.packages {
//!     println!("//{}: {} targets", package.rel, package.result.len());
//! }
//! ```

#![forbid(unsafe_code)]

// Re-export core types and traits
pub use rulegen_core::*;

/// Tree-sitter based extraction and existing build file reading.
pub mod ts {
    pub use rulegen_ts::*;
}

pub use rulegen_ts::{BuildFileReader, PythonExtractor, TreeSitterResolver};

mod runner;

pub use runner::{find_repo_root, PackageOutput, RunError, RunReport, Runner, CONFIG_CANDIDATES};
