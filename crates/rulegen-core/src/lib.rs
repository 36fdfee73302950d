//! # rulegen-core
//!
//! Core engine for synthesizing Python build declarations from a source tree.
//!
//! For one directory at a time the engine:
//!
//! - classifies source files by conventional names ([`classify_files`])
//! - walks subdirectories without crossing package boundaries ([`SubdirWalker`])
//! - builds library, binary, fixture and test declarations ([`TargetBuilder`])
//! - reports every name collision with existing declarations ([`CollisionError`])
//!
//! Parsing is delegated to a [`DependencyResolver`].
//!
//! ## Example
//!
//! ```ignore
//! use rulegen_core::{generate_rules, GenerateArgs, PythonConfig};
//!
//! let config = PythonConfig::default();
//! let args = GenerateArgs {
//!     repo_root: root,
//!     dir: &root.join("pkg"),
//!     rel: "pkg",
//!     config: &config,
//!     parent: None,
//!     regular_files: &files,
//!     subdirs: &subdirs,
//!     existing: None,
//!     visible: None,
//! };
//! let result = generate_rules(&args, &resolver)?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod classify;
mod collision;
mod config;
mod existing;
mod generate;
mod manifest;
mod resolver;
mod target;
mod types;
mod walker;

/// Path and pattern helpers.
pub mod utils;

pub use classify::{classify_files, Classification, FileRole};
pub use collision::{CollisionDetector, CollisionError};
pub use config::{
    Config, ConfigError, Configs, GenerationMode, PythonConfig, Settings,
    BINARY_NAMING_CONVENTION, LIBRARY_NAMING_CONVENTION, PACKAGE_NAME_PLACEHOLDER,
    TEST_NAMING_CONVENTION,
};
pub use existing::{DeclarationReader, ExistingError, ExistingFile, ExistingRule};
pub use generate::{generate_rules, GenerateArgs, GenerateError};
pub use manifest::{Manifest, ManifestBody, ManifestError};
pub use resolver::{DependencyResolver, PackageContext, Resolution, ResolveError};
pub use target::TargetBuilder;
pub use types::{Declaration, GenerateResult, Module, RuleKind, TargetLabel};
pub use walker::{compile_excludes, is_package, SubdirWalker, WalkError};
