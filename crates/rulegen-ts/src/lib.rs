//! # rulegen-ts
//!
//! Tree-sitter collaborators for rulegen.
//!
//! - [`LanguageExtractor`] trait for pluggable source analysis
//! - [`PythonExtractor`] for Python import and main-guard extraction
//! - [`TreeSitterResolver`], the [`rulegen_core::DependencyResolver`] built on it
//! - [`BuildFileReader`] for declarations already present in build files

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod extractor;
pub mod python;
pub mod resolver;
pub mod starlark;
pub mod stdlib;

pub use extractor::{ExtractError, FileAnalysis, ImportInfo, LanguageExtractor};
pub use python::PythonExtractor;
pub use resolver::TreeSitterResolver;
pub use starlark::BuildFileReader;
pub use stdlib::is_stdlib_module;
