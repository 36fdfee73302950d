//! Language-agnostic extraction types and trait.
//!
//! `LanguageExtractor` is the extension point for parsing a source file
//! into the imports it declares and whether it is runnable on its own.

/// A single import statement extracted from source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportInfo {
    /// Line number (1-indexed).
    pub line: usize,
    /// Column (0-indexed byte offset within line).
    pub column: usize,
    /// Imported name as written, without leading dots (e.g. `a.b.c`).
    pub name: String,
    /// Module part of a `from` import as written, empty otherwise.
    pub from: String,
    /// Number of leading dots of a relative import (0 when absolute).
    pub level: usize,
}

impl ImportInfo {
    /// Resolves a relative import against the importing file's directory.
    ///
    /// `dir` is the `/`-separated directory of the importing file, relative
    /// to the import root. `n` leading dots drop `n - 1` trailing components.
    /// Returns the absolute `(name, from)` pair.
    ///
    /// # Example
    ///
    /// ```ignore
    /// // `from ..util import f` inside p/s1/x.py
    /// assert_eq!(import.absolute("p/s1"), ("p.util.f".into(), "p.util".into()));
    /// ```
    #[must_use]
    pub fn absolute(&self, dir: &str) -> (String, String) {
        if self.level == 0 {
            return (self.name.clone(), self.from.clone());
        }

        let parts: Vec<&str> = dir.split('/').filter(|p| !p.is_empty()).collect();
        let keep = parts.len().saturating_sub(self.level - 1);
        let base = parts[..keep].join(".");

        let join = |rest: &str| match (base.is_empty(), rest.is_empty()) {
            (true, _) => rest.to_string(),
            (false, true) => base.clone(),
            (false, false) => format!("{base}.{rest}"),
        };
        (join(&self.name), join(&self.from))
    }
}

/// Result of analyzing a single source file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileAnalysis {
    /// All import statements found, in source order.
    pub imports: Vec<ImportInfo>,
    /// Whether the file has a top-level main guard.
    pub is_main: bool,
}

/// Extraction failures.
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    /// The grammar could not be loaded.
    #[error("Failed to load grammar: {0}")]
    Language(String),

    /// The source does not parse.
    #[error("syntax error at line {line}")]
    Syntax {
        /// Line of the first error node (1-indexed).
        line: usize,
    },

    /// The parser gave up.
    #[error("parser produced no tree")]
    NoTree,
}

/// Trait for language-specific Tree-sitter extraction.
pub trait LanguageExtractor: Send + Sync {
    /// Language identifier (e.g., `"python"`).
    fn language_id(&self) -> &'static str;

    /// File extensions this extractor handles (e.g., `&[".py"]`).
    fn extensions(&self) -> &'static [&'static str];

    /// Extracts imports and the main-guard flag from source code.
    ///
    /// # Errors
    ///
    /// Returns an error if the source cannot be parsed.
    fn analyze(&self, source: &str) -> Result<FileAnalysis, ExtractError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn relative(name: &str, from: &str, level: usize) -> ImportInfo {
        ImportInfo {
            line: 1,
            column: 0,
            name: name.to_string(),
            from: from.to_string(),
            level,
        }
    }

    #[test]
    fn absolute_imports_are_untouched() {
        let imp = relative("a.b.c", "a.b", 0);
        assert_eq!(imp.absolute("x/y"), ("a.b.c".into(), "a.b".into()));
    }

    #[test]
    fn dots_climb_directories() {
        let dir = "p/s1/s2";
        assert_eq!(
            relative("my_library.f", "my_library", 3).absolute(dir),
            ("p.my_library.f".into(), "p.my_library".into())
        );
        assert_eq!(
            relative("f", "", 2).absolute(dir),
            ("p.s1.f".into(), "p.s1".into())
        );
        assert_eq!(
            relative("library.m", "library", 1).absolute(dir),
            ("p.s1.s2.library.m".into(), "p.s1.s2.library".into())
        );
    }

    #[test]
    fn climbing_past_the_root_clamps() {
        assert_eq!(
            relative("x", "", 5).absolute("a"),
            ("x".into(), String::new())
        );
    }
}
