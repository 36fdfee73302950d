//! Reading existing build files.
//!
//! Build files are Starlark, which parses with the Python grammar. Every
//! top-level call carrying a string `name = "..."` argument is a declaration;
//! the callee is its kind.

use std::fs;
use std::path::Path;

use rulegen_core::{DeclarationReader, ExistingError, ExistingFile, ExistingRule};
use tree_sitter::Node;

use crate::python::PythonExtractor;

/// Extracts declarations from `BUILD` files.
#[derive(Default)]
pub struct BuildFileReader {
    extractor: PythonExtractor,
}

impl BuildFileReader {
    /// Creates a reader.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Extracts the declarations of build file content.
    ///
    /// # Errors
    ///
    /// Returns the parser message if the content is not valid syntax.
    pub fn parse_rules(&self, content: &str) -> Result<Vec<ExistingRule>, String> {
        let tree = self.extractor.parse(content).map_err(|e| e.to_string())?;
        let root = tree.root_node();
        let src = content.as_bytes();

        let mut rules = Vec::new();
        let mut cursor = root.walk();
        for statement in root.named_children(&mut cursor) {
            if statement.kind() != "expression_statement" {
                continue;
            }
            let Some(call) = statement.named_child(0).filter(|n| n.kind() == "call") else {
                continue;
            };
            if let Some(rule) = declaration(call, src) {
                rules.push(rule);
            }
        }
        Ok(rules)
    }
}

impl DeclarationReader for BuildFileReader {
    fn read(
        &self,
        dir: &Path,
        build_file_names: &[String],
    ) -> Result<Option<ExistingFile>, ExistingError> {
        let Some(path) = build_file_names
            .iter()
            .map(|name| dir.join(name))
            .find(|path| path.is_file())
        else {
            return Ok(None);
        };

        let content = fs::read_to_string(&path).map_err(|source| ExistingError::Io {
            path: path.clone(),
            source,
        })?;
        let rules = self
            .parse_rules(&content)
            .map_err(|message| ExistingError::Parse {
                path: path.clone(),
                message,
            })?;

        Ok(Some(ExistingFile { path, rules }))
    }
}

fn declaration(call: Node<'_>, src: &[u8]) -> Option<ExistingRule> {
    let function = call.child_by_field_name("function")?;
    let kind = function.utf8_text(src).ok()?;
    let arguments = call.child_by_field_name("arguments")?;

    let mut cursor = arguments.walk();
    let name = arguments
        .named_children(&mut cursor)
        .filter(|arg| arg.kind() == "keyword_argument")
        .find(|arg| {
            arg.child_by_field_name("name")
                .and_then(|n| n.utf8_text(src).ok())
                == Some("name")
        })
        .and_then(|arg| arg.child_by_field_name("value"))
        .filter(|value| value.kind() == "string")
        .and_then(|value| value.utf8_text(src).ok())
        .map(|text| text.trim_matches(|c| c == '"' || c == '\'').to_string())?;

    Some(ExistingRule::new(name, kind))
}
