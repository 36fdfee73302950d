//! Python language extractor using Tree-sitter.

use tree_sitter::{Language, Node, Parser, Tree};

use crate::extractor::{ExtractError, FileAnalysis, ImportInfo, LanguageExtractor};

const MAIN_GUARD_NAME: &str = "__name__";
const MAIN_GUARD_VALUE: &str = "__main__";

/// Extracts imports and the main guard from Python source.
pub struct PythonExtractor {
    language: Language,
}

impl PythonExtractor {
    /// Creates a new Python extractor.
    #[must_use]
    pub fn new() -> Self {
        Self {
            language: tree_sitter_python::LANGUAGE.into(),
        }
    }

    /// Parses `source` into a syntax tree, rejecting sources with errors.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractError::Syntax`] with the line of the first error node.
    pub fn parse(&self, source: &str) -> Result<Tree, ExtractError> {
        let mut parser = Parser::new();
        parser
            .set_language(&self.language)
            .map_err(|e| ExtractError::Language(e.to_string()))?;

        let tree = parser.parse(source, None).ok_or(ExtractError::NoTree)?;
        let root = tree.root_node();
        if root.has_error() {
            let line = first_error(root).map_or(1, |n| n.start_position().row + 1);
            return Err(ExtractError::Syntax { line });
        }
        Ok(tree)
    }

    fn collect_imports(node: Node<'_>, src: &[u8], out: &mut Vec<ImportInfo>) {
        match node.kind() {
            "import_statement" => Self::extract_import(node, src, out),
            "import_from_statement" => Self::extract_from_import(node, src, out),
            _ => {
                let mut cursor = node.walk();
                for child in node.named_children(&mut cursor) {
                    Self::collect_imports(child, src, out);
                }
            }
        }
    }

    /// `import a.b, c as d`
    fn extract_import(node: Node<'_>, src: &[u8], out: &mut Vec<ImportInfo>) {
        let mut cursor = node.walk();
        for name in node.children_by_field_name("name", &mut cursor) {
            let Some(dotted) = imported_name(name) else {
                continue;
            };
            out.push(ImportInfo {
                line: node.start_position().row + 1,
                column: node.start_position().column,
                name: dotted_text(dotted, src),
                from: String::new(),
                level: 0,
            });
        }
    }

    /// `from a.b import c`, `from ..x import y`, `from a import *`
    fn extract_from_import(node: Node<'_>, src: &[u8], out: &mut Vec<ImportInfo>) {
        let Some(module) = node.child_by_field_name("module_name") else {
            return;
        };
        let (from, level) = match module.kind() {
            "relative_import" => relative_parts(module, src),
            _ => (dotted_text(module, src), 0),
        };
        let line = node.start_position().row + 1;
        let column = node.start_position().column;

        let mut cursor = node.walk();
        let names: Vec<String> = node
            .children_by_field_name("name", &mut cursor)
            .filter_map(imported_name)
            .map(|n| dotted_text(n, src))
            .collect();

        if names.is_empty() {
            out.push(ImportInfo {
                line,
                column,
                name: from.clone(),
                from,
                level,
            });
            return;
        }

        for name in names {
            let full = if from.is_empty() {
                name
            } else {
                format!("{from}.{name}")
            };
            out.push(ImportInfo {
                line,
                column,
                name: full,
                from: from.clone(),
                level,
            });
        }
    }

    /// A top-level `if __name__ == "__main__":`, in either operand order.
    fn has_main_guard(root: Node<'_>, src: &[u8]) -> bool {
        let mut cursor = root.walk();
        for node in root.named_children(&mut cursor) {
            if node.kind() != "if_statement" {
                continue;
            }
            if let Some(cond) = node.child_by_field_name("condition") {
                if is_main_comparison(cond, src) {
                    return true;
                }
            }
        }
        false
    }
}

impl Default for PythonExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl LanguageExtractor for PythonExtractor {
    fn language_id(&self) -> &'static str {
        "python"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &[".py"]
    }

    fn analyze(&self, source: &str) -> Result<FileAnalysis, ExtractError> {
        let tree = self.parse(source)?;
        let root = tree.root_node();
        let src = source.as_bytes();

        let mut imports = Vec::new();
        Self::collect_imports(root, src, &mut imports);

        Ok(FileAnalysis {
            imports,
            is_main: Self::has_main_guard(root, src),
        })
    }
}

fn text<'a>(node: Node<'_>, src: &'a [u8]) -> &'a str {
    node.utf8_text(src).unwrap_or("")
}

fn dotted_text(node: Node<'_>, src: &[u8]) -> String {
    text(node, src).split_whitespace().collect()
}

/// The dotted name of an import list entry, looking through `as` aliases.
fn imported_name(node: Node<'_>) -> Option<Node<'_>> {
    match node.kind() {
        "dotted_name" => Some(node),
        "aliased_import" => node.child_by_field_name("name"),
        _ => None,
    }
}

fn relative_parts(node: Node<'_>, src: &[u8]) -> (String, usize) {
    let mut level = 0;
    let mut module = String::new();
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        match child.kind() {
            "import_prefix" => level = text(child, src).matches('.').count(),
            "dotted_name" => module = dotted_text(child, src),
            _ => {}
        }
    }
    (module, level)
}

fn is_main_comparison(cond: Node<'_>, src: &[u8]) -> bool {
    if cond.kind() != "comparison_operator" {
        return false;
    }
    let mut cursor = cond.walk();
    let children: Vec<Node<'_>> = cond.children(&mut cursor).collect();
    if children.len() != 3 || text(children[1], src) != "==" {
        return false;
    }

    let is_name = |n: Node<'_>| n.kind() == "identifier" && text(n, src) == MAIN_GUARD_NAME;
    let is_value = |n: Node<'_>| {
        n.kind() == "string" && text(n, src).trim_matches(|c| c == '"' || c == '\'') == MAIN_GUARD_VALUE
    };

    (is_name(children[0]) && is_value(children[2])) || (is_value(children[0]) && is_name(children[2]))
}

fn first_error(node: Node<'_>) -> Option<Node<'_>> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    let mut cursor = node.walk();
    let children: Vec<Node<'_>> = node.children(&mut cursor).collect();
    children
        .into_iter()
        .filter(|child| child.has_error())
        .find_map(first_error)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn analyze(src: &str) -> FileAnalysis {
        PythonExtractor::new().analyze(src).expect("parses")
    }

    fn names(a: &FileAnalysis) -> Vec<&str> {
        a.imports.iter().map(|i| i.name.as_str()).collect()
    }

    #[test]
    fn extracts_plain_imports() {
        let a = analyze("import os\nimport a.b, c as d\n");
        assert_eq!(names(&a), ["os", "a.b", "c"]);
        assert_eq!(a.imports[1].line, 2);
        assert!(a.imports.iter().all(|i| i.from.is_empty() && i.level == 0));
    }

    #[test]
    fn extracts_from_imports() {
        let a = analyze("from a.b import c, d as e\n");
        assert_eq!(names(&a), ["a.b.c", "a.b.d"]);
        assert!(a.imports.iter().all(|i| i.from == "a.b"));
    }

    #[test]
    fn extracts_relative_imports() {
        let a = analyze("from ..util import helper\nfrom . import sibling\n");
        assert_eq!(a.imports[0].name, "util.helper");
        assert_eq!(a.imports[0].from, "util");
        assert_eq!(a.imports[0].level, 2);
        assert_eq!(a.imports[1].name, "sibling");
        assert_eq!(a.imports[1].from, "");
        assert_eq!(a.imports[1].level, 1);
    }

    #[test]
    fn wildcard_imports_keep_the_module() {
        let a = analyze("from pkg.mod import *\n");
        assert_eq!(names(&a), ["pkg.mod"]);
        assert_eq!(a.imports[0].from, "pkg.mod");
    }

    #[test]
    fn nested_imports_are_found() {
        let a = analyze("def f():\n    import json\n\ntry:\n    import yaml\nexcept ImportError:\n    pass\n");
        assert_eq!(names(&a), ["json", "yaml"]);
        assert_eq!(a.imports[1].line, 5);
    }

    #[test]
    fn detects_main_guard() {
        assert!(analyze("if __name__ == \"__main__\":\n    main()\n").is_main);
        assert!(analyze("if '__main__' == __name__:\n    main()\n").is_main);
        assert!(!analyze("def f():\n    if __name__ == '__main__':\n        pass\n").is_main);
        assert!(!analyze("if __name__ != '__main__':\n    pass\n").is_main);
        assert!(!analyze("x = 1\n").is_main);
    }

    #[test]
    fn syntax_errors_are_reported() {
        let err = PythonExtractor::new()
            .analyze("import os\ndef broken(:\n")
            .unwrap_err();
        assert!(matches!(err, ExtractError::Syntax { .. }));
    }

    #[test]
    fn empty_source() {
        let a = analyze("");
        assert!(a.imports.is_empty());
        assert!(!a.is_main);
    }
}
