//! Integration test: TOML configuration through per-directory generation.
//!
//! Builds a throwaway repository on disk, resolves each directory's
//! effective configuration from a `rulegen.toml`, and runs the generator
//! the way a hosting tree walk would.

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use rulegen_core::{
    generate_rules, Config, Configs, DependencyResolver, GenerateArgs, GenerateError,
    GenerateResult, Module, PackageContext, Resolution, ResolveError, RuleKind,
};
use tempfile::TempDir;

/// Reports one `import <stem>` per file, nothing else.
struct StemResolver;

impl DependencyResolver for StemResolver {
    fn resolve(
        &self,
        _ctx: &PackageContext<'_>,
        srcs: &BTreeSet<String>,
    ) -> Result<Resolution, ResolveError> {
        Ok(Resolution {
            modules: srcs
                .iter()
                .map(|src| Module::new(format!("ext_{}", src.replace(['/', '.'], "_"))).at(src.as_str(), 1))
                .collect(),
            main_modules: Vec::new(),
        })
    }
}

fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().expect("has parent")).expect("create dirs");
    fs::write(path, content).expect("write file");
}

fn listing(dir: &Path) -> (Vec<String>, Vec<String>) {
    let mut files = Vec::new();
    let mut dirs = Vec::new();
    for entry in fs::read_dir(dir).expect("read dir") {
        let entry = entry.expect("entry");
        let name = entry.file_name().to_string_lossy().into_owned();
        if entry.file_type().expect("file type").is_dir() {
            dirs.push(name);
        } else {
            files.push(name);
        }
    }
    files.sort();
    dirs.sort();
    (files, dirs)
}

fn generate(root: &Path, configs: &Configs, rel: &str) -> Result<GenerateResult, GenerateError> {
    let dir = root.join(rel);
    let (files, subdirs) = listing(&dir);
    let config = configs.for_dir(rel);
    let parent = configs.parent(rel);
    let args = GenerateArgs {
        repo_root: root,
        dir: &dir,
        rel,
        config: &config,
        parent: parent.as_ref(),
        regular_files: &files,
        subdirs: &subdirs,
        existing: None,
        visible: None,
    };
    generate_rules(&args, &StemResolver)
}

// ── Per-directory configuration ──

#[test]
fn directory_sections_override_generation_mode() {
    let tmp = TempDir::new().expect("tempdir");
    let root = tmp.path();
    write(root, "lib/__init__.py", "");
    write(root, "lib/a.py", "");
    write(root, "tools/__init__.py", "X = 1\n");
    write(root, "tools/fmt.py", "");
    write(root, "tools/lint.py", "");

    let configs = Configs::new(
        Config::parse(
            r#"
[dirs.tools]
generation_mode = "file"
"#,
        )
        .expect("config parses"),
    );

    let lib = generate(root, &configs, "lib").expect("lib generates");
    assert_eq!(lib.len(), 1);
    assert_eq!(lib.declarations[0].srcs(), ["__init__.py", "a.py"]);

    let tools = generate(root, &configs, "tools").expect("tools generate");
    let names: Vec<&str> = tools.declarations.iter().map(|d| d.name()).collect();
    assert_eq!(names, ["__init__", "fmt", "lint"]);
    assert!(tools
        .declarations
        .iter()
        .all(|d| d.kind() == RuleKind::Library && d.srcs().len() == 1));
}

#[test]
fn project_root_and_naming_conventions_apply() {
    let tmp = TempDir::new().expect("tempdir");
    let root = tmp.path();
    write(root, "src/app/__init__.py", "");
    write(root, "src/app/__main__.py", "");
    write(root, "src/app/__test__.py", "");
    write(root, "src/app/util.py", "");

    let configs = Configs::new(
        Config::parse(
            r#"
[python]
project_root = "src"
library_naming_convention = "py_$package_name$"
binary_naming_convention = "$package_name$_cli"
test_naming_convention = "$package_name$_tests"
visibility = ["//tests:__pkg__"]
"#,
        )
        .expect("config parses"),
    );

    let result = generate(root, &configs, "src/app").expect("generates");
    let names: Vec<(&str, RuleKind)> = result
        .declarations
        .iter()
        .map(|d| (d.name(), d.kind()))
        .collect();
    assert_eq!(
        names,
        [
            ("py_app", RuleKind::Library),
            ("app_cli", RuleKind::Binary),
            ("app_tests", RuleKind::Test),
        ]
    );

    let lib = &result.declarations[0];
    assert_eq!(lib.imports(), [".."]);
    assert_eq!(lib.visibility(), ["//src:__subpackages__", "//tests:__pkg__"]);
    assert_eq!(lib.deps()[0].name, "ext___init___py");

    let test = &result.declarations[2];
    assert!(test.visibility().is_empty());
    assert_eq!(test.main(), Some("__test__.py"));
}

#[test]
fn project_mode_collects_the_subtree_once() {
    let tmp = TempDir::new().expect("tempdir");
    let root = tmp.path();
    write(root, "mono/main.py", "");
    write(root, "mono/core/__init__.py", "");
    write(root, "mono/core/engine.py", "");
    write(root, "mono/core/engine_test.py", "");
    write(root, "mono/vendored/BUILD.bazel", "");
    write(root, "mono/vendored/third.py", "");

    let configs = Configs::new(
        Config::parse(
            r#"
[dirs.mono]
generation_mode = "project"
"#,
        )
        .expect("config parses"),
    );

    let mono = generate(root, &configs, "mono").expect("mono generates");
    assert_eq!(
        mono.get("mono").map(|d| d.srcs().to_vec()),
        Some(vec![
            "core/__init__.py".to_string(),
            "core/engine.py".to_string(),
            "main.py".to_string(),
        ])
    );
    assert_eq!(
        mono.get("mono_test").map(|d| d.srcs().to_vec()),
        Some(vec!["core/engine_test.py".to_string()])
    );

    let core = generate(root, &configs, "mono/core").expect("core generates");
    assert!(core.is_empty());

    let vendored = generate(root, &configs, "mono/vendored").expect("vendored generates");
    assert_eq!(vendored.declarations[0].srcs(), ["third.py"]);
}

#[test]
fn nested_excludes_are_relative_to_their_section() {
    let tmp = TempDir::new().expect("tempdir");
    let root = tmp.path();
    write(root, "pkg/__init__.py", "");
    write(root, "pkg/scratch/try.py", "");
    write(root, "pkg/real/impl.py", "");

    let configs = Configs::new(
        Config::parse(
            r#"
[dirs.pkg]
exclude = ["scratch/**"]
"#,
        )
        .expect("config parses"),
    );

    let result = generate(root, &configs, "pkg").expect("generates");
    assert_eq!(
        result.declarations[0].srcs(),
        ["__init__.py", "real/impl.py"]
    );
}

#[test]
fn malformed_exclude_aborts_the_directory() {
    let tmp = TempDir::new().expect("tempdir");
    let root = tmp.path();
    write(root, "pkg/__init__.py", "");

    let configs = Configs::new(
        Config::parse(
            r#"
[python]
exclude = ["[broken"]
"#,
        )
        .expect("config parses"),
    );

    assert!(matches!(
        generate(root, &configs, "pkg"),
        Err(GenerateError::Walk(_))
    ));
}
