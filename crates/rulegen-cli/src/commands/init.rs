//! Init command implementation.

use anyhow::{bail, Context, Result};
use std::path::Path;

const CONFIG_FILE_NAME: &str = "rulegen.toml";

const DEFAULT_CONFIG: &str = r#"# rulegen configuration
#
# [python] applies to the repository root; [dirs."<path>"] sections override
# it for a directory and everything below it.

[python]
# Turn generation off for a subtree with `enabled = false`.
enabled = true

# "package": one target of each kind per package
# "file":    one target per source file
# "project": aggregate a whole subtree into its top directory
generation_mode = "package"

# In package mode, aggregate tests only when a __test__.py exists.
per_package_require_test_entry_point = true

# Directory that Python imports are relative to.
project_root = ""

library_naming_convention = "$package_name$"
binary_naming_convention = "$package_name$_bin"
test_naming_convention = "$package_name$_test"

# Glob patterns, relative to this section's directory.
exclude = []

# File basenames never treated as sources.
ignore_files = []

# Modules never reported as dependencies (dotted prefixes match).
ignore_dependencies = []

build_file_names = ["BUILD", "BUILD.bazel"]

# Extra visibility labels for libraries, binaries and fixtures.
visibility = []

# Kind names used by existing rules, for collision detection.
# [python.kind_map]
# py_library = "my_py_library"

# [dirs."tools"]
# generation_mode = "file"
"#;

/// Runs the init command.
pub fn run(dir: &Path, force: bool) -> Result<()> {
    let config_path = dir.join(CONFIG_FILE_NAME);

    if config_path.exists() && !force {
        bail!(
            "Configuration file already exists at {}. Use --force to overwrite.",
            config_path.display()
        );
    }

    std::fs::write(&config_path, DEFAULT_CONFIG)
        .with_context(|| format!("Failed to write {}", config_path.display()))?;

    println!("Created {}", config_path.display());
    println!("\nNext steps:");
    println!("  1. Edit {CONFIG_FILE_NAME} to match the repository layout");
    println!("  2. Run: rulegen generate");

    Ok(())
}
