//! Generate command implementation.

use anyhow::{Context, Result};
use rulegen::{find_repo_root, Configs, RunError, Runner};
use std::path::Path;

use crate::OutputFormat;

/// Runs the generate command.
pub fn run(path: &Path, format: OutputFormat, config_path: Option<&Path>) -> Result<()> {
    let start = path
        .canonicalize()
        .with_context(|| format!("Failed to resolve {}", path.display()))?;
    let repo_root = find_repo_root(&start);

    let config = crate::config_resolver::load(&repo_root, config_path)?;

    let runner = Runner::python(&repo_root, Configs::new(config));
    match runner.run() {
        Ok(report) => super::output::print(&report, format),
        Err(RunError::Collisions(collisions)) => {
            for collision in collisions {
                eprintln!("{:?}", miette::Report::new(collision));
            }
            std::process::exit(1);
        }
        Err(e) => Err(e).context("Generation failed"),
    }
}
