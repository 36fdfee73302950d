//! Verify-manifest command implementation.

use anyhow::{Context, Result};
use rulegen::Manifest;
use std::fs::File;
use std::path::Path;

/// Runs the verify-manifest command.
///
/// Exits with status 1 when the manifest is out of date and `update` is off.
pub fn run(manifest_path: &Path, generator: &Path, requirements: &Path, update: bool) -> Result<()> {
    let mut manifest = Manifest::decode(manifest_path)
        .with_context(|| format!("Failed to load manifest {}", manifest_path.display()))?;

    if update {
        manifest
            .encode(manifest_path, open(generator)?, open(requirements)?)
            .with_context(|| format!("Failed to update {}", manifest_path.display()))?;
        println!("Updated {}", manifest_path.display());
        return Ok(());
    }

    if is_up_to_date(&manifest, generator, requirements)? {
        println!("{} is up to date", manifest_path.display());
        return Ok(());
    }

    eprintln!(
        "{} is out of date; run `rulegen verify-manifest --update` with the same inputs to regenerate it",
        manifest_path.display()
    );
    std::process::exit(1);
}

fn is_up_to_date(manifest: &Manifest, generator: &Path, requirements: &Path) -> Result<bool> {
    manifest
        .verify_integrity(open(generator)?, open(requirements)?)
        .context("Failed to compute manifest integrity")
}

fn open(path: &Path) -> Result<File> {
    File::open(path).with_context(|| format!("Failed to open {}", path.display()))
}
