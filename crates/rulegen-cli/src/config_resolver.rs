//! Locating and loading `rulegen.toml`.
//!
//! Candidates, first match wins: the `--config` path, the repository
//! candidates in [`rulegen::CONFIG_CANDIDATES`] order, then `config.toml`
//! in the global directory. Without any of them the defaults apply.

use anyhow::{Context, Result};
use rulegen::Config;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const GLOBAL_CONFIG_NAME: &str = "config.toml";

/// Overrides the global directory (`~/.rulegen` otherwise).
const GLOBAL_DIR_ENV: &str = "RULEGEN_CONFIG_DIR";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Origin {
    Flag,
    Repository,
    Global,
}

/// The configuration file chosen for a run.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ConfigFile {
    path: PathBuf,
    origin: Origin,
}

impl ConfigFile {
    fn load(&self) -> Result<Config> {
        match self.origin {
            Origin::Global => info!("Using global config {}", self.path.display()),
            Origin::Flag | Origin::Repository => {
                debug!("Using config {}", self.path.display());
            }
        }
        let config = Config::from_file(&self.path)
            .with_context(|| format!("Failed to load {}", self.path.display()))?;
        config
            .validate()
            .with_context(|| format!("Invalid configuration in {}", self.path.display()))?;
        Ok(config)
    }
}

/// Loads the configuration of the repository at `repo_root`.
pub fn load(repo_root: &Path, explicit: Option<&Path>) -> Result<Config> {
    match locate(repo_root, explicit, global_dir().as_deref()) {
        Some(file) => file.load(),
        None => {
            debug!("No configuration file found, using defaults");
            Ok(Config::default())
        }
    }
}

/// An explicit path is taken as is; a missing file fails at load time.
fn locate(repo_root: &Path, explicit: Option<&Path>, global: Option<&Path>) -> Option<ConfigFile> {
    if let Some(path) = explicit {
        return Some(ConfigFile {
            path: path.to_path_buf(),
            origin: Origin::Flag,
        });
    }

    let repository = rulegen::CONFIG_CANDIDATES
        .iter()
        .map(|name| (repo_root.join(name), Origin::Repository));
    let global = global.map(|dir| (dir.join(GLOBAL_CONFIG_NAME), Origin::Global));

    repository
        .chain(global)
        .find(|(path, _)| path.is_file())
        .map(|(path, origin)| ConfigFile { path, origin })
}

fn global_dir() -> Option<PathBuf> {
    std::env::var_os(GLOBAL_DIR_ENV)
        .map(PathBuf::from)
        .or_else(|| home::home_dir().map(|home| home.join(".rulegen")))
}
