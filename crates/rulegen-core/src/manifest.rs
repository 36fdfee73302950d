//! Integrity-checked module manifest.
//!
//! A manifest maps importable module names to the third-party distribution
//! providing them. Its `integrity` field is a SHA-256 over the manifest body,
//! the generator identity and the requirements it was produced from, so a
//! stale manifest can be detected without regenerating it.

use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// The persisted manifest file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    /// Lowercase hex SHA-256 recorded when the manifest was written.
    #[serde(default)]
    pub integrity: String,
    /// The hashed content.
    pub manifest: ManifestBody,
}

/// Content covered by the integrity hash.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestBody {
    /// Module name to distribution name.
    #[serde(default)]
    pub modules_mapping: BTreeMap<String, String>,
    /// Name of the repository holding the distributions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pip_repository: Option<String>,
}

impl Manifest {
    /// Wraps a body with an empty integrity.
    #[must_use]
    pub fn new(body: ManifestBody) -> Self {
        Self {
            integrity: String::new(),
            manifest: body,
        }
    }

    /// Reads and parses a manifest file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn decode(path: &Path) -> Result<Self, ManifestError> {
        let content = fs::read_to_string(path).map_err(|source| ManifestError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content).map_err(|e| match e {
            ManifestError::Parse { message, .. } => ManifestError::Parse {
                path: Some(path.to_path_buf()),
                message,
            },
            other => other,
        })
    }

    /// Parses a manifest from TOML.
    ///
    /// # Errors
    ///
    /// Returns [`ManifestError::Parse`] for malformed content.
    pub fn parse(content: &str) -> Result<Self, ManifestError> {
        toml::from_str(content).map_err(|e| ManifestError::Parse {
            path: None,
            message: e.to_string(),
        })
    }

    /// Recomputes the integrity from both streams and writes the manifest.
    ///
    /// # Errors
    ///
    /// Returns an error if a stream cannot be read or the file cannot be written.
    pub fn encode(
        &mut self,
        path: &Path,
        generator: impl Read,
        requirements: impl Read,
    ) -> Result<(), ManifestError> {
        self.integrity = self.calculate_integrity(generator, requirements)?;
        let content =
            toml::to_string(self).map_err(|e| ManifestError::Serialize(e.to_string()))?;
        fs::write(path, content).map_err(|source| ManifestError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Checks the recorded integrity against both streams.
    ///
    /// # Errors
    ///
    /// Returns an error if no integrity was recorded or a stream fails.
    pub fn verify_integrity(
        &self,
        generator: impl Read,
        requirements: impl Read,
    ) -> Result<bool, ManifestError> {
        if self.integrity.is_empty() {
            return Err(ManifestError::MissingIntegrity);
        }
        let computed = self.calculate_integrity(generator, requirements)?;
        Ok(computed == self.integrity)
    }

    fn calculate_integrity(
        &self,
        mut generator: impl Read,
        mut requirements: impl Read,
    ) -> Result<String, ManifestError> {
        let body = toml::to_string(&self.manifest)
            .map_err(|e| ManifestError::Serialize(e.to_string()))?;

        let mut hasher = Sha256::new();
        hasher.update(body.as_bytes());
        io::copy(&mut generator, &mut hasher).map_err(ManifestError::Read)?;
        io::copy(&mut requirements, &mut hasher).map_err(ManifestError::Read)?;
        Ok(hex::encode(hasher.finalize()))
    }
}

/// Manifest failures.
#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    /// The manifest file could not be read or written.
    #[error("Failed to access manifest {path}: {source}")]
    Io {
        /// Manifest path.
        path: PathBuf,
        /// Underlying IO error.
        source: io::Error,
    },

    /// An input stream failed.
    #[error("Failed to read integrity input: {0}")]
    Read(#[source] io::Error),

    /// The manifest is not valid TOML.
    #[error("Failed to parse manifest{}: {message}", .path.as_ref().map(|p| format!(" {}", p.display())).unwrap_or_default())]
    Parse {
        /// Manifest path, when read from disk.
        path: Option<PathBuf>,
        /// Parser message.
        message: String,
    },

    /// The manifest could not be serialized.
    #[error("Failed to serialize manifest: {0}")]
    Serialize(String),

    /// No integrity was recorded.
    #[error("manifest has no integrity")]
    MissingIntegrity,
}
