//! Name collisions against existing declarations.

use miette::Diagnostic;
use tracing::error;

use crate::existing::{ExistingFile, ExistingRule};
use crate::types::TargetLabel;

/// A generated target whose name is taken by a declaration of another kind.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Diagnostic)]
#[error(
    "failed to generate target \"{label}\" of kind \"{intended_kind}\": \
     a target of kind \"{existing_kind}\" with the same name already exists"
)]
#[diagnostic(code(rulegen::collision))]
pub struct CollisionError {
    /// Fully-qualified identity of the target.
    pub label: TargetLabel,
    /// Kind the generator intended to emit.
    pub intended_kind: String,
    /// Kind of the declaration already present.
    pub existing_kind: String,
    /// Setting to change to avoid the collision.
    #[help]
    pub help: Option<String>,
}

impl CollisionError {
    /// Creates a collision diagnostic; `setting` names the convention to change.
    #[must_use]
    pub fn new(
        label: TargetLabel,
        intended_kind: impl Into<String>,
        existing_kind: impl Into<String>,
        setting: Option<&str>,
    ) -> Self {
        Self {
            label,
            intended_kind: intended_kind.into(),
            existing_kind: existing_kind.into(),
            help: setting.map(|s| format!("set `{s}` to change the naming convention")),
        }
    }
}

/// Checks intended names against the existing build file of one package.
///
/// Collisions accumulate for the whole pass; nothing is raised early.
#[derive(Debug)]
pub struct CollisionDetector<'a> {
    package: &'a str,
    existing: Option<&'a ExistingFile>,
    collisions: Vec<CollisionError>,
}

impl<'a> CollisionDetector<'a> {
    /// Creates a detector for `package`.
    #[must_use]
    pub fn new(package: &'a str, existing: Option<&'a ExistingFile>) -> Self {
        Self {
            package,
            existing,
            collisions: Vec::new(),
        }
    }

    /// Existing rules named `name` whose kind differs from `kind`.
    pub fn conflicts<'b>(
        &'b self,
        name: &'b str,
        kind: &'b str,
    ) -> impl Iterator<Item = &'a ExistingRule> + 'b {
        self.existing
            .into_iter()
            .flat_map(|file| file.rules.iter())
            .filter(move |rule| rule.name == name && rule.kind != kind)
    }

    /// Records every conflict for `name` and returns how many were found.
    pub fn check(&mut self, name: &str, kind: &str, setting: Option<&str>) -> usize {
        let found: Vec<CollisionError> = self
            .conflicts(name, kind)
            .map(|rule| {
                CollisionError::new(
                    TargetLabel::new(self.package, name),
                    kind,
                    rule.kind.clone(),
                    setting,
                )
            })
            .collect();
        let count = found.len();
        self.collisions.extend(found);
        count
    }

    /// Returns true if nothing was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.collisions.is_empty()
    }

    /// Logs every recorded collision and hands them over.
    #[must_use]
    pub fn flush(self) -> Vec<CollisionError> {
        for collision in &self.collisions {
            error!("{collision}");
        }
        self.collisions
    }
}
