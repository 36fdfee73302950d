//! Exclusion patterns with double-star support.

use glob::{MatchOptions, Pattern, PatternError};

/// `*` and `?` never cross a `/`; only `**` spans directories.
const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// A compiled set of repository-relative exclusion patterns.
///
/// Patterns are compiled once and reused for every path of a walk.
#[derive(Debug, Clone, Default)]
pub struct ExcludeSet {
    patterns: Vec<(String, Pattern)>,
}

impl ExcludeSet {
    /// Compiles every pattern.
    ///
    /// # Errors
    ///
    /// Returns the offending pattern and its syntax error.
    pub fn compile<S: AsRef<str>>(patterns: &[S]) -> Result<Self, (String, PatternError)> {
        let patterns = patterns
            .iter()
            .map(|raw| {
                let raw = raw.as_ref();
                Pattern::new(raw)
                    .map(|compiled| (raw.to_string(), compiled))
                    .map_err(|e| (raw.to_string(), e))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { patterns })
    }

    /// Returns true if no pattern was configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Tests a repository-relative, `/`-separated path.
    #[must_use]
    pub fn matches(&self, path: &str) -> bool {
        self.matching(path).is_some()
    }

    /// Returns the first pattern matching `path`.
    #[must_use]
    pub fn matching(&self, path: &str) -> Option<&str> {
        self.patterns
            .iter()
            .find(|(_, p)| p.matches_with(path, MATCH_OPTIONS))
            .map(|(raw, _)| raw.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn double_star_spans_directories() {
        let set = ExcludeSet::compile(&["**/gen/**"]).expect("valid");
        assert!(set.matches("a/gen/x.py"));
        assert!(set.matches("a/b/gen/c/x.py"));
        assert!(!set.matches("a/generated/x.py"));
    }

    #[test]
    fn single_star_stays_in_segment() {
        let set = ExcludeSet::compile(&["pkg/*.py"]).expect("valid");
        assert!(set.matches("pkg/a.py"));
        assert!(!set.matches("pkg/sub/a.py"));
    }

    #[test]
    fn reports_matching_pattern() {
        let set = ExcludeSet::compile(&["a/*.py", "b/**"]).expect("valid");
        assert_eq!(set.matching("b/c/d.py"), Some("b/**"));
        assert_eq!(set.matching("c.py"), None);
    }

    #[test]
    fn malformed_pattern_is_an_error() {
        let err = ExcludeSet::compile(&["ok/**", "[bad"]).unwrap_err();
        assert_eq!(err.0, "[bad");
    }

    #[test]
    fn empty_set_matches_nothing() {
        let set = ExcludeSet::compile::<&str>(&[]).expect("valid");
        assert!(set.is_empty());
        assert!(!set.matches("anything.py"));
    }
}
