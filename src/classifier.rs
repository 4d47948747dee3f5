//! Line classification against the configured patterns.

use crate::config::PatternConfig;
use crate::error::{Error, Result};
use regex::{Regex, RegexBuilder};

/// Outcome of classifying one log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Ignore,
    Normal,
    Error,
}

/// Matches lines against up to four optional patterns. Error patterns are
/// checked first and always win.
#[derive(Debug, Clone)]
pub struct Classifier {
    error_ci: Option<Regex>,
    error_cs: Option<Regex>,
    normal_ci: Option<Regex>,
    normal_cs: Option<Regex>,
}

impl Classifier {
    /// Compiles the patterns, failing on the first invalid one.
    pub fn new(patterns: &PatternConfig) -> Result<Self> {
        Ok(Self {
            error_ci: compile("error_ignore_case", &patterns.error_ignore_case, true)?,
            error_cs: compile("error", &patterns.error, false)?,
            normal_ci: compile("normal_ignore_case", &patterns.normal_ignore_case, true)?,
            normal_cs: compile("normal", &patterns.normal, false)?,
        })
    }

    pub fn classify(&self, line: &str) -> Verdict {
        let matches = |re: &Option<Regex>| re.as_ref().is_some_and(|re| re.is_match(line));

        if matches(&self.error_ci) || matches(&self.error_cs) {
            Verdict::Error
        } else if matches(&self.normal_ci) || matches(&self.normal_cs) {
            Verdict::Normal
        } else {
            Verdict::Ignore
        }
    }
}

fn compile(name: &'static str, pattern: &str, case_insensitive: bool) -> Result<Option<Regex>> {
    if pattern.is_empty() {
        return Ok(None);
    }

    RegexBuilder::new(pattern)
        .case_insensitive(case_insensitive)
        .build()
        .map(Some)
        .map_err(|source| Error::Pattern { name, source })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn patterns(error_ci: &str, error: &str, normal_ci: &str, normal: &str) -> PatternConfig {
        PatternConfig {
            error_ignore_case: error_ci.to_string(),
            error: error.to_string(),
            normal_ignore_case: normal_ci.to_string(),
            normal: normal.to_string(),
        }
    }

    #[test]
    fn test_no_patterns_ignores_everything() {
        let classifier = Classifier::new(&PatternConfig::default()).unwrap();
        assert_eq!(classifier.classify("FATAL error"), Verdict::Ignore);
    }

    #[test]
    fn test_error_wins_over_normal() {
        let classifier = Classifier::new(&patterns("error", "", "started|error", "")).unwrap();

        assert_eq!(classifier.classify("ERROR while started"), Verdict::Error);
        assert_eq!(classifier.classify("service started"), Verdict::Normal);
        assert_eq!(classifier.classify("idle"), Verdict::Ignore);
    }

    #[test]
    fn test_case_sensitivity_per_pattern() {
        let classifier = Classifier::new(&patterns("", "FATAL", "", "Warn")).unwrap();

        assert_eq!(classifier.classify("FATAL: disk"), Verdict::Error);
        assert_eq!(classifier.classify("fatal: disk"), Verdict::Ignore);
        assert_eq!(classifier.classify("Warn: slow"), Verdict::Normal);
        assert_eq!(classifier.classify("WARN: slow"), Verdict::Ignore);

        let classifier = Classifier::new(&patterns("fatal", "", "warn", "")).unwrap();
        assert_eq!(classifier.classify("FaTaL"), Verdict::Error);
        assert_eq!(classifier.classify("WARN"), Verdict::Normal);
    }

    #[test]
    fn test_scenario_line_is_error() {
        let classifier = Classifier::new(&patterns("", "error", "", "")).unwrap();

        assert_eq!(
            classifier.classify("2024-01-01 00:00:01.000 FATAL error occurred"),
            Verdict::Error
        );
        assert_eq!(
            classifier.classify("2024-01-01 00:00:00.000 OK"),
            Verdict::Ignore
        );
    }

    #[test]
    fn test_invalid_pattern_fails_fast() {
        match Classifier::new(&patterns("", "", "", "([unclosed")) {
            Err(Error::Pattern { name, .. }) => assert_eq!(name, "normal"),
            other => panic!("Expected Error::Pattern, got {:?}", other),
        }
    }
}
