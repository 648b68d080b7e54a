//! Block pattern parsing.
//!
//! The blocking jobs text holds one regular expression per line. Each
//! pattern must match a job's whole display name: `block.*` matches
//! `blockingJob`, `queue` does not match `queueBlockingJob`.

use regex::Regex;
use std::fmt;
use tracing::warn;

use crate::{ConfigError, ConfigResult};

/// A compiled, full-match regular expression together with its source text.
#[derive(Debug, Clone)]
pub struct BlockPattern {
    source: String,
    regex: Regex,
}

impl BlockPattern {
    /// Compile a single pattern. `line` is only used for error reporting.
    pub fn new(pattern: &str, line: usize) -> ConfigResult<Self> {
        let invalid = |e: regex::Error| ConfigError::InvalidPattern {
            line,
            pattern: pattern.to_string(),
            message: e.to_string(),
        };

        // Validate the pattern on its own first so that anchoring cannot
        // turn an unbalanced group into a valid expression.
        Regex::new(pattern).map_err(invalid)?;
        let regex = Regex::new(&format!(r"\A(?:{})\z", pattern))
            // A pattern that compiles alone but not once wrapped ends in a
            // verbose-mode `#` comment; a line break closes the comment and
            // is ignored in verbose mode.
            .or_else(|_| Regex::new(&format!("\\A(?:{}\n)\\z", pattern)))
            .map_err(invalid)?;

        Ok(Self {
            source: pattern.to_string(),
            regex,
        })
    }

    /// The pattern as written in the configuration.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Whether the pattern matches the whole of `name`.
    pub fn is_match(&self, name: &str) -> bool {
        self.regex.is_match(name)
    }
}

impl fmt::Display for BlockPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

/// A pattern line that failed to compile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedPattern {
    /// 1-based line number in the input text.
    pub line: usize,
    pub pattern: String,
    pub message: String,
}

/// Outcome of parsing a blocking jobs text: the usable patterns plus the
/// lines that were skipped because they did not compile.
#[derive(Debug, Clone, Default)]
pub struct PatternParse {
    pub patterns: PatternSet,
    pub rejected: Vec<RejectedPattern>,
}

impl PatternParse {
    pub fn is_clean(&self) -> bool {
        self.rejected.is_empty()
    }
}

/// Ordered, immutable list of block patterns.
#[derive(Debug, Clone, Default)]
pub struct PatternSet {
    patterns: Vec<BlockPattern>,
}

impl PatternSet {
    /// Parse a line-feed separated list of patterns.
    ///
    /// Blank lines are ignored. Lines that are not valid regular expressions
    /// are skipped with a warning.
    pub fn parse(text: &str) -> Self {
        let report = Self::parse_report(text);
        for rejected in &report.rejected {
            warn!(
                line = rejected.line,
                pattern = %rejected.pattern,
                error = %rejected.message,
                "Skipping invalid block pattern"
            );
        }
        report.patterns
    }

    /// Parse, keeping track of every rejected line.
    pub fn parse_report(text: &str) -> PatternParse {
        let mut report = PatternParse::default();

        for (line, pattern) in pattern_lines(text) {
            match BlockPattern::new(pattern, line) {
                Ok(p) => report.patterns.patterns.push(p),
                Err(ConfigError::InvalidPattern {
                    line,
                    pattern,
                    message,
                }) => report.rejected.push(RejectedPattern {
                    line,
                    pattern,
                    message,
                }),
                Err(e) => report.rejected.push(RejectedPattern {
                    line,
                    pattern: pattern.to_string(),
                    message: e.to_string(),
                }),
            }
        }

        report
    }

    /// Parse, failing on the first invalid line.
    pub fn parse_strict(text: &str) -> ConfigResult<Self> {
        let patterns = pattern_lines(text)
            .map(|(line, pattern)| BlockPattern::new(pattern, line))
            .collect::<ConfigResult<Vec<_>>>()?;
        Ok(Self { patterns })
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &BlockPattern> {
        self.patterns.iter()
    }

    /// The first pattern, in parsed order, that matches the whole of `name`.
    pub fn matching(&self, name: &str) -> Option<&BlockPattern> {
        self.patterns.iter().find(|p| p.is_match(name))
    }
}

impl FromIterator<BlockPattern> for PatternSet {
    fn from_iter<I: IntoIterator<Item = BlockPattern>>(iter: I) -> Self {
        Self {
            patterns: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a PatternSet {
    type Item = &'a BlockPattern;
    type IntoIter = std::slice::Iter<'a, BlockPattern>;

    fn into_iter(self) -> Self::IntoIter {
        self.patterns.iter()
    }
}

/// Non-blank lines with their 1-based line numbers, surrounding whitespace
/// (including a trailing `\r`) removed.
fn pattern_lines(text: &str) -> impl Iterator<Item = (usize, &str)> {
    text.split('\n')
        .enumerate()
        .map(|(idx, line)| (idx + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sources(set: &PatternSet) -> Vec<&str> {
        set.iter().map(|p| p.as_str()).collect()
    }

    #[test]
    fn test_parse_preserves_order_and_skips_blank_lines() {
        let set = PatternSet::parse("xxx\n\n   \nblock.*\nyyy\n");
        assert_eq!(sources(&set), vec!["xxx", "block.*", "yyy"]);
    }

    #[test]
    fn test_empty_text_gives_empty_set() {
        assert!(PatternSet::parse("").is_empty());
        assert!(PatternSet::parse("\n \n\t\n").is_empty());
    }

    #[test]
    fn test_full_name_match() {
        let set = PatternSet::parse("blockingJob");
        assert!(set.matching("blockingJob").is_some());
        assert!(set.matching("blockingJob2").is_none());
        assert!(set.matching("theblockingJob").is_none());
    }

    #[test]
    fn test_patterns_match_whole_name_not_substring() {
        let set = PatternSet::parse("block.*");
        assert!(set.matching("blockingJob").is_some());
        assert!(set.matching("queueBlockingJob").is_none());

        let set = PatternSet::parse("queue");
        assert!(set.matching("queueBlockingJob").is_none());
        assert!(set.matching("queue").is_some());
    }

    #[test]
    fn test_alternation_is_anchored_as_a_whole() {
        let set = PatternSet::parse("deploy|release");
        assert!(set.matching("deploy").is_some());
        assert!(set.matching("release").is_some());
        assert!(set.matching("deploy-prod").is_none());
        assert!(set.matching("pre-release").is_none());
    }

    #[test]
    fn test_matching_is_case_sensitive() {
        let set = PatternSet::parse("Block.*");
        assert!(set.matching("blockingJob").is_none());
        assert!(set.matching("BlockingJob").is_some());
    }

    #[test]
    fn test_matching_returns_first_pattern_in_order() {
        let set = PatternSet::parse("xxx\nblock.*\nblockingJob");
        assert_eq!(set.matching("blockingJob").unwrap().as_str(), "block.*");
    }

    #[test]
    fn test_crlf_lines_are_trimmed() {
        let set = PatternSet::parse("xxx\r\nblockingJob\r\n");
        assert_eq!(sources(&set), vec!["xxx", "blockingJob"]);
        assert!(set.matching("blockingJob").is_some());
    }

    #[test]
    fn test_invalid_line_is_skipped_and_reported() {
        let report = PatternSet::parse_report("good.*\n(unclosed\n\nother");
        assert_eq!(sources(&report.patterns), vec!["good.*", "other"]);
        assert!(!report.is_clean());
        assert_eq!(report.rejected.len(), 1);
        assert_eq!(report.rejected[0].line, 2);
        assert_eq!(report.rejected[0].pattern, "(unclosed");

        let set = PatternSet::parse("good.*\n(unclosed\n\nother");
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_verbose_pattern_with_trailing_comment() {
        let report = PatternSet::parse_report("(?x)deploy # prod");
        assert!(report.is_clean());
        assert!(report.patterns.matching("deploy").is_some());
        assert!(report.patterns.matching("deploy-prod").is_none());

        let set = PatternSet::parse("(?x) deploy - .*  # every deploy job");
        assert!(set.matching("deploy-prod").is_some());
        assert!(set.matching("predeploy-prod").is_none());
    }

    #[test]
    fn test_non_verbose_pattern_does_not_accept_newline() {
        let set = PatternSet::parse("deploy");
        assert!(set.matching("deploy\n").is_none());
    }

    #[test]
    fn test_unbalanced_close_paren_is_rejected() {
        let report = PatternSet::parse_report("a)(b");
        assert!(report.patterns.is_empty());
        assert_eq!(report.rejected.len(), 1);
    }

    #[test]
    fn test_parse_strict_fails_on_invalid_line() {
        let err = PatternSet::parse_strict("ok\n[bad").unwrap_err();
        match err {
            ConfigError::InvalidPattern { line, pattern, .. } => {
                assert_eq!(line, 2);
                assert_eq!(pattern, "[bad");
            }
            other => panic!("unexpected error: {other}"),
        }

        assert_eq!(PatternSet::parse_strict("a\n\nb").unwrap().len(), 2);
    }

    #[test]
    fn test_pattern_set_is_shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<PatternSet>();
    }
}
