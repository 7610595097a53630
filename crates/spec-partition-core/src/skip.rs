//! Branch-scoped skip rules.
//!
//! A rule string looks like `rule;rule;...` where each rule is either
//! `name1,name2` (skipped on every branch) or `pattern:name1,name2`
//! (skipped only on branches matching `pattern`). `false` or an empty
//! string disables skipping.

use crate::branch::branch_matches;
use crate::config::SPEC_SUFFIX;
use crate::pattern::{glob_regex, is_glob};
use regex::Regex;
use tracing::{debug, warn};

/// Entry that skips every spec.
pub const SKIP_EVERYTHING: &str = "*";

/// One parsed rule: a branch pattern and the names it skips.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkipRule {
    /// Branch pattern, `all` for global rules.
    pub branch_pattern: String,

    /// Exact spec base names or globs.
    pub test_patterns: Vec<String>,
}

impl SkipRule {
    /// Parse a single rule. Returns `None` for malformed rules.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        let (branch_pattern, tests) = match raw.split_once(':') {
            Some((pattern, tests)) => (pattern.trim(), tests),
            None => (crate::branch::ALL_BRANCHES, raw),
        };

        let test_patterns: Vec<String> = tests
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect();

        if branch_pattern.is_empty() || test_patterns.is_empty() {
            return None;
        }

        Some(Self {
            branch_pattern: branch_pattern.to_string(),
            test_patterns,
        })
    }
}

#[derive(Debug, Clone)]
struct SkipEntry {
    pattern: String,
    regex: Option<Regex>,
}

/// Flat set of skip patterns effective for one branch.
#[derive(Debug, Clone, Default)]
pub struct SkipSet {
    entries: Vec<SkipEntry>,
    skip_everything: bool,
}

impl SkipSet {
    /// Parse `raw` and keep the patterns of every rule applying to `branch`.
    ///
    /// Malformed rules are logged and ignored.
    pub fn parse(raw: &str, branch: &str) -> Self {
        let mut set = SkipSet::default();
        let raw = raw.trim();
        if raw.is_empty() || raw.eq_ignore_ascii_case("false") {
            return set;
        }

        for rule_str in raw.split(';') {
            if rule_str.trim().is_empty() {
                continue;
            }
            let Some(rule) = SkipRule::parse(rule_str) else {
                warn!(rule = rule_str.trim(), "Ignoring malformed skip rule");
                continue;
            };
            if !branch_matches(&rule.branch_pattern, branch) {
                debug!(pattern = %rule.branch_pattern, branch, "Skip rule does not apply to branch");
                continue;
            }
            for pattern in rule.test_patterns {
                set.insert(pattern);
            }
        }

        if !set.is_empty() {
            debug!(branch, patterns = ?set.patterns().collect::<Vec<_>>(), "Effective skip patterns");
        }
        set
    }

    fn insert(&mut self, pattern: String) {
        if self.entries.iter().any(|e| e.pattern == pattern) {
            return;
        }
        if pattern == SKIP_EVERYTHING {
            self.skip_everything = true;
        }
        let regex = if is_glob(&pattern) {
            match glob_regex(&pattern) {
                Ok(re) => Some(re),
                Err(e) => {
                    warn!(pattern = %pattern, error = %e, "Ignoring unusable skip pattern");
                    return;
                }
            }
        } else {
            None
        };
        self.entries.push(SkipEntry { pattern, regex });
    }

    /// Effective patterns in the order they were first seen.
    pub fn patterns(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.pattern.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the spec with this identifier is skipped.
    pub fn matches(&self, identifier: &str) -> bool {
        if self.skip_everything {
            return true;
        }
        let base = spec_base_name(identifier);
        self.entries.iter().any(|entry| {
            entry.pattern == base
                || entry
                    .regex
                    .as_ref()
                    .is_some_and(|re| re.is_match(base))
        })
    }
}

/// Base name of a spec identifier: no directories, no spec suffix.
pub fn spec_base_name(identifier: &str) -> &str {
    let file = identifier
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(identifier);
    file.strip_suffix(SPEC_SUFFIX).unwrap_or(file)
}
