//! Glob-style name patterns.
//!
//! Branch patterns and spec-name skip entries share one glob dialect: the
//! whole string is anchored, `*` matches any run of characters and every
//! other character is literal.

use crate::error::{PartitionError, Result};
use regex::Regex;

/// Whether `pattern` contains a wildcard.
pub fn is_glob(pattern: &str) -> bool {
    pattern.contains('*')
}

/// Translate a glob into an anchored regex source string.
pub fn glob_to_regex_source(pattern: &str) -> String {
    let body = pattern
        .split('*')
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(".*");
    format!("^{}$", body)
}

/// Compile a glob into an anchored [`Regex`].
pub fn glob_regex(pattern: &str) -> Result<Regex> {
    Regex::new(&glob_to_regex_source(pattern)).map_err(|source| PartitionError::InvalidPattern {
        pattern: pattern.to_string(),
        source,
    })
}

/// Match `candidate` against `pattern`: exact equality first, then glob
/// expansion when the pattern carries a `*`.
pub fn glob_matches(pattern: &str, candidate: &str) -> bool {
    if pattern == candidate {
        return true;
    }
    if !is_glob(pattern) {
        return false;
    }
    match glob_regex(pattern) {
        Ok(re) => re.is_match(candidate),
        Err(e) => {
            tracing::warn!(pattern, error = %e, "Ignoring unusable glob pattern");
            false
        }
    }
}
