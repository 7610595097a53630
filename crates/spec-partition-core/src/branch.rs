//! Branch resolution and branch-pattern matching.

use crate::pattern::glob_matches;

/// Pattern that applies to every branch.
pub const ALL_BRANCHES: &str = "all";

/// Reduce a CI reference to a branch name.
///
/// `refs/<kind>/<rest...>` becomes `<rest...>`; anything else passes through
/// trimmed. When nothing usable remains, `fallback` is returned.
pub fn normalize_branch(git_ref: &str, fallback: &str) -> String {
    let trimmed = git_ref.trim();
    let branch = match trimmed.strip_prefix("refs/") {
        Some(rest) => match rest.split_once('/') {
            Some((_kind, name)) => name,
            None => "",
        },
        None => trimmed,
    };

    if branch.is_empty() {
        tracing::debug!(git_ref = trimmed, fallback, "Falling back to default branch name");
        fallback.to_string()
    } else {
        branch.to_string()
    }
}

/// Whether a rule's branch pattern applies to `branch`.
pub fn branch_matches(pattern: &str, branch: &str) -> bool {
    pattern == ALL_BRANCHES || glob_matches(pattern, branch)
}
