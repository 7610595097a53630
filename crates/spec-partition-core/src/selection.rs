//! Run-mode resolution.
//!
//! A run-mode keyword maps to a [`SelectionPolicy`] through a static table.
//! Anything not in the table is read as a `;`-separated list of explicit
//! spec names.

use crate::config::tags;
use crate::error::{PartitionError, Result};
use regex::Regex;
use tracing::{debug, info};

/// How a resolved policy treats weekly-tagged specs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WeeklyFlag {
    /// Weekly-tagged specs are left out.
    Suppress,
    /// Always allow weekly specs.
    Force,
}

/// One row of the run-mode table.
#[derive(Debug, Clone, Copy)]
pub struct RunModeEntry {
    pub keyword: &'static str,
    tag_pattern: Option<&'static str>,
    invert: bool,
    weekly: WeeklyFlag,
    /// Corpus is small enough that balancing buys nothing.
    pub small_suite: bool,
}

const fn mode(
    keyword: &'static str,
    tag_pattern: Option<&'static str>,
    invert: bool,
    weekly: WeeklyFlag,
    small_suite: bool,
) -> RunModeEntry {
    RunModeEntry {
        keyword,
        tag_pattern,
        invert,
        weekly,
        small_suite,
    }
}

const SMOKE_PATTERN: &str = tags::SMOKE;
const AI_PATTERN: &str = "@aigw|@ai-plugins";

/// Known run-modes. `all` is special-cased on the weekly indicator.
pub const RUN_MODES: &[RunModeEntry] = &[
    mode("smoke", Some(SMOKE_PATTERN), false, WeeklyFlag::Suppress, true),
    mode("non-smoke", Some(SMOKE_PATTERN), true, WeeklyFlag::Suppress, false),
    mode("oss", Some(tags::OSS), false, WeeklyFlag::Suppress, true),
    mode("aigw", Some(tags::AIGW), false, WeeklyFlag::Suppress, true),
    mode("all-except-ai", Some(AI_PATTERN), true, WeeklyFlag::Suppress, false),
    mode("weekly", Some(tags::WEEKLY), false, WeeklyFlag::Force, false),
];

static ALL_WEEKLY_RUN: RunModeEntry = mode("all", None, false, WeeklyFlag::Force, false);
static ALL_REGULAR_RUN: RunModeEntry =
    mode("all", Some(tags::WEEKLY), true, WeeklyFlag::Suppress, false);

/// Tag-matching policy for one invocation.
#[derive(Debug, Clone)]
pub struct SelectionPolicy {
    /// Pattern searched for in raw spec content; `None` matches everything.
    pub tag_pattern: Option<Regex>,

    /// Include specs that do NOT match `tag_pattern`.
    pub invert: bool,

    /// `Some(true)` lets weekly specs through; otherwise they are suppressed.
    pub force_weekly: Option<bool>,
}

impl SelectionPolicy {
    /// Policy that lets every spec through the tag check.
    pub fn unrestricted() -> Self {
        Self {
            tag_pattern: None,
            invert: false,
            force_weekly: None,
        }
    }

    fn from_entry(entry: &RunModeEntry) -> Result<Self> {
        let tag_pattern = entry
            .tag_pattern
            .map(|p| {
                Regex::new(p).map_err(|source| PartitionError::InvalidPattern {
                    pattern: p.to_string(),
                    source,
                })
            })
            .transpose()?;
        Ok(Self {
            tag_pattern,
            invert: entry.invert,
            force_weekly: match entry.weekly {
                WeeklyFlag::Force => Some(true),
                WeeklyFlag::Suppress => None,
            },
        })
    }

    /// Source text of the tag pattern, if one was resolved.
    pub fn tag_source(&self) -> Option<&str> {
        self.tag_pattern.as_ref().map(Regex::as_str)
    }

    /// Whether weekly-tagged specs may be selected.
    pub fn allows_weekly(&self) -> bool {
        self.force_weekly == Some(true)
    }
}

/// Outcome of resolving the run-mode.
#[derive(Debug, Clone)]
pub struct Selection {
    pub policy: SelectionPolicy,

    /// Explicit spec names, when the mode was not a known keyword.
    pub explicit_names: Option<Vec<String>>,

    /// Route through the small-suite shortcut instead of the packer.
    pub small_suite: bool,
}

/// Look up a known run-mode keyword.
pub fn lookup_mode(keyword: &str, weekly_run: bool) -> Option<&'static RunModeEntry> {
    if keyword == "all" {
        return Some(if weekly_run {
            &ALL_WEEKLY_RUN
        } else {
            &ALL_REGULAR_RUN
        });
    }
    RUN_MODES.iter().find(|m| m.keyword == keyword)
}

/// Resolve a run-mode keyword into a selection.
pub fn resolve(mode: &str, weekly_run: bool) -> Result<Selection> {
    let keyword = match mode.trim() {
        "" => "all",
        other => other,
    };

    if let Some(entry) = lookup_mode(keyword, weekly_run) {
        let policy = SelectionPolicy::from_entry(entry)?;
        info!(
            mode = keyword,
            tag = policy.tag_source().unwrap_or("<none>"),
            invert = policy.invert,
            weekly_run,
            "Resolved run mode"
        );
        return Ok(Selection {
            policy,
            explicit_names: None,
            small_suite: entry.small_suite,
        });
    }

    let names = parse_explicit_names(keyword)?;
    info!(names = ?names, "Treating run mode as explicit spec names");
    Ok(Selection {
        policy: SelectionPolicy::unrestricted(),
        explicit_names: Some(names),
        small_suite: true,
    })
}

/// Split an explicit spec list on `;`. A `,` anywhere is a usage error.
pub fn parse_explicit_names(raw: &str) -> Result<Vec<String>> {
    if raw.contains(',') {
        return Err(PartitionError::AmbiguousDelimiter(raw.to_string()));
    }
    let names: Vec<String> = raw
        .split(';')
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(str::to_string)
        .collect();
    debug!(count = names.len(), "Parsed explicit spec names");
    Ok(names)
}
