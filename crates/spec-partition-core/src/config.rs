//! Run configuration.
//!
//! Everything a partitioning run depends on is captured once, up front, in a
//! [`RunConfig`]. Library code never consults the process environment.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default ceiling, in seconds, on the summed duration of one packed group.
pub const DEFAULT_MAX_GROUP_SECS: f64 = 900.0;

/// Suffix every specification file carries.
pub const SPEC_SUFFIX: &str = ".spec.ts";

/// Branch name used when the CI reference yields nothing.
pub const DEFAULT_FALLBACK_BRANCH: &str = "unknown";

/// Suite name selecting records in the duration database.
pub const DEFAULT_DURATION_SUITE: &str = "api-tests";

/// Downstream runner invocation preceding the tag arguments.
pub const DEFAULT_RUNNER: &str = "npx mocha";

/// Tag annotations detected in raw spec content.
pub mod tags {
    pub const SMOKE: &str = "@smoke";
    pub const WEEKLY: &str = "@weekly";
    pub const DBLESS: &str = "@dbless";
    pub const OSS: &str = "@oss";
    pub const AIGW: &str = "@aigw";
    pub const AI_PLUGINS: &str = "@ai-plugins";
}

/// Gateway deployment mode the selected specs will run against.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum EnvMode {
    /// Database-backed gateway; every spec is eligible.
    #[default]
    Traditional,

    /// Database-less gateway; only `@dbless` specs are eligible.
    Dbless,
}

impl EnvMode {
    /// Whether a spec must carry the db-less tag to be eligible.
    pub fn requires_dbless(&self) -> bool {
        matches!(self, EnvMode::Dbless)
    }
}

/// Immutable configuration for one partitioning run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Run-mode keyword or explicit `;`-separated spec names.
    pub mode: String,

    /// CI reference the branch name is derived from (e.g. `refs/heads/master`).
    pub git_ref: String,

    /// Branch name used when `git_ref` normalizes to nothing.
    pub fallback_branch: String,

    /// Raw branch-skip rule string.
    pub skip_rules: String,

    /// Whether this CI run is the weekly run.
    pub weekly: bool,

    /// Gateway deployment mode.
    pub env_mode: EnvMode,

    /// Directory the spec corpus lives under.
    pub corpus_root: PathBuf,

    /// Historical duration database, if any.
    pub durations_path: Option<PathBuf>,

    /// Suite name selecting duration records.
    pub duration_suite: String,

    /// Packing ceiling in seconds.
    pub max_group_secs: f64,

    /// Downstream runner base command.
    pub runner: String,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            mode: "all".to_string(),
            git_ref: String::new(),
            fallback_branch: DEFAULT_FALLBACK_BRANCH.to_string(),
            skip_rules: String::new(),
            weekly: false,
            env_mode: EnvMode::default(),
            corpus_root: PathBuf::from("test"),
            durations_path: None,
            duration_suite: DEFAULT_DURATION_SUITE.to_string(),
            max_group_secs: DEFAULT_MAX_GROUP_SECS,
            runner: DEFAULT_RUNNER.to_string(),
        }
    }
}
