//! spec-partition - pick and group API specs for parallel CI workers
//!
//! Prints exactly two lines on stdout:
//!
//! 1. the downstream runner command (with tag arguments)
//! 2. the JSON list of groups, `[{"tests": [...], "hasDbless": bool}, ...]`
//!
//! All diagnostics go to stderr. On a usage error nothing is printed on
//! stdout and the process exits non-zero.

use anyhow::{Context, Result};
use clap::builder::BoolishValueParser;
use clap::{ArgAction, Parser, ValueEnum};
use spec_partition_core::config::{
    DEFAULT_DURATION_SUITE, DEFAULT_FALLBACK_BRANCH, DEFAULT_MAX_GROUP_SECS, DEFAULT_RUNNER,
};
use spec_partition_core::{EnvMode, Plan, RunConfig};
use std::path::PathBuf;
use tracing::{debug, info, Level};

#[derive(Parser, Debug)]
#[command(name = "spec-partition")]
#[command(author = "Stevedores Org")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Select API specs and pack them into duration-balanced CI groups", long_about = None)]
struct Cli {
    /// Run mode (all, smoke, non-smoke, oss, aigw, all-except-ai, weekly)
    /// or explicit spec names separated by ';'
    #[arg(short, long, env = "TEST_MODE", default_value = "all")]
    mode: String,

    /// CI reference the branch is derived from (e.g. refs/heads/master)
    #[arg(long, env = "GITHUB_REF", default_value = "")]
    git_ref: String,

    /// Branch name used when the reference yields none
    #[arg(long, env = "FALLBACK_BRANCH", default_value = DEFAULT_FALLBACK_BRANCH)]
    fallback_branch: String,

    /// Skip rules: `name1,name2;branch-pattern:name3` (`false` disables)
    #[arg(long, env = "SKIP_SPECS", default_value = "")]
    skip_rules: String,

    /// Whether this is the weekly CI run
    #[arg(
        long,
        env = "WEEKLY_RUN",
        default_value = "false",
        num_args = 0..=1,
        default_missing_value = "true",
        action = ArgAction::Set,
        value_parser = BoolishValueParser::new()
    )]
    weekly: bool,

    /// Gateway deployment mode
    #[arg(long, env = "GATEWAY_MODE", value_enum, default_value_t = EnvModeArg::Traditional)]
    env_mode: EnvModeArg,

    /// Directory containing the spec corpus
    #[arg(long, env = "SPEC_ROOT", default_value = "test")]
    corpus_root: PathBuf,

    /// Historical duration database (JSON array or JSON lines)
    #[arg(long, env = "SPEC_DURATIONS")]
    durations: Option<PathBuf>,

    /// Suite name selecting duration records
    #[arg(long, env = "DURATION_SUITE", default_value = DEFAULT_DURATION_SUITE)]
    suite: String,

    /// Ceiling on the summed duration of one group, in seconds
    #[arg(long, env = "MAX_GROUP_SECS", default_value_t = DEFAULT_MAX_GROUP_SECS)]
    max_group_secs: f64,

    /// Downstream runner base command
    #[arg(long, env = "SPEC_RUNNER", default_value = DEFAULT_RUNNER)]
    runner: String,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum EnvModeArg {
    Traditional,
    Dbless,
}

impl From<EnvModeArg> for EnvMode {
    fn from(arg: EnvModeArg) -> Self {
        match arg {
            EnvModeArg::Traditional => EnvMode::Traditional,
            EnvModeArg::Dbless => EnvMode::Dbless,
        }
    }
}

impl Cli {
    fn into_config(self) -> RunConfig {
        RunConfig {
            mode: self.mode,
            git_ref: self.git_ref,
            fallback_branch: self.fallback_branch,
            skip_rules: self.skip_rules,
            weekly: self.weekly,
            env_mode: self.env_mode.into(),
            corpus_root: self.corpus_root,
            durations_path: self.durations,
            duration_suite: self.suite,
            max_group_secs: self.max_group_secs,
            runner: self.runner,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    spec_partition_core::init_tracing(cli.json, level);

    let config = cli.into_config();
    if let Ok(echo) = serde_json::to_string(&config) {
        debug!(config = %echo, "Run configuration");
    }

    let plan = Plan::build(&config).context("Failed to plan spec groups")?;
    let digest = plan.digest()?;
    info!(
        groups = plan.groups.len(),
        specs = plan.test_count(),
        digest = %digest,
        "Plan ready"
    );

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    plan.emit(&mut out).context("Failed to write plan to stdout")?;
    Ok(())
}
