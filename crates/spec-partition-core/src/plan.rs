//! End-to-end planning and the stdout protocol.
//!
//! A run produces exactly two lines for the CI workflow: the runner command
//! and the JSON group list. Nothing else may reach stdout.

use crate::branch::normalize_branch;
use crate::config::RunConfig;
use crate::corpus::{discover, discover_named, CorpusFilter, Partitions};
use crate::durations::DurationMap;
use crate::error::{PartitionError, Result};
use crate::packer::{pack, Group};
use crate::selection::{resolve, SelectionPolicy};
use crate::skip::SkipSet;
use sha2::{Digest, Sha256};
use std::io::Write;
use tracing::info;

/// Final output of one run.
#[derive(Debug, Clone, PartialEq)]
pub struct Plan {
    /// Downstream runner command line.
    pub command: String,

    /// Groups in emission order: db-less groups first.
    pub groups: Vec<Group>,
}

impl Plan {
    /// Resolve, discover, filter and group according to `config`.
    pub fn build(config: &RunConfig) -> Result<Self> {
        let selection = resolve(&config.mode, config.weekly)?;
        let branch = normalize_branch(&config.git_ref, &config.fallback_branch);
        let skips = SkipSet::parse(&config.skip_rules, &branch);
        info!(branch = %branch, skip_patterns = skips.len(), "Resolved branch");

        let specs = match &selection.explicit_names {
            Some(names) => discover_named(&config.corpus_root, names)?,
            None => discover(&config.corpus_root)?
                .into_iter()
                .filter(|s| !skips.matches(&s.identifier))
                .collect(),
        };

        let filter = CorpusFilter::new(&selection.policy, &skips, config.env_mode);
        let partitions = filter.apply(&specs);

        let groups = if selection.small_suite {
            info!("Small suite, emitting one group per partition");
            single_groups(&partitions)
        } else {
            let durations = match &config.durations_path {
                Some(path) => DurationMap::load(path, &config.duration_suite)?,
                None => DurationMap::new(),
            };
            balanced_groups(&durations, &partitions, config.max_group_secs)
        };

        Ok(Self {
            command: runner_command(&config.runner, &selection.policy),
            groups,
        })
    }

    /// The two protocol lines, newline-terminated.
    pub fn render(&self) -> Result<String> {
        let groups = serde_json::to_string(&self.groups)?;
        Ok(format!("{}\n{}\n", self.command, groups))
    }

    /// SHA-256 of the rendered protocol lines.
    pub fn digest(&self) -> Result<String> {
        let mut hasher = Sha256::new();
        hasher.update(self.render()?.as_bytes());
        Ok(hex::encode(hasher.finalize()))
    }

    /// Write both protocol lines in a single write.
    pub fn emit(&self, out: &mut impl Write) -> Result<()> {
        let rendered = self.render()?;
        out.write_all(rendered.as_bytes())
            .and_then(|_| out.flush())
            .map_err(PartitionError::Output)
    }

    pub fn test_count(&self) -> usize {
        self.groups.iter().map(|g| g.tests.len()).sum()
    }
}

/// One group per non-empty partition, db-less first.
pub fn single_groups(partitions: &Partitions) -> Vec<Group> {
    let mut groups = Vec::with_capacity(2);
    if !partitions.dbless.is_empty() {
        groups.push(Group::new(partitions.dbless.clone(), true));
    }
    if !partitions.remainder.is_empty() {
        groups.push(Group::new(partitions.remainder.clone(), false));
    }
    groups
}

/// Pack each partition independently and concatenate, db-less first.
pub fn balanced_groups(
    durations: &DurationMap,
    partitions: &Partitions,
    max_secs: f64,
) -> Vec<Group> {
    let mut groups = pack(durations, &partitions.dbless, true, max_secs);
    groups.extend(pack(durations, &partitions.remainder, false, max_secs));
    for (idx, group) in groups.iter().enumerate() {
        info!(
            group = idx,
            has_dbless = group.has_dbless,
            specs = group.tests.len(),
            total_secs = group.total_secs(durations),
            "Scheduled group"
        );
    }
    groups
}

/// Runner base command plus tag arguments.
pub fn runner_command(runner: &str, policy: &SelectionPolicy) -> String {
    let mut command = runner.trim().to_string();
    if let Some(tag) = policy.tag_source() {
        command.push_str(&format!(" --grep '{}'", tag));
    }
    if policy.invert {
        command.push_str(" --invert");
    }
    command
}
