//! Spec discovery and filtering.

use crate::config::{tags, EnvMode, SPEC_SUFFIX};
use crate::error::{PartitionError, Result};
use crate::pattern::glob_matches;
use crate::selection::SelectionPolicy;
use crate::skip::{spec_base_name, SkipSet};
use std::path::Path;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// A discovered specification file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecRecord {
    /// Path relative to the corpus root, `/`-separated.
    pub identifier: String,

    /// File content, used only for tag detection.
    pub raw_content: String,
}

impl SpecRecord {
    pub fn new(identifier: impl Into<String>, raw_content: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            raw_content: raw_content.into(),
        }
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.raw_content.contains(tag)
    }

    pub fn base_name(&self) -> &str {
        spec_base_name(&self.identifier)
    }
}

/// Discover every spec file under `root`, sorted by identifier.
pub fn discover(root: &Path) -> Result<Vec<SpecRecord>> {
    discover_matching(root, |_| true)
}

/// Discover spec files whose base name matches one of `names`
/// (exact name or `*` glob).
pub fn discover_named(root: &Path, names: &[String]) -> Result<Vec<SpecRecord>> {
    let specs = discover_matching(root, |base| {
        names.iter().any(|name| glob_matches(name, base))
    })?;

    for name in names {
        if !specs.iter().any(|s| glob_matches(name, s.base_name())) {
            warn!(name = %name, "No spec file matches explicit name");
        }
    }
    Ok(specs)
}

fn discover_matching(root: &Path, keep: impl Fn(&str) -> bool) -> Result<Vec<SpecRecord>> {
    if !root.exists() {
        warn!(root = %root.display(), "Spec corpus root does not exist");
        return Ok(Vec::new());
    }

    let mut specs = Vec::new();
    for entry in WalkDir::new(root).follow_links(true) {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(root).to_path_buf();
            PartitionError::io(path, e.into())
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let Some(identifier) = identifier_for(root, entry.path()) else {
            continue;
        };
        if !identifier.ends_with(SPEC_SUFFIX) || !keep(spec_base_name(&identifier)) {
            continue;
        }
        // Tags are ASCII, so a lossy decode is enough.
        let bytes = std::fs::read(entry.path()).map_err(|e| PartitionError::io(entry.path(), e))?;
        let raw_content = String::from_utf8_lossy(&bytes).into_owned();
        specs.push(SpecRecord {
            identifier,
            raw_content,
        });
    }

    specs.sort_by(|a, b| a.identifier.cmp(&b.identifier));
    debug!(root = %root.display(), count = specs.len(), "Discovered specs");
    Ok(specs)
}

fn identifier_for(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let parts: Vec<String> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("/"))
    }
}

/// Selected specs split by db-less compatibility.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Partitions {
    /// Specs tagged `@dbless`.
    pub dbless: Vec<String>,

    /// Everything else.
    pub remainder: Vec<String>,
}

impl Partitions {
    pub fn len(&self) -> usize {
        self.dbless.len() + self.remainder.len()
    }
}

/// Applies selection policy, weekly suppression, environment mode and skip
/// rules to a corpus.
pub struct CorpusFilter<'a> {
    policy: &'a SelectionPolicy,
    skips: &'a SkipSet,
    env_mode: EnvMode,
}

impl<'a> CorpusFilter<'a> {
    pub fn new(policy: &'a SelectionPolicy, skips: &'a SkipSet, env_mode: EnvMode) -> Self {
        Self {
            policy,
            skips,
            env_mode,
        }
    }

    /// Whether a single spec is selected.
    pub fn includes(&self, spec: &SpecRecord) -> bool {
        if self.skips.matches(&spec.identifier) {
            debug!(spec = %spec.identifier, "Skipped by skip rule");
            return false;
        }

        let tag_match = self
            .policy
            .tag_pattern
            .as_ref()
            .map_or(true, |re| re.is_match(&spec.raw_content));
        let weekly_ok = !spec.has_tag(tags::WEEKLY) || self.policy.allows_weekly();
        let env_ok = !self.env_mode.requires_dbless() || spec.has_tag(tags::DBLESS);

        let selected = tag_match != self.policy.invert && weekly_ok && env_ok;
        if !selected {
            return false;
        }

        // Explicit-name discovery bypasses the corpus-wide pass, so skip rules
        // are checked again on the way out.
        !self.skips.matches(&spec.identifier)
    }

    /// Select specs and split them into partitions, keeping discovery order.
    pub fn apply(&self, specs: &[SpecRecord]) -> Partitions {
        let mut partitions = Partitions::default();
        for spec in specs.iter().filter(|s| self.includes(s)) {
            if spec.has_tag(tags::DBLESS) {
                partitions.dbless.push(spec.identifier.clone());
            } else {
                partitions.remainder.push(spec.identifier.clone());
            }
        }
        info!(
            discovered = specs.len(),
            dbless = partitions.dbless.len(),
            remainder = partitions.remainder.len(),
            "Filtered spec corpus"
        );
        partitions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selection::resolve;

    fn corpus() -> Vec<SpecRecord> {
        vec![
            SpecRecord::new("gateway/consumers.spec.ts", "describe('Consumers @smoke @dbless')"),
            SpecRecord::new("gateway/routes.spec.ts", "describe('Routes @smoke')"),
            SpecRecord::new("gateway/plugins.spec.ts", "describe('Plugins')"),
            SpecRecord::new("gateway/oss-only.spec.ts", "describe('OSS build @oss')"),
            SpecRecord::new("gateway/soak.spec.ts", "describe('Soak @weekly')"),
            SpecRecord::new("gateway/soak-dbless.spec.ts", "describe('Soak @weekly @dbless')"),
            SpecRecord::new("ai/ai-proxy.spec.ts", "describe('AI Proxy @aigw')"),
            SpecRecord::new("ai/ai-plugins.spec.ts", "describe('AI Plugins @ai-plugins')"),
        ]
    }

    fn run(mode: &str, weekly: bool, env: EnvMode, skip: &str) -> Partitions {
        let sel = resolve(mode, weekly).expect("resolve");
        let skips = SkipSet::parse(skip, "master");
        CorpusFilter::new(&sel.policy, &skips, env).apply(&corpus())
    }

    #[test]
    fn test_smoke_mode() {
        let p = run("smoke", false, EnvMode::Traditional, "");
        assert_eq!(p.dbless, vec!["gateway/consumers.spec.ts"]);
        assert_eq!(p.remainder, vec!["gateway/routes.spec.ts"]);
    }

    #[test]
    fn test_non_smoke_excludes_smoke_and_weekly() {
        let p = run("non-smoke", false, EnvMode::Traditional, "");
        assert!(p.dbless.is_empty());
        assert_eq!(
            p.remainder,
            vec![
                "gateway/plugins.spec.ts",
                "gateway/oss-only.spec.ts",
                "ai/ai-proxy.spec.ts",
                "ai/ai-plugins.spec.ts",
            ]
        );
    }

    #[test]
    fn test_weekly_run_keeps_weekly_out_of_tagged_modes() {
        for mode in ["smoke", "non-smoke", "oss", "aigw", "all-except-ai"] {
            let p = run(mode, true, EnvMode::Traditional, "");
            assert_eq!(p, run(mode, false, EnvMode::Traditional, ""), "mode {mode}");
            assert!(!p.remainder.contains(&"gateway/soak.spec.ts".to_string()));
            assert!(!p.dbless.contains(&"gateway/soak-dbless.spec.ts".to_string()));
        }
    }

    #[test]
    fn test_oss_mode() {
        let p = run("oss", false, EnvMode::Traditional, "");
        assert!(p.dbless.is_empty());
        assert_eq!(p.remainder, vec!["gateway/oss-only.spec.ts"]);
    }

    #[test]
    fn test_aigw_mode() {
        let p = run("aigw", false, EnvMode::Traditional, "");
        assert!(p.dbless.is_empty());
        assert_eq!(p.remainder, vec!["ai/ai-proxy.spec.ts"]);
    }

    #[test]
    fn test_all_except_ai_drops_both_ai_tags() {
        let p = run("all-except-ai", false, EnvMode::Traditional, "");
        assert_eq!(p.dbless, vec!["gateway/consumers.spec.ts"]);
        assert_eq!(
            p.remainder,
            vec![
                "gateway/routes.spec.ts",
                "gateway/plugins.spec.ts",
                "gateway/oss-only.spec.ts",
            ]
        );
    }

    #[test]
    fn test_all_regular_run_drops_weekly() {
        let p = run("all", false, EnvMode::Traditional, "");
        assert_eq!(p.len(), 6);
        assert!(!p.remainder.contains(&"gateway/soak.spec.ts".to_string()));
    }

    #[test]
    fn test_all_weekly_run_keeps_everything() {
        let p = run("all", true, EnvMode::Traditional, "");
        assert_eq!(p.len(), 8);
        assert_eq!(
            p.dbless,
            vec!["gateway/consumers.spec.ts", "gateway/soak-dbless.spec.ts"]
        );
    }

    #[test]
    fn test_weekly_mode_selects_only_weekly() {
        let p = run("weekly", false, EnvMode::Traditional, "");
        assert_eq!(p.dbless, vec!["gateway/soak-dbless.spec.ts"]);
        assert_eq!(p.remainder, vec!["gateway/soak.spec.ts"]);
    }

    #[test]
    fn test_dbless_env_requires_tag() {
        let p = run("all", true, EnvMode::Dbless, "");
        assert!(p.remainder.is_empty());
        assert_eq!(p.dbless.len(), 2);
    }

    #[test]
    fn test_skip_rules_remove_specs() {
        let p = run("smoke", false, EnvMode::Traditional, "master:consumers");
        assert!(p.dbless.is_empty());
        assert_eq!(p.remainder, vec!["gateway/routes.spec.ts"]);
    }

    #[test]
    fn test_partitions_are_disjoint() {
        let p = run("all", true, EnvMode::Traditional, "");
        for id in &p.dbless {
            assert!(!p.remainder.contains(id));
        }
    }

    #[test]
    fn test_discover_walks_and_sorts() {
        let dir = tempfile::tempdir().expect("tempdir");
        let nested = dir.path().join("gateway");
        std::fs::create_dir_all(&nested).expect("mkdir");
        std::fs::write(nested.join("b.spec.ts"), "@smoke").expect("write");
        std::fs::write(dir.path().join("a.spec.ts"), "").expect("write");
        std::fs::write(dir.path().join("helper.ts"), "").expect("write");

        let specs = discover(dir.path()).expect("discover");
        let ids: Vec<_> = specs.iter().map(|s| s.identifier.as_str()).collect();
        assert_eq!(ids, vec!["a.spec.ts", "gateway/b.spec.ts"]);
        assert!(specs[1].has_tag("@smoke"));
    }

    #[test]
    fn test_discover_named() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("routes.spec.ts"), "").expect("write");
        std::fs::write(dir.path().join("routes-expressions.spec.ts"), "").expect("write");
        std::fs::write(dir.path().join("services.spec.ts"), "").expect("write");

        let exact = discover_named(dir.path(), &["routes".to_string()]).expect("discover");
        assert_eq!(exact.len(), 1);

        let glob = discover_named(dir.path(), &["routes*".to_string()]).expect("discover");
        assert_eq!(glob.len(), 2);
    }

    #[test]
    fn test_discover_tolerates_invalid_utf8() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("binary.spec.ts"), b"\xff\xfe describe('@smoke')")
            .expect("write");
        std::fs::write(dir.path().join("plain.spec.ts"), "").expect("write");

        let specs = discover(dir.path()).expect("discover");
        assert_eq!(specs.len(), 2);
        assert_eq!(specs[0].identifier, "binary.spec.ts");
        assert!(specs[0].has_tag("@smoke"));
    }

    #[test]
    fn test_missing_root_is_empty() {
        let dir = tempfile::tempdir().expect("tempdir");
        let specs = discover(&dir.path().join("absent")).expect("discover");
        assert!(specs.is_empty());
    }
}
