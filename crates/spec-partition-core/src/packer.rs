//! Duration-aware bin packing.
//!
//! First-Fit-Decreasing: specs are sorted by expected duration (longest
//! first, ties in discovery order) and each goes into the first open group
//! with room left under the ceiling. A spec that fits nowhere opens a new
//! group, so a spec longer than the ceiling still gets a group of its own.

use crate::durations::DurationMap;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use tracing::debug;

/// One bundle of specs handed to a single worker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    pub tests: Vec<String>,
    pub has_dbless: bool,
}

impl Group {
    pub fn new(tests: Vec<String>, has_dbless: bool) -> Self {
        Self { tests, has_dbless }
    }

    /// Sum of expected durations of the members.
    pub fn total_secs(&self, durations: &DurationMap) -> f64 {
        self.tests.iter().map(|t| durations.get(t)).sum()
    }
}

struct OpenGroup {
    tests: Vec<String>,
    total: f64,
}

/// Pack one partition into groups whose summed duration stays within
/// `max_secs`. An empty partition produces no groups.
pub fn pack(
    durations: &DurationMap,
    specs: &[String],
    has_dbless: bool,
    max_secs: f64,
) -> Vec<Group> {
    let mut weighted: Vec<(&String, f64)> =
        specs.iter().map(|s| (s, durations.get(s))).collect();

    // Stable: equal durations keep discovery order.
    weighted.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));

    let mut open: Vec<OpenGroup> = Vec::new();
    for (spec, secs) in weighted {
        match open.iter_mut().find(|g| g.total + secs <= max_secs) {
            Some(group) => {
                group.tests.push(spec.clone());
                group.total += secs;
            }
            None => open.push(OpenGroup {
                tests: vec![spec.clone()],
                total: secs,
            }),
        }
    }

    for (idx, group) in open.iter().enumerate() {
        debug!(
            group = idx,
            has_dbless,
            specs = group.tests.len(),
            total_secs = group.total,
            "Packed group"
        );
    }

    open.into_iter()
        .map(|g| Group::new(g.tests, has_dbless))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn durations(entries: &[(&str, f64)]) -> DurationMap {
        entries.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    fn ids(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_first_fit_decreasing_example() {
        let d = durations(&[("a", 100.0), ("b", 400.0), ("c", 450.0)]);
        let groups = pack(&d, &ids(&["a", "b", "c"]), false, 900.0);
        assert_eq!(
            groups,
            vec![
                Group::new(ids(&["c", "b"]), false),
                Group::new(ids(&["a"]), false),
            ]
        );
        assert_eq!(groups[0].total_secs(&d), 850.0);
    }

    #[test]
    fn test_empty_input_yields_no_groups() {
        let groups = pack(&DurationMap::new(), &[], true, 900.0);
        assert!(groups.is_empty());
    }

    #[test]
    fn test_oversized_spec_gets_own_group() {
        let d = durations(&[("huge", 2000.0), ("small", 10.0)]);
        let groups = pack(&d, &ids(&["small", "huge"]), false, 900.0);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].tests, ids(&["huge"]));
        assert_eq!(groups[1].tests, ids(&["small"]));
    }

    #[test]
    fn test_ties_keep_discovery_order() {
        let d = durations(&[("x", 300.0), ("y", 300.0), ("z", 300.0), ("w", 300.0)]);
        let groups = pack(&d, &ids(&["x", "y", "z", "w"]), false, 600.0);
        assert_eq!(groups[0].tests, ids(&["x", "y"]));
        assert_eq!(groups[1].tests, ids(&["z", "w"]));
    }

    #[test]
    fn test_unknown_specs_weigh_nothing() {
        let d = durations(&[("a", 900.0)]);
        let groups = pack(&d, &ids(&["new-1", "a", "new-2"]), false, 900.0);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].tests, ids(&["a", "new-1", "new-2"]));
    }

    #[test]
    fn test_later_spec_backfills_earlier_group() {
        let d = durations(&[("a", 500.0), ("b", 500.0), ("c", 400.0)]);
        let groups = pack(&d, &ids(&["a", "b", "c"]), true, 900.0);
        assert_eq!(groups[0].tests, ids(&["a", "c"]));
        assert_eq!(groups[1].tests, ids(&["b"]));
        assert!(groups.iter().all(|g| g.has_dbless));
    }

    #[test]
    fn test_group_json_shape() {
        let group = Group::new(ids(&["a.spec.ts"]), true);
        let json = serde_json::to_string(&group).expect("serialize");
        assert_eq!(json, r#"{"tests":["a.spec.ts"],"hasDbless":true}"#);
    }

    #[test]
    fn test_caps_and_coverage_hold() {
        let entries: Vec<(String, f64)> = (0..40)
            .map(|i| (format!("spec-{i}"), ((i * 37) % 500) as f64))
            .collect();
        let d: DurationMap = entries.iter().cloned().collect();
        let specs: Vec<String> = entries.iter().map(|(k, _)| k.clone()).collect();

        let groups = pack(&d, &specs, false, 900.0);

        for group in &groups {
            assert!(group.total_secs(&d) <= 900.0 || group.tests.len() == 1);
        }
        let mut seen: Vec<String> = groups.iter().flat_map(|g| g.tests.clone()).collect();
        seen.sort();
        let mut expected = specs.clone();
        expected.sort();
        assert_eq!(seen, expected);
    }
}
