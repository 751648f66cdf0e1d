//! Per-step production counters and their normalization.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::process::ProcessStep;

/// Units produced at a step, and units available to be worked at it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepCounters {
    #[serde(default)]
    pub produced: i64,
    #[serde(default)]
    pub available: i64,
}

/// Counters keyed by step, serialized as a JSON object (`{"POTONG": {...}}`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StepStats(BTreeMap<ProcessStep, StepCounters>);

impl StepStats {
    pub fn get(&self, step: ProcessStep) -> Option<&StepCounters> {
        self.0.get(&step)
    }

    pub fn insert(&mut self, step: ProcessStep, counters: StepCounters) {
        self.0.insert(step, counters);
    }

    pub fn contains(&self, step: ProcessStep) -> bool {
        self.0.contains_key(&step)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ProcessStep, &StepCounters)> {
        self.0.iter().map(|(step, counters)| (*step, counters))
    }

    /// Parse stored stats.
    ///
    /// Anything that is not an object is treated as empty. Unknown step keys
    /// and counters that do not parse are dropped.
    pub fn from_stored(raw: &str) -> StepStats {
        let entries = match serde_json::from_str::<Value>(raw) {
            Ok(Value::Object(entries)) => entries,
            Ok(Value::Null) => return StepStats::default(),
            Ok(other) => {
                tracing::warn!(stored = %other, "stored stepStats is not an object, treating as empty");
                return StepStats::default();
            }
            Err(err) => {
                tracing::warn!(error = %err, "stored stepStats is not valid JSON, treating as empty");
                return StepStats::default();
            }
        };

        let mut stats = StepStats::default();
        for (key, value) in entries {
            let Ok(step) = key.parse::<ProcessStep>() else {
                tracing::warn!(step = %key, "dropping stepStats entry for unrecognized step");
                continue;
            };
            match serde_json::from_value::<StepCounters>(value) {
                Ok(counters) => stats.insert(step, counters),
                Err(err) => {
                    tracing::warn!(step = %step, error = %err, "dropping malformed stepStats counters");
                }
            }
        }
        stats
    }
}

impl FromIterator<(ProcessStep, StepCounters)> for StepStats {
    fn from_iter<I: IntoIterator<Item = (ProcessStep, StepCounters)>>(iter: I) -> Self {
        StepStats(iter.into_iter().collect())
    }
}

/// Make sure every step in `processes` has counters.
///
/// Missing steps get `{produced: 0, available: 0}`. Existing entries are left
/// alone and entries for steps no longer in `processes` are kept. When
/// `total_needed` is given (creation and the explicit backfill), the first
/// step's `available` is set to it.
pub fn normalize_step_stats(
    current: StepStats,
    processes: &[ProcessStep],
    total_needed: Option<i64>,
) -> StepStats {
    let mut stats = current;
    for step in processes {
        if !stats.contains(*step) {
            stats.insert(*step, StepCounters::default());
        }
    }

    if let (Some(first), Some(total)) = (processes.first(), total_needed) {
        if let Some(counters) = stats.0.get_mut(first) {
            counters.available = total;
        }
    }

    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use crate::process::ProcessStep::*;

    fn counters(produced: i64, available: i64) -> StepCounters {
        StepCounters {
            produced,
            available,
        }
    }

    #[test]
    fn creation_seeds_first_step_with_total_needed() {
        let stats = normalize_step_stats(StepStats::default(), &[Potong, Plong], Some(200));

        let expected: StepStats = [(Potong, counters(0, 200)), (Plong, counters(0, 0))]
            .into_iter()
            .collect();
        assert_eq!(stats, expected);
    }

    #[test]
    fn update_preserves_existing_and_adds_missing_without_seeding() {
        let current: StepStats = [(Potong, counters(50, 150))].into_iter().collect();

        let stats = normalize_step_stats(current, &[Potong, Plong], None);

        assert_eq!(stats.get(Potong), Some(&counters(50, 150)));
        assert_eq!(stats.get(Plong), Some(&counters(0, 0)));
        assert_eq!(stats.len(), 2);
    }

    #[test]
    fn stale_entries_are_kept() {
        let current: StepStats = [(Las, counters(3, 0))].into_iter().collect();
        let stats = normalize_step_stats(current, &[Cat], None);
        assert!(stats.contains(Las));
        assert!(stats.contains(Cat));
    }

    #[test]
    fn empty_process_list_leaves_stats_unchanged() {
        let current: StepStats = [(Press, counters(1, 2))].into_iter().collect();
        assert_eq!(normalize_step_stats(current.clone(), &[], Some(99)), current);
    }

    #[test]
    fn stored_stats_drop_unknown_and_malformed_entries() {
        let stats = StepStats::from_stored(
            r#"{"POTONG": {"produced": 5, "available": 10}, "GRINDING": {"produced": 1}, "LAS": "x"}"#,
        );
        let expected: StepStats = [(Potong, counters(5, 10))].into_iter().collect();
        assert_eq!(stats, expected);
    }

    #[test]
    fn non_object_stored_stats_are_empty() {
        assert!(StepStats::from_stored("[1, 2]").is_empty());
        assert!(StepStats::from_stored("null").is_empty());
        assert!(StepStats::from_stored("{oops").is_empty());
    }

    #[test]
    fn stats_serialize_as_step_keyed_object() {
        let stats: StepStats = [(Plong, counters(0, 0)), (Potong, counters(0, 200))]
            .into_iter()
            .collect();
        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "POTONG": { "produced": 0, "available": 200 },
                "PLONG": { "produced": 0, "available": 0 }
            })
        );
    }

    fn step() -> impl Strategy<Value = ProcessStep> {
        prop::sample::select(ProcessStep::ALL.to_vec())
    }

    fn stats() -> impl Strategy<Value = StepStats> {
        prop::collection::btree_map(step(), (0i64..1000, 0i64..1000), 0..7).prop_map(|m| {
            m.into_iter()
                .map(|(s, (p, a))| (s, counters(p, a)))
                .collect()
        })
    }

    proptest! {
        #[test]
        fn normalizing_twice_changes_nothing(
            current in stats(),
            processes in prop::collection::vec(step(), 0..7),
        ) {
            let once = normalize_step_stats(current, &processes, None);
            let twice = normalize_step_stats(once.clone(), &processes, None);
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn seeding_does_not_refire_after_creation(
            processes in prop::collection::vec(step(), 1..7),
            total in 0i64..10_000,
            produced in 0i64..100,
        ) {
            let mut created = normalize_step_stats(StepStats::default(), &processes, Some(total));
            let first = processes[0];
            created.insert(first, counters(produced, total - produced));

            let reread = normalize_step_stats(created.clone(), &processes, None);
            prop_assert_eq!(reread.get(first), Some(&counters(produced, total - produced)));
        }

        #[test]
        fn only_listed_or_existing_steps_appear(
            current in stats(),
            processes in prop::collection::vec(step(), 0..7),
        ) {
            let normalized = normalize_step_stats(current.clone(), &processes, None);
            for (step, _) in normalized.iter() {
                prop_assert!(current.contains(step) || processes.contains(&step));
            }
        }
    }
}
