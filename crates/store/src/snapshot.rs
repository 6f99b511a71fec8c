//! Append-only snapshot store for policy states, keyed by (project, period).
//!
//! Snapshots are immutable once written; the latest version for a key is the
//! one read back on the next request. The read-modify-write cycle around a
//! reward report is a lost-update race if two reports for the same key run
//! concurrently, so `update_latest` holds the key's map entry for the whole
//! cycle. The bandit core stays value-in/value-out and knows nothing of this.

use chrono::Utc;
use dashmap::DashMap;
use policy_core::error::PolicyResult;
use policy_core::types::{PolicyState, Snapshot};
use tracing::debug;
use uuid::Uuid;

type SnapshotKey = (String, String);

/// Thread-safe in-memory snapshot log with a bounded per-key history.
pub struct SnapshotStore {
    snapshots: DashMap<SnapshotKey, Vec<Snapshot>>,
    max_history: usize,
}

impl SnapshotStore {
    /// `max_history` caps the per-key log; the oldest snapshots past the cap
    /// are dropped, the latest is always retained.
    pub fn new(max_history: usize) -> Self {
        Self {
            snapshots: DashMap::new(),
            max_history: max_history.max(1),
        }
    }

    /// Most recently created snapshot for the key, if any.
    pub fn latest(&self, project_id: &str, period: &str) -> Option<Snapshot> {
        self.snapshots
            .get(&(project_id.to_string(), period.to_string()))
            .and_then(|entry| entry.value().last().cloned())
    }

    /// Full retained history for the key, oldest first.
    pub fn history(&self, project_id: &str, period: &str) -> Vec<Snapshot> {
        self.snapshots
            .get(&(project_id.to_string(), period.to_string()))
            .map(|entry| entry.value().clone())
            .unwrap_or_default()
    }

    /// Append a state as a fresh snapshot without reading the prior one.
    pub fn append(&self, project_id: &str, period: &str, state: PolicyState) -> Snapshot {
        let key = (project_id.to_string(), period.to_string());
        let mut entry = self.snapshots.entry(key).or_default();
        self.persist(entry.value_mut(), project_id, period, state)
    }

    /// Run `f` on the key's latest state and persist its result as a new
    /// snapshot, all while holding the key's entry. Concurrent calls for the
    /// same key serialize here, so no reward report can overwrite another's
    /// revision; distinct keys proceed in parallel on separate shards.
    pub fn update_latest(
        &self,
        project_id: &str,
        period: &str,
        f: impl FnOnce(Option<&PolicyState>) -> PolicyResult<PolicyState>,
    ) -> PolicyResult<Snapshot> {
        let key = (project_id.to_string(), period.to_string());
        let mut entry = self.snapshots.entry(key).or_default();
        let history = entry.value_mut();

        let new_state = f(history.last().map(|snapshot| &snapshot.state))?;
        Ok(self.persist(history, project_id, period, new_state))
    }

    fn persist(
        &self,
        history: &mut Vec<Snapshot>,
        project_id: &str,
        period: &str,
        state: PolicyState,
    ) -> Snapshot {
        let version = history.last().map(|snapshot| snapshot.version).unwrap_or(0) + 1;
        let snapshot = Snapshot {
            id: Uuid::new_v4(),
            project_id: project_id.to_string(),
            period: period.to_string(),
            version,
            state,
            created_at: Utc::now(),
        };
        history.push(snapshot.clone());

        if history.len() > self.max_history {
            let excess = history.len() - self.max_history;
            history.drain(..excess);
        }

        debug!(
            project_id,
            period,
            version,
            snapshot_id = %snapshot.id,
            "snapshot persisted"
        );
        snapshot
    }

    /// Number of (project, period) keys with at least one snapshot.
    pub fn key_count(&self) -> usize {
        self.snapshots.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use policy_core::types::ArmBelief;
    use std::sync::Arc;

    fn state_with_counter(count: f64) -> PolicyState {
        let mut state = PolicyState::empty();
        state
            .arms
            .insert("x".to_string(), ArmBelief::new(1.0 + count, 1.0));
        state
    }

    // 1. Ordering and versions ----------------------------------------------

    #[test]
    fn latest_returns_most_recent_snapshot() {
        let store = SnapshotStore::new(16);
        assert!(store.latest("p", "2026-08").is_none());

        store.append("p", "2026-08", state_with_counter(1.0));
        store.append("p", "2026-08", state_with_counter(2.0));

        let latest = store.latest("p", "2026-08").unwrap();
        assert_eq!(latest.version, 2);
        assert_eq!(latest.state, state_with_counter(2.0));
    }

    #[test]
    fn versions_increase_monotonically_per_key() {
        let store = SnapshotStore::new(16);
        for i in 0..5 {
            let snapshot = store.append("p", "2026-08", state_with_counter(i as f64));
            assert_eq!(snapshot.version, i + 1);
        }
        // A different key starts its own sequence.
        assert_eq!(store.append("p", "2026-09", state_with_counter(0.0)).version, 1);
        assert_eq!(store.key_count(), 2);
    }

    #[test]
    fn snapshots_are_never_mutated_in_place() {
        let store = SnapshotStore::new(16);
        let first = store.append("p", "2026-08", state_with_counter(1.0));
        store.append("p", "2026-08", state_with_counter(2.0));

        let history = store.history("p", "2026-08");
        assert_eq!(history.len(), 2);
        assert_eq!(history[0], first);
    }

    // 2. History bound ------------------------------------------------------

    #[test]
    fn history_trims_oldest_but_keeps_latest() {
        let store = SnapshotStore::new(3);
        for i in 0..10 {
            store.append("p", "2026-08", state_with_counter(i as f64));
        }

        let history = store.history("p", "2026-08");
        assert_eq!(history.len(), 3);
        assert_eq!(history[0].version, 8);
        assert_eq!(store.latest("p", "2026-08").unwrap().version, 10);
    }

    // 3. Per-key serialization ----------------------------------------------

    #[test]
    fn concurrent_updates_never_lose_a_revision() {
        let store = Arc::new(SnapshotStore::new(1024));
        let threads = 8;
        let updates_per_thread = 25;

        let handles: Vec<_> = (0..threads)
            .map(|_| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    for _ in 0..updates_per_thread {
                        store
                            .update_latest("p", "2026-08", |prior| {
                                let mut state =
                                    prior.cloned().unwrap_or_else(PolicyState::empty);
                                let belief = state
                                    .arms
                                    .entry("x".to_string())
                                    .or_insert(ArmBelief::PRIOR);
                                belief.a += 1.0;
                                Ok(state)
                            })
                            .unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let total = (threads * updates_per_thread) as f64;
        let latest = store.latest("p", "2026-08").unwrap();
        assert_eq!(latest.version, total as u64);
        assert!((latest.state.arms["x"].a - (1.0 + total)).abs() < f64::EPSILON);
    }

    #[test]
    fn failed_closure_persists_nothing() {
        let store = SnapshotStore::new(16);
        let result = store.update_latest("p", "2026-08", |_| {
            Err(policy_core::PolicyError::Config("boom".to_string()))
        });
        assert!(result.is_err());
        assert!(store.latest("p", "2026-08").is_none());
    }
}
