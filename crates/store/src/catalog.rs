//! Arm catalog: the ordered mapping from arm id to static arm parameters.
//!
//! The catalog is authored outside the policy core; the core only reads an
//! ordered copy of it and never creates or removes entries.

use parking_lot::RwLock;
use policy_core::error::{PolicyError, PolicyResult};
use policy_core::types::{ArmCatalog, ArmParams};
use serde_json::json;
use std::path::Path;
use tracing::info;

/// Thread-safe in-memory arm catalog, ordered by arm id.
#[derive(Debug)]
pub struct CatalogStore {
    arms: RwLock<ArmCatalog>,
}

impl CatalogStore {
    pub fn new() -> Self {
        Self {
            arms: RwLock::new(ArmCatalog::new()),
        }
    }

    /// Catalog seeded with a small demo arm set, used when no seed file is
    /// configured.
    pub fn with_demo_arms() -> Self {
        let store = Self::new();
        store.upsert(
            "promo_banner".to_string(),
            json!({"kind": "banner", "headline": "Limited Time Offer!", "weight": "promo"}),
        );
        store.upsert(
            "value_banner".to_string(),
            json!({"kind": "banner", "headline": "Save Up To 50%", "weight": "value"}),
        );
        store.upsert(
            "personal_card".to_string(),
            json!({"kind": "card", "headline": "Picked Just For You", "weight": "personal"}),
        );
        info!(arms = store.len(), "Catalog store seeded with demo arms");
        store
    }

    /// Load a catalog from a JSON file shaped `{ "<arm_id>": { ...params } }`.
    pub fn load_from_file(path: impl AsRef<Path>) -> PolicyResult<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let arms: ArmCatalog = serde_json::from_str(&raw)?;
        if arms.is_empty() {
            return Err(PolicyError::Config(format!(
                "catalog file {} contains no arms",
                path.as_ref().display()
            )));
        }
        info!(arms = arms.len(), file = %path.as_ref().display(), "Catalog loaded from file");
        Ok(Self {
            arms: RwLock::new(arms),
        })
    }

    /// Ordered copy of the catalog for one request. Fails when empty: with no
    /// arms there is nothing the sampler could choose.
    pub fn snapshot(&self) -> PolicyResult<ArmCatalog> {
        let arms = self.arms.read();
        if arms.is_empty() {
            return Err(PolicyError::Config("no arms configured".to_string()));
        }
        Ok(arms.clone())
    }

    pub fn upsert(&self, arm_id: String, params: ArmParams) {
        self.arms.write().insert(arm_id, params);
    }

    pub fn remove(&self, arm_id: &str) -> bool {
        self.arms.write().remove(arm_id).is_some()
    }

    pub fn len(&self) -> usize {
        self.arms.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.arms.read().is_empty()
    }
}

impl Default for CatalogStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_catalog_snapshot_is_a_config_error() {
        let store = CatalogStore::new();
        assert!(matches!(
            store.snapshot().unwrap_err(),
            PolicyError::Config(_)
        ));
    }

    #[test]
    fn snapshot_is_ordered_by_arm_id() {
        let store = CatalogStore::new();
        store.upsert("zeta".to_string(), json!({}));
        store.upsert("alpha".to_string(), json!({}));
        store.upsert("mid".to_string(), json!({}));

        let ids: Vec<_> = store.snapshot().unwrap().into_keys().collect();
        assert_eq!(ids, vec!["alpha", "mid", "zeta"]);
    }

    #[test]
    fn upsert_replaces_params_in_place() {
        let store = CatalogStore::new();
        store.upsert("x".to_string(), json!({"v": 1}));
        store.upsert("x".to_string(), json!({"v": 2}));

        let catalog = store.snapshot().unwrap();
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog["x"], json!({"v": 2}));
    }

    #[test]
    fn demo_seed_is_non_empty() {
        let store = CatalogStore::with_demo_arms();
        assert!(!store.is_empty());
        assert!(store.snapshot().is_ok());
    }

    #[test]
    fn load_from_file_round_trips_and_rejects_empty() {
        let dir = std::env::temp_dir();
        let good = dir.join("policy_catalog_good.json");
        std::fs::write(&good, r#"{"a": {"kind": "banner"}, "b": {}}"#).unwrap();
        let store = CatalogStore::load_from_file(&good).unwrap();
        assert_eq!(store.len(), 2);

        let empty = dir.join("policy_catalog_empty.json");
        std::fs::write(&empty, "{}").unwrap();
        assert!(matches!(
            CatalogStore::load_from_file(&empty).unwrap_err(),
            PolicyError::Config(_)
        ));
    }
}
