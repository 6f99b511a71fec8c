//! The two operations exposed to the service layer: select an arm for a
//! (project, period) key, and fold a reward back into the state.

use crate::{sampler, state, updater};
use policy_core::error::{PolicyError, PolicyResult};
use policy_core::types::{ArmBelief, ArmCatalog, ArmId, ArmParams, PolicyState};
use rand::Rng;
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Stateless facade over the bandit core. Each call takes the catalog and the
/// caller's latest persisted state and returns a fresh state; nothing is held
/// between calls, so persistence and its serialization stay with the caller.
pub struct PolicyEngine {
    default_promo_ratio: f64,
}

impl PolicyEngine {
    pub fn new(default_promo_ratio: f64) -> Self {
        Self {
            default_promo_ratio,
        }
    }

    /// Complete the state against the catalog, Thompson-sample one arm, and
    /// return its id and catalog params alongside the completed state.
    ///
    /// Only arms currently in the catalog are candidates; stale beliefs are
    /// carried in the returned state but never selected.
    pub fn select_arm<R: Rng>(
        &self,
        project_id: &str,
        period: &str,
        catalog: &ArmCatalog,
        prior: Option<PolicyState>,
        rng: &mut R,
    ) -> PolicyResult<(ArmId, ArmParams, PolicyState)> {
        if catalog.is_empty() {
            return Err(PolicyError::Config("arm catalog is empty".to_string()));
        }

        let state = state::complete(catalog.keys(), prior, self.default_promo_ratio);

        let candidates: BTreeMap<ArmId, ArmBelief> = state
            .arms
            .iter()
            .filter(|(id, _)| catalog.contains_key(*id))
            .map(|(id, belief)| (id.clone(), *belief))
            .collect();

        let arm_id = match sampler::choose(&candidates, rng) {
            Some(id) => id,
            None => {
                // Completion guarantees one belief per catalog arm, so this
                // only covers a candidate map emptied out from under us.
                warn!(project_id, period, "no candidate beliefs, falling back to first catalog arm");
                catalog
                    .keys()
                    .next()
                    .cloned()
                    .ok_or_else(|| PolicyError::Config("arm catalog is empty".to_string()))?
            }
        };

        let arm_params = catalog.get(&arm_id).cloned().unwrap_or_default();

        debug!(project_id, period, arm_id = %arm_id, "arm selected");
        Ok((arm_id, arm_params, state))
    }

    /// Complete the state against the catalog and revise the chosen arm's
    /// belief with the observed reward. The caller persists the returned
    /// state as a new snapshot.
    pub fn record_reward(
        &self,
        project_id: &str,
        period: &str,
        catalog: &ArmCatalog,
        prior: Option<PolicyState>,
        arm_id: &str,
        reward: f64,
    ) -> PolicyResult<PolicyState> {
        if catalog.is_empty() {
            return Err(PolicyError::Config("arm catalog is empty".to_string()));
        }
        if !reward.is_finite() {
            return Err(PolicyError::Validation(format!(
                "reward must be a finite number, got {reward}"
            )));
        }

        let mut state = state::complete(catalog.keys(), prior, self.default_promo_ratio);
        state.arms = updater::update(state.arms, arm_id, reward);

        debug!(project_id, period, arm_id, reward, "belief updated");
        Ok(state)
    }
}
