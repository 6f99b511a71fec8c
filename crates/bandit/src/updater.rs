//! Belief revision: fold one observed reward into an arm's posterior.

use policy_core::types::{ArmBelief, ArmId};
use std::collections::BTreeMap;

/// Apply `reward` to `arm`, returning the revised belief map.
///
/// The reward is clamped into [0, 1] and split across the shape parameters
/// (`a += r`, `b += 1 - r`), so every call adds exactly one
/// pseudo-observation. An arm missing from the map self-heals to the uniform
/// prior before the update; no reward value is ever rejected here.
pub fn update(
    mut beliefs: BTreeMap<ArmId, ArmBelief>,
    arm: &str,
    reward: f64,
) -> BTreeMap<ArmId, ArmBelief> {
    let r = reward.clamp(0.0, 1.0);

    let belief = beliefs.entry(arm.to_string()).or_insert(ArmBelief::PRIOR);
    belief.a += r;
    belief.b += 1.0 - r;

    beliefs
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uniform(ids: &[&str]) -> BTreeMap<ArmId, ArmBelief> {
        ids.iter().map(|id| (id.to_string(), ArmBelief::PRIOR)).collect()
    }

    // 1. Arithmetic ---------------------------------------------------------

    #[test]
    fn fractional_reward_splits_across_shape_params() {
        let beliefs = update(uniform(&["x", "y"]), "x", 0.8);

        assert!((beliefs["x"].a - 1.8).abs() < f64::EPSILON);
        assert!((beliefs["x"].b - 1.2).abs() < f64::EPSILON);
        assert_eq!(beliefs["y"], ArmBelief::PRIOR);
    }

    #[test]
    fn each_update_adds_exactly_one_pseudo_observation() {
        for &r in &[0.0, 0.25, 0.5, 0.99, 1.0, -3.0, 42.0] {
            let before = ArmBelief::new(3.5, 2.5);
            let mut map = BTreeMap::new();
            map.insert("x".to_string(), before);

            let after = update(map, "x", r)["x"];
            assert!(((after.a + after.b) - (before.a + before.b + 1.0)).abs() < 1e-12);
            assert!(after.a >= before.a && after.a <= before.a + 1.0);
            assert!(after.b >= before.b && after.b <= before.b + 1.0);
        }
    }

    // 2. Clamping -----------------------------------------------------------

    #[test]
    fn negative_reward_clamps_to_zero() {
        let clamped = update(uniform(&["x"]), "x", -5.0);
        let exact = update(uniform(&["x"]), "x", 0.0);
        assert_eq!(clamped["x"], exact["x"]);
    }

    #[test]
    fn oversized_reward_clamps_to_one() {
        let clamped = update(uniform(&["x"]), "x", 5.0);
        let exact = update(uniform(&["x"]), "x", 1.0);
        assert_eq!(clamped["x"], exact["x"]);

        // reward 1.5 on (1, 1) lands on (2, 1)
        let beliefs = update(uniform(&["x"]), "x", 1.5);
        assert_eq!(beliefs["x"], ArmBelief::new(2.0, 1.0));
    }

    // 3. Self-healing -------------------------------------------------------

    #[test]
    fn unknown_arm_is_inserted_with_prior_before_update() {
        let beliefs = update(uniform(&["x"]), "newcomer", 1.0);

        assert_eq!(beliefs["newcomer"], ArmBelief::new(2.0, 1.0));
        assert_eq!(beliefs["x"], ArmBelief::PRIOR);
    }
}
