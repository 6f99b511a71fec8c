//! State completion: turn an optional persisted state into a well-formed
//! one covering every arm currently in the catalog.

use policy_core::types::{ArmBelief, ArmId, PolicyState};
use serde_json::json;

/// Complete `prior` against the catalog's arm ids.
///
/// Every catalog arm missing from the belief map gets the uniform prior;
/// existing beliefs are never reset, and beliefs for arms that have left the
/// catalog are kept. A null `prefs` payload is defaulted to
/// `{"promo_ratio": default_promo_ratio}`, otherwise passed through verbatim.
///
/// Idempotent: completing an already-complete state changes nothing.
pub fn complete<'a>(
    catalog_ids: impl IntoIterator<Item = &'a ArmId>,
    prior: Option<PolicyState>,
    default_promo_ratio: f64,
) -> PolicyState {
    let mut state = prior.unwrap_or_else(PolicyState::empty);

    for id in catalog_ids {
        state.arms.entry(id.clone()).or_insert(ArmBelief::PRIOR);
    }

    if state.prefs.is_null() {
        state.prefs = json!({ "promo_ratio": default_promo_ratio });
    }

    state
}
