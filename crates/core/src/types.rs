//! Core data model: arm beliefs, policy state, snapshots, and the JSON
//! request/response types served by the REST layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use uuid::Uuid;

/// Opaque arm identifier, unique within a catalog.
pub type ArmId = String;

/// Opaque per-arm parameter payload (creative config, copy, etc.).
/// The policy core never inspects its contents.
pub type ArmParams = Value;

/// Ordered mapping from arm id to its static parameters.
pub type ArmCatalog = BTreeMap<ArmId, ArmParams>;

/// Beta-distribution posterior over one arm's success probability.
///
/// `a` and `b` are the shape parameters (pseudo-successes and
/// pseudo-failures, each including one count from the uniform prior).
/// Invariant: both strictly positive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ArmBelief {
    pub a: f64,
    pub b: f64,
}

impl ArmBelief {
    /// Uniform prior for an arm with no observations.
    pub const PRIOR: ArmBelief = ArmBelief { a: 1.0, b: 1.0 };

    pub fn new(a: f64, b: f64) -> Self {
        Self { a, b }
    }

    /// Posterior mean of the success probability.
    pub fn mean(&self) -> f64 {
        self.a / (self.a + self.b)
    }

    /// Pseudo-observations accumulated beyond the uniform prior.
    pub fn observations(&self) -> f64 {
        self.a + self.b - 2.0
    }
}

impl Default for ArmBelief {
    fn default() -> Self {
        Self::PRIOR
    }
}

/// Full bandit state for one (project, period) key.
///
/// `arms` maps arm id to its current posterior. Beliefs for arms that have
/// since left the catalog are retained untouched. `prefs` is an opaque
/// preference payload stored and forwarded verbatim (`Null` means absent).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyState {
    #[serde(default)]
    pub arms: BTreeMap<ArmId, ArmBelief>,
    #[serde(default)]
    pub prefs: Value,
}

impl PolicyState {
    pub fn empty() -> Self {
        Self {
            arms: BTreeMap::new(),
            prefs: Value::Null,
        }
    }
}

/// One immutable persisted copy of a policy state.
///
/// `version` is a per-key monotone sequence number assigned by the snapshot
/// store; the latest version is the one read back on the next request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub id: Uuid,
    pub project_id: String,
    pub period: String,
    pub version: u64,
    pub state: PolicyState,
    pub created_at: DateTime<Utc>,
}

// ─── REST wire types ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct ChooseRequest {
    pub project_id: String,
    pub period: String,
    #[serde(default)]
    pub context: Value,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChooseResponse {
    pub arm_id: ArmId,
    pub arm_params: ArmParams,
    pub policy_state: PolicyState,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateRequest {
    pub project_id: String,
    pub period: String,
    pub arm_id: ArmId,
    pub reward_01: f64,
    #[serde(default)]
    pub meta: Value,
}

#[derive(Debug, Clone, Serialize)]
pub struct UpdateResponse {
    pub ok: bool,
    pub policy_state: PolicyState,
    pub snapshot_id: Uuid,
    pub version: u64,
}
