//! REST API handlers for arm selection, reward reporting, and operational
//! endpoints.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use policy_bandit::PolicyEngine;
use policy_core::types::{
    ArmCatalog, ChooseRequest, ChooseResponse, Snapshot, UpdateRequest, UpdateResponse,
};
use policy_core::PolicyError;
use policy_store::{CatalogStore, SnapshotStore};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, warn};

/// Maximum string field length (project id, period, arm id).
const MAX_FIELD_LEN: usize = 256;

/// Shared application state for REST handlers.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<PolicyEngine>,
    pub catalog: Arc<CatalogStore>,
    pub snapshots: Arc<SnapshotStore>,
    pub node_id: String,
    pub start_time: Instant,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn validate_key(project_id: &str, period: &str) -> Result<(), &'static str> {
    if project_id.is_empty() {
        return Err("'project_id' must not be empty");
    }
    if project_id.len() > MAX_FIELD_LEN {
        return Err("'project_id' exceeds maximum length");
    }
    if period.is_empty() {
        return Err("'period' must not be empty");
    }
    if period.len() > MAX_FIELD_LEN {
        return Err("'period' exceeds maximum length");
    }
    Ok(())
}

fn validate_update(request: &UpdateRequest) -> Result<(), &'static str> {
    validate_key(&request.project_id, &request.period)?;
    if request.arm_id.is_empty() {
        return Err("'arm_id' must not be empty");
    }
    if request.arm_id.len() > MAX_FIELD_LEN {
        return Err("'arm_id' exceeds maximum length");
    }
    if !request.reward_01.is_finite() {
        return Err("'reward_01' must be a finite number");
    }
    Ok(())
}

fn validation_error(msg: &str) -> ApiError {
    metrics::counter!("policy.validation_errors").increment(1);
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            error: "invalid_request".to_string(),
            message: msg.to_string(),
        }),
    )
}

fn policy_error(err: PolicyError) -> ApiError {
    match err {
        PolicyError::Config(msg) => {
            metrics::counter!("policy.config_errors").increment(1);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "no_arms_configured".to_string(),
                    message: msg,
                }),
            )
        }
        PolicyError::Validation(msg) => (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "invalid_request".to_string(),
                message: msg,
            }),
        ),
        other => {
            error!(error = %other, "Policy request failed");
            metrics::counter!("policy.errors").increment(1);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "policy_failed".to_string(),
                    message: "Internal processing error".to_string(),
                }),
            )
        }
    }
}

/// POST /policy/choose — select one arm for a (project, period) key.
///
/// Read-only: the completed state is returned to the caller but not
/// persisted; the first reward report writes the first snapshot.
pub async fn handle_choose(
    State(state): State<AppState>,
    Json(request): Json<ChooseRequest>,
) -> Result<Json<ChooseResponse>, ApiError> {
    if let Err(msg) = validate_key(&request.project_id, &request.period) {
        warn!(project_id = %request.project_id, error = msg, "Choose request validation failed");
        return Err(validation_error(msg));
    }
    metrics::counter!("policy.choose.requests").increment(1);

    let catalog = state.catalog.snapshot().map_err(policy_error)?;
    let prior = state
        .snapshots
        .latest(&request.project_id, &request.period)
        .map(|snapshot| snapshot.state);

    let mut rng = rand::thread_rng();
    let (arm_id, arm_params, policy_state) = state
        .engine
        .select_arm(&request.project_id, &request.period, &catalog, prior, &mut rng)
        .map_err(policy_error)?;

    Ok(Json(ChooseResponse {
        arm_id,
        arm_params,
        policy_state,
    }))
}

/// POST /policy/update — fold a reward into the key's state and persist the
/// result as a fresh snapshot.
///
/// The load-revise-persist cycle runs under the snapshot store's per-key
/// guard, so concurrent reports for one key cannot lose updates.
pub async fn handle_update(
    State(state): State<AppState>,
    Json(request): Json<UpdateRequest>,
) -> Result<Json<UpdateResponse>, ApiError> {
    if let Err(msg) = validate_update(&request) {
        warn!(project_id = %request.project_id, error = msg, "Update request validation failed");
        return Err(validation_error(msg));
    }
    metrics::counter!("policy.update.requests").increment(1);

    let catalog = state.catalog.snapshot().map_err(policy_error)?;

    let snapshot = state
        .snapshots
        .update_latest(&request.project_id, &request.period, |prior| {
            state.engine.record_reward(
                &request.project_id,
                &request.period,
                &catalog,
                prior.cloned(),
                &request.arm_id,
                request.reward_01,
            )
        })
        .map_err(policy_error)?;

    Ok(Json(UpdateResponse {
        ok: true,
        policy_state: snapshot.state,
        snapshot_id: snapshot.id,
        version: snapshot.version,
    }))
}

/// GET /policy/arms — the current arm catalog, ordered by id.
pub async fn handle_arms(State(state): State<AppState>) -> Json<ArmsResponse> {
    let arms = state.catalog.snapshot().unwrap_or_default();
    Json(ArmsResponse {
        count: arms.len(),
        arms,
    })
}

/// GET /policy/state/:project_id/:period — latest persisted snapshot.
pub async fn handle_state(
    State(state): State<AppState>,
    Path((project_id, period)): Path<(String, String)>,
) -> Result<Json<Snapshot>, ApiError> {
    if let Err(msg) = validate_key(&project_id, &period) {
        return Err(validation_error(msg));
    }

    state
        .snapshots
        .latest(&project_id, &period)
        .map(Json)
        .ok_or_else(|| {
            (
                StatusCode::NOT_FOUND,
                Json(ErrorResponse {
                    error: "snapshot_not_found".to_string(),
                    message: format!("no snapshot for ({project_id}, {period})"),
                }),
            )
        })
}

/// GET /health — Health check endpoint.
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        node_id: state.node_id.clone(),
        uptime_secs: state.start_time.elapsed().as_secs(),
        catalog_arms: state.catalog.len(),
        snapshot_keys: state.snapshots.key_count(),
    })
}

/// GET /ready — Readiness probe. 200 only once the catalog has arms.
pub async fn readiness(State(state): State<AppState>) -> StatusCode {
    if state.catalog.is_empty() {
        StatusCode::SERVICE_UNAVAILABLE
    } else {
        StatusCode::OK
    }
}

/// GET /live — Liveness probe.
pub async fn liveness() -> StatusCode {
    StatusCode::OK
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

#[derive(Serialize)]
pub struct ArmsResponse {
    pub count: usize,
    pub arms: ArmCatalog,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub node_id: String,
    pub uptime_secs: u64,
    pub catalog_arms: usize,
    pub snapshot_keys: usize,
}
