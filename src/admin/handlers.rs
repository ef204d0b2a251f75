use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::admin::AdminState;
use crate::load_balancer::Target;

#[derive(Debug, Serialize, Deserialize)]
pub struct SystemStatus {
    pub version: String,
    pub strategy: String,
    pub targets: usize,
    pub available: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TargetStatus {
    pub name: Option<String>,
    pub address: String,
    pub weight: i32,
    pub state: String,
}

impl From<&Target> for TargetStatus {
    fn from(t: &Target) -> Self {
        Self {
            name: t.name().map(str::to_string),
            address: t.address().to_string(),
            weight: t.weight(),
            state: t.health_state().as_str().to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Selection {
    pub target: Option<TargetStatus>,
}

#[derive(Debug, Default, Deserialize)]
pub struct NextParams {
    /// Skip targets that are not marked available.
    #[serde(default)]
    pub available: bool,
}

pub async fn get_status(State(state): State<AdminState>) -> Json<SystemStatus> {
    let targets = state.pool.list();
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION").to_string(),
        strategy: state.pool.strategy().to_string(),
        targets: targets.len(),
        available: targets.iter().filter(|t| t.is_available()).count(),
    })
}

pub async fn get_targets(State(state): State<AdminState>) -> Json<Vec<TargetStatus>> {
    Json(
        state
            .pool
            .list()
            .iter()
            .map(|t| TargetStatus::from(t.as_ref()))
            .collect(),
    )
}

pub async fn get_next(
    State(state): State<AdminState>,
    Query(params): Query<NextParams>,
) -> Json<Selection> {
    let picked = if params.available {
        state.pool.next_available()
    } else {
        state.pool.next()
    };
    Json(Selection {
        target: picked.as_deref().map(TargetStatus::from),
    })
}
