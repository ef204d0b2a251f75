//! Admin API.
//!
//! Read-only view of the pool plus an on-demand selection, behind a
//! bearer-token check.

pub mod auth;
pub mod handlers;

use std::sync::Arc;

use axum::{middleware, routing::get, Router};
use tower_http::trace::TraceLayer;

use crate::load_balancer::ServerPool;
use self::auth::admin_auth_middleware;
use self::handlers::*;

/// Shared state for admin handlers.
#[derive(Clone)]
pub struct AdminState {
    pub pool: Arc<ServerPool>,
    pub api_key: Arc<str>,
}

pub fn setup_admin_router(pool: Arc<ServerPool>, api_key: &str) -> Router {
    let state = AdminState {
        pool,
        api_key: Arc::from(api_key),
    };

    Router::new()
        .route("/admin/status", get(get_status))
        .route("/admin/targets", get(get_targets))
        .route("/admin/next", get(get_next))
        .layer(middleware::from_fn_with_state(state.clone(), admin_auth_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
