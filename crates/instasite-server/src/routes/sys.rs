//! System routes: `/v1/sys/*`

use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;

use crate::state::AppState;
use instasite_core::store::StoreStatus;

/// Build the `/v1/sys` router.
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/health", get(health))
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: StoreStatus,
    /// Storage backend kind, `none` when running without durable storage.
    pub storage: &'static str,
    pub revision: u64,
    pub persisted_revision: u64,
}

/// Store readiness and persistence progress.
async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let store = &state.store;
    Json(HealthResponse {
        status: store.status(),
        storage: store.storage_kind(),
        revision: store.revision().await,
        persisted_revision: store.persisted_revision(),
    })
}
