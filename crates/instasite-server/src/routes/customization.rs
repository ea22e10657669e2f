//! Customization routes: `/v1/customization/*`
//!
//! Every mutation answers with the full state after the change. Persistence
//! happens in the background; `POST /flush` waits for it.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::state::AppState;
use instasite_core::customization::{ColorSlot, CustomizationState, FontSlot, Section};

/// Build the `/v1/customization` router.
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(get_customization))
        .route("/business-name", put(set_business_name))
        .route("/logo", put(set_logo).delete(clear_logo))
        .route("/template", put(select_template))
        .route("/colors/{slot}", put(set_color))
        .route("/fonts/{slot}", put(set_font))
        .route("/sections/{section}/toggle", post(toggle_section))
        .route("/reset", post(reset))
        .route("/flush", post(flush))
}

// ── Request / Response types ─────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct BusinessNameRequest {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct LogoRequest {
    /// Image reference, typically a `data:` URI.
    pub logo: String,
}

#[derive(Debug, Deserialize)]
pub struct SelectTemplateRequest {
    pub template_id: String,
}

#[derive(Debug, Deserialize)]
pub struct ValueRequest {
    pub value: String,
}

#[derive(Debug, Serialize)]
pub struct FlushResponse {
    /// Whether the most recent write reached durable storage.
    pub persisted: bool,
    pub revision: u64,
    pub persisted_revision: u64,
}

type StateResult = Result<Json<CustomizationState>, AppError>;

// ── Handlers ─────────────────────────────────────────────────────────

async fn get_customization(State(state): State<Arc<AppState>>) -> StateResult {
    Ok(Json(state.store.snapshot().await?))
}

async fn set_business_name(
    State(state): State<Arc<AppState>>,
    Json(body): Json<BusinessNameRequest>,
) -> StateResult {
    Ok(Json(state.store.set_business_name(body.name).await?))
}

async fn set_logo(
    State(state): State<Arc<AppState>>,
    Json(body): Json<LogoRequest>,
) -> StateResult {
    if body.logo.is_empty() {
        return Err(AppError::BadRequest(
            "logo must not be empty, use DELETE to remove it".to_owned(),
        ));
    }
    Ok(Json(state.store.set_logo(body.logo).await?))
}

async fn clear_logo(State(state): State<Arc<AppState>>) -> StateResult {
    Ok(Json(state.store.clear_logo().await?))
}

/// Select a template. Unknown ids select the first catalog template and
/// both colors take the selected template's defaults.
async fn select_template(
    State(state): State<Arc<AppState>>,
    Json(body): Json<SelectTemplateRequest>,
) -> StateResult {
    Ok(Json(state.store.select_template(&body.template_id).await?))
}

async fn set_color(
    State(state): State<Arc<AppState>>,
    Path(slot): Path<String>,
    Json(body): Json<ValueRequest>,
) -> StateResult {
    let slot: ColorSlot = slot.parse()?;
    Ok(Json(state.store.set_color(slot, body.value).await?))
}

async fn set_font(
    State(state): State<Arc<AppState>>,
    Path(slot): Path<String>,
    Json(body): Json<ValueRequest>,
) -> StateResult {
    let slot: FontSlot = slot.parse()?;
    Ok(Json(state.store.set_font(slot, body.value).await?))
}

async fn toggle_section(
    State(state): State<Arc<AppState>>,
    Path(section): Path<String>,
) -> StateResult {
    let section: Section = section.parse()?;
    Ok(Json(state.store.toggle_section(section).await?))
}

async fn reset(State(state): State<Arc<AppState>>) -> StateResult {
    Ok(Json(state.store.reset().await?))
}

/// Wait for queued writes. Fails with 503 before the store is loaded.
async fn flush(State(state): State<Arc<AppState>>) -> Result<Json<FlushResponse>, AppError> {
    let store = &state.store;
    // Distinguish "not loaded" from "write failed".
    store.snapshot().await?;

    let persisted = store.flush().await;
    Ok(Json(FlushResponse {
        persisted,
        revision: store.revision().await,
        persisted_revision: store.persisted_revision(),
    }))
}
