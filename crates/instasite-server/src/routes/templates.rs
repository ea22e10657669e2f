//! Template catalog routes: `/v1/templates/*`
//!
//! Read-only views of the built-in catalog.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::state::AppState;
use instasite_core::catalog::TemplateRecord;

/// Build the `/v1/templates` router.
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_templates))
        .route("/categories", get(list_categories))
        .route("/{id}", get(get_template))
}

// ── Request / Response types ─────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    /// Category filter; absent or `All` lists everything.
    pub category: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TemplateListResponse {
    pub templates: Vec<TemplateRecord>,
}

#[derive(Debug, Serialize)]
pub struct CategoryListResponse {
    pub categories: Vec<String>,
}

// ── Handlers ─────────────────────────────────────────────────────────

/// List templates, optionally filtered by category.
async fn list_templates(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Json<TemplateListResponse> {
    let templates = state
        .store
        .catalog()
        .by_category(query.category.as_deref())
        .into_iter()
        .cloned()
        .collect();

    Json(TemplateListResponse { templates })
}

/// Filter labels, `All` first.
async fn list_categories(State(state): State<Arc<AppState>>) -> Json<CategoryListResponse> {
    Json(CategoryListResponse {
        categories: state.store.catalog().categories(),
    })
}

/// Look up one template. Unlike selection, a direct read of an unknown id
/// does not fall back.
async fn get_template(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<TemplateRecord>, AppError> {
    state
        .store
        .catalog()
        .find(&id)
        .cloned()
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("no template with id '{id}'")))
}
