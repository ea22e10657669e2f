//! Preview route: `/v1/preview`

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;

use crate::error::AppError;
use crate::state::AppState;
use instasite_core::preview::{SitePreview, Viewport};

/// Build the `/v1/preview` router.
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/", get(preview))
}

#[derive(Debug, Deserialize)]
pub struct PreviewQuery {
    /// `desktop` (default), `tablet`, or `mobile`.
    pub viewport: Option<String>,
}

async fn preview(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PreviewQuery>,
) -> Result<Json<SitePreview>, AppError> {
    let viewport = match query.viewport.as_deref() {
        Some(name) => name.parse::<Viewport>()?,
        None => Viewport::default(),
    };
    Ok(Json(state.store.preview(viewport).await?))
}
