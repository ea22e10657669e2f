//! HTTP routes for the Instasite API.
//!
//! Every route lives under `/v1`. Handlers are thin: they parse the request,
//! call the customization store or catalog, and serialize the result.

pub mod customization;
pub mod preview;
pub mod sys;
pub mod templates;

use std::sync::Arc;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::http::{HeaderName, HeaderValue, Method, header};
use tower_http::cors::{Any, CorsLayer};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Request body limit for customization writes. Logos arrive inline as
/// data URIs.
pub const MAX_BODY_BYTES: usize = 4 * 1024 * 1024;

/// Concurrent customization requests admitted at once.
const CUSTOMIZATION_CONCURRENCY: usize = 32;

/// Build the Axum router with all routes and middleware.
pub fn build_router(state: Arc<AppState>) -> Router {
    let customization_routes = Router::new()
        .nest("/v1/customization", customization::router())
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(tower::limit::ConcurrencyLimitLayer::new(
            CUSTOMIZATION_CONCURRENCY,
        ));

    // CORS: the demo front end may be served from anywhere.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, HeaderName::from_static("x-request-id")]);

    Router::new()
        .nest("/v1/sys", sys::router())
        .nest("/v1/templates", templates::router())
        .nest("/v1/preview", preview::router())
        .merge(customization_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ))
        .with_state(state)
}
