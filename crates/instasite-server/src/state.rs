//! Shared application state for the Instasite server.
//!
//! A single [`AppState`] is constructed at startup and shared across all
//! Axum handlers via `Arc`.

use std::sync::Arc;

use instasite_core::store::CustomizationStore;

/// Shared application state passed to all HTTP handlers.
pub struct AppState {
    /// The visitor's customization and its catalog.
    pub store: Arc<CustomizationStore>,
}

impl AppState {
    #[must_use]
    pub fn new(store: Arc<CustomizationStore>) -> Self {
        Self { store }
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("store", &self.store)
            .finish()
    }
}
