//! Error types for `instasite-core`.
//!
//! Persistence failures never appear here: the persistence adapter contains
//! them. What remains are construction-time catalog problems, lifecycle
//! misuse of the store, and unknown names arriving from outer surfaces.

/// Errors from building a template catalog.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// A catalog must hold at least one template to fall back to.
    #[error("template catalog is empty")]
    Empty,

    /// Two records share the same id.
    #[error("duplicate template id: {id}")]
    DuplicateId { id: String },
}

/// Errors from the customization store.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum StoreError {
    /// A mutation arrived before `load()` rehydrated the store.
    #[error("customization store is not loaded yet")]
    NotReady,
}

/// A slot, font, or section name that does not exist.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("unknown {kind} '{value}' (expected one of: {expected})")]
pub struct ParseKeyError {
    /// What was being parsed (`color slot`, `font slot`, `section`).
    pub kind: &'static str,
    /// The rejected input.
    pub value: String,
    /// Comma-separated accepted names.
    pub expected: &'static str,
}
