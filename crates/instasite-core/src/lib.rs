//! Core library for Instasite.
//!
//! Contains the static template catalog, the customization aggregate and its
//! pure transitions, best-effort JSON persistence, the customization store,
//! and the mock site preview. This crate depends on `instasite-storage` for
//! the storage backend trait and knows nothing about HTTP or the CLI.

pub mod catalog;
pub mod customization;
pub mod error;
pub mod persistence;
pub mod preview;
pub mod store;

pub use catalog::{ALL_CATEGORIES, Palette, TemplateCatalog, TemplateRecord};
pub use customization::{ColorSlot, CustomizationState, FontSlot, Section};
pub use error::{CatalogError, ParseKeyError, StoreError};
pub use persistence::PersistenceAdapter;
pub use preview::{SitePreview, Viewport};
pub use store::{CustomizationStore, StoreStatus};
