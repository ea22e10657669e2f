//! Customization store: the single source of truth for a visitor's
//! in-progress website customization.
//!
//! # Lifecycle
//!
//! A store starts [`StoreStatus::Uninitialized`]. [`CustomizationStore::load`]
//! rehydrates the last persisted snapshot (or the default state), starts the
//! background writer, and flips the store to [`StoreStatus::Ready`]. Readiness
//! is observable through [`CustomizationStore::ready_signal`]. Mutations
//! before that point are rejected with [`StoreError::NotReady`].
//!
//! # Persistence
//!
//! Every mutation updates memory first and returns the new snapshot. The
//! full snapshot is then queued to a single writer task and the caller does
//! not wait for it. Snapshots are queued under the state lock, so the writer
//! sees them in mutation order; when several are pending it writes only the
//! newest. A failed write is logged and dropped. Memory stays authoritative
//! and the next mutation writes the full state again.
//!
//! [`CustomizationStore::flush`] waits for everything queued so far and
//! reports whether the last write succeeded.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;
use tokio::sync::{Mutex, mpsc, oneshot, watch};
use tracing::{debug, info, warn};

use crate::catalog::TemplateCatalog;
use crate::customization::{ColorSlot, CustomizationState, FontSlot, Section};
use crate::error::StoreError;
use crate::persistence::{PersistenceAdapter, STORAGE_KEY_CUSTOMIZATION};
use crate::preview::{SitePreview, Viewport};

/// Lifecycle phase of a [`CustomizationStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreStatus {
    Uninitialized,
    Ready,
}

enum WriterMessage {
    Persist {
        revision: u64,
        state: CustomizationState,
    },
    Flush(oneshot::Sender<bool>),
}

/// Live state of a loaded store.
struct Session {
    state: CustomizationState,
    /// Number of mutations applied since load.
    revision: u64,
    writer: mpsc::UnboundedSender<WriterMessage>,
}

/// Holds the customization, applies mutations, and mirrors every change to
/// durable storage on a best-effort basis.
pub struct CustomizationStore {
    adapter: PersistenceAdapter,
    catalog: Arc<TemplateCatalog>,
    defaults: CustomizationState,
    session: Mutex<Option<Session>>,
    status: watch::Sender<StoreStatus>,
    /// Highest revision the writer stored successfully.
    persisted: Arc<AtomicU64>,
}

impl std::fmt::Debug for CustomizationStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CustomizationStore")
            .field("adapter", &self.adapter)
            .field("status", &*self.status.borrow())
            .finish_non_exhaustive()
    }
}

impl CustomizationStore {
    /// Create an uninitialized store.
    ///
    /// `defaults` is the state used when nothing is persisted and the state
    /// [`reset`](Self::reset) returns to.
    #[must_use]
    pub fn new(
        adapter: PersistenceAdapter,
        catalog: Arc<TemplateCatalog>,
        defaults: CustomizationState,
    ) -> Self {
        let (status, _) = watch::channel(StoreStatus::Uninitialized);
        Self {
            adapter,
            catalog,
            defaults,
            session: Mutex::new(None),
            status,
            persisted: Arc::new(AtomicU64::new(0)),
        }
    }

    /// A store over `adapter` with the built-in catalog and default state.
    #[must_use]
    pub fn with_defaults(adapter: PersistenceAdapter) -> Self {
        Self::new(
            adapter,
            Arc::new(TemplateCatalog::builtin()),
            CustomizationState::default(),
        )
    }

    /// The catalog this store resolves templates against.
    #[must_use]
    pub fn catalog(&self) -> &TemplateCatalog {
        &self.catalog
    }

    /// Backend kind of the underlying storage (`"none"` when unavailable).
    #[must_use]
    pub fn storage_kind(&self) -> &'static str {
        self.adapter.kind()
    }

    /// Current lifecycle phase.
    #[must_use]
    pub fn status(&self) -> StoreStatus {
        *self.status.borrow()
    }

    /// A receiver that observes the lifecycle phase.
    #[must_use]
    pub fn ready_signal(&self) -> watch::Receiver<StoreStatus> {
        self.status.subscribe()
    }

    /// Wait until [`load`](Self::load) has completed.
    pub async fn wait_ready(&self) {
        let mut rx = self.status.subscribe();
        // The sender lives in `self`, so the channel cannot close here.
        let _ = rx.wait_for(|s| *s == StoreStatus::Ready).await;
    }

    /// Rehydrate from durable storage and become ready.
    ///
    /// Reads the persisted snapshot, falling back to the default state when
    /// it is absent, unreadable, or malformed. Never fails. Calling `load`
    /// again returns the current in-memory state without touching storage.
    ///
    /// Must be called from within a Tokio runtime: it starts the writer task.
    pub async fn load(&self) -> CustomizationState {
        let mut guard = self.session.lock().await;
        if let Some(session) = guard.as_ref() {
            return session.state.clone();
        }

        let state = self
            .adapter
            .read_key(STORAGE_KEY_CUSTOMIZATION, self.defaults.clone())
            .await;

        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(run_writer(
            self.adapter.clone(),
            rx,
            Arc::clone(&self.persisted),
        ));

        info!(
            storage = self.adapter.kind(),
            restored = state != self.defaults,
            template = %state.selected_template_id,
            "customization store ready"
        );

        *guard = Some(Session {
            state: state.clone(),
            revision: 0,
            writer: tx,
        });
        self.status.send_replace(StoreStatus::Ready);
        state
    }

    /// Current in-memory state.
    ///
    /// # Errors
    ///
    /// [`StoreError::NotReady`] before [`load`](Self::load).
    pub async fn snapshot(&self) -> Result<CustomizationState, StoreError> {
        let guard = self.session.lock().await;
        guard
            .as_ref()
            .map(|s| s.state.clone())
            .ok_or(StoreError::NotReady)
    }

    /// Number of mutations applied since load (0 before load).
    pub async fn revision(&self) -> u64 {
        self.session.lock().await.as_ref().map_or(0, |s| s.revision)
    }

    /// Highest revision known to be durably stored.
    #[must_use]
    pub fn persisted_revision(&self) -> u64 {
        self.persisted.load(Ordering::SeqCst)
    }

    /// Replace the business name. Empty names are allowed.
    ///
    /// # Errors
    ///
    /// [`StoreError::NotReady`] before [`load`](Self::load).
    pub async fn set_business_name(
        &self,
        name: impl Into<String>,
    ) -> Result<CustomizationState, StoreError> {
        let name = name.into();
        self.mutate("set_business_name", |state, _| state.set_business_name(name))
            .await
    }

    /// Replace the logo with an image reference (typically a data URI).
    ///
    /// # Errors
    ///
    /// [`StoreError::NotReady`] before [`load`](Self::load).
    pub async fn set_logo(
        &self,
        data_ref: impl Into<String>,
    ) -> Result<CustomizationState, StoreError> {
        let data_ref = data_ref.into();
        self.mutate("set_logo", |state, _| state.set_logo(data_ref)).await
    }

    /// Remove the logo.
    ///
    /// # Errors
    ///
    /// [`StoreError::NotReady`] before [`load`](Self::load).
    pub async fn clear_logo(&self) -> Result<CustomizationState, StoreError> {
        self.mutate("clear_logo", |state, _| state.clear_logo()).await
    }

    /// Select a template and reset both colors to its defaults.
    ///
    /// An unknown id selects the catalog's first template instead.
    ///
    /// # Errors
    ///
    /// [`StoreError::NotReady`] before [`load`](Self::load).
    pub async fn select_template(
        &self,
        template_id: &str,
    ) -> Result<CustomizationState, StoreError> {
        self.mutate("select_template", |state, catalog| {
            let template = catalog.get_by_id(template_id);
            if template.id != template_id {
                debug!(
                    requested = template_id,
                    selected = %template.id,
                    "unknown template id, selecting first template"
                );
            }
            state.apply_template(template);
        })
        .await
    }

    /// Update one color channel.
    ///
    /// # Errors
    ///
    /// [`StoreError::NotReady`] before [`load`](Self::load).
    pub async fn set_color(
        &self,
        slot: ColorSlot,
        value: impl Into<String>,
    ) -> Result<CustomizationState, StoreError> {
        let value = value.into();
        self.mutate("set_color", |state, _| state.set_color(slot, value))
            .await
    }

    /// Update one font channel.
    ///
    /// # Errors
    ///
    /// [`StoreError::NotReady`] before [`load`](Self::load).
    pub async fn set_font(
        &self,
        slot: FontSlot,
        value: impl Into<String>,
    ) -> Result<CustomizationState, StoreError> {
        let value = value.into();
        self.mutate("set_font", |state, _| state.set_font(slot, value))
            .await
    }

    /// Flip one section's visibility.
    ///
    /// # Errors
    ///
    /// [`StoreError::NotReady`] before [`load`](Self::load).
    pub async fn toggle_section(
        &self,
        section: Section,
    ) -> Result<CustomizationState, StoreError> {
        self.mutate("toggle_section", |state, _| state.toggle_section(section))
            .await
    }

    /// Replace the whole state with the defaults. The next write overwrites
    /// the persisted snapshot.
    ///
    /// # Errors
    ///
    /// [`StoreError::NotReady`] before [`load`](Self::load).
    pub async fn reset(&self) -> Result<CustomizationState, StoreError> {
        let defaults = self.defaults.clone();
        self.mutate("reset", |state, _| *state = defaults).await
    }

    /// Mock preview of the current state.
    ///
    /// # Errors
    ///
    /// [`StoreError::NotReady`] before [`load`](Self::load).
    pub async fn preview(&self, viewport: Viewport) -> Result<SitePreview, StoreError> {
        let guard = self.session.lock().await;
        let session = guard.as_ref().ok_or(StoreError::NotReady)?;
        Ok(SitePreview::build(&session.state, &self.catalog, viewport))
    }

    /// Wait for every write queued so far.
    ///
    /// Returns `true` when the most recent write succeeded (or nothing needed
    /// writing and storage is available). Returns `false` before load.
    pub async fn flush(&self) -> bool {
        let (ack_tx, ack_rx) = oneshot::channel();
        {
            let guard = self.session.lock().await;
            let Some(session) = guard.as_ref() else {
                return false;
            };
            if session.writer.send(WriterMessage::Flush(ack_tx)).is_err() {
                warn!("customization writer stopped, cannot flush");
                return false;
            }
        }
        ack_rx.await.unwrap_or(false)
    }

    async fn mutate<F>(&self, op: &'static str, apply: F) -> Result<CustomizationState, StoreError>
    where
        F: FnOnce(&mut CustomizationState, &TemplateCatalog),
    {
        let mut guard = self.session.lock().await;
        let session = guard.as_mut().ok_or(StoreError::NotReady)?;

        apply(&mut session.state, &self.catalog);
        session.revision = session.revision.saturating_add(1);

        let snapshot = session.state.clone();
        let message = WriterMessage::Persist {
            revision: session.revision,
            state: snapshot.clone(),
        };
        if session.writer.send(message).is_err() {
            warn!(op, "customization writer stopped, change kept in memory only");
        }
        debug!(op, revision = session.revision, "customization updated");
        Ok(snapshot)
    }
}

/// Drain queued snapshots and write the newest of each batch.
async fn run_writer(
    adapter: PersistenceAdapter,
    mut rx: mpsc::UnboundedReceiver<WriterMessage>,
    persisted: Arc<AtomicU64>,
) {
    let mut last_ok = adapter.is_available();

    while let Some(first) = rx.recv().await {
        let mut pending = None;
        let mut acks = Vec::new();

        let mut next = Some(first);
        while let Some(message) = next {
            match message {
                WriterMessage::Persist { revision, state } => pending = Some((revision, state)),
                WriterMessage::Flush(ack) => acks.push(ack),
            }
            next = rx.try_recv().ok();
        }

        if let Some((revision, state)) = pending {
            last_ok = adapter.write_key(STORAGE_KEY_CUSTOMIZATION, &state).await;
            if last_ok {
                persisted.fetch_max(revision, Ordering::SeqCst);
            } else {
                warn!(revision, "customization snapshot not persisted, next change retries");
            }
        }

        for ack in acks {
            let _ = ack.send(last_ok);
        }
    }

    debug!("customization writer stopped");
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use instasite_storage::{FileBackend, MemoryBackend, StorageBackend};

    use super::*;
    use crate::persistence::tests::FlakyBackend;

    fn store_over(backend: &MemoryBackend) -> CustomizationStore {
        CustomizationStore::with_defaults(PersistenceAdapter::new(Arc::new(backend.clone())))
    }

    async fn persisted_state(backend: &MemoryBackend) -> Option<CustomizationState> {
        let bytes = backend.get(STORAGE_KEY_CUSTOMIZATION).await.unwrap()?;
        Some(serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn mutations_before_load_are_rejected() {
        let backend = MemoryBackend::new();
        let store = store_over(&backend);

        assert_eq!(store.status(), StoreStatus::Uninitialized);
        assert_eq!(
            store.set_business_name("Acme").await,
            Err(StoreError::NotReady)
        );
        assert_eq!(store.snapshot().await, Err(StoreError::NotReady));
        assert!(!store.flush().await);
        assert!(backend.is_empty().await);
    }

    #[tokio::test]
    async fn load_without_snapshot_returns_defaults_and_does_not_write() {
        let backend = MemoryBackend::new();
        let store = store_over(&backend);

        let state = store.load().await;
        assert_eq!(state, CustomizationState::default());
        assert_eq!(store.status(), StoreStatus::Ready);
        assert!(store.flush().await);
        assert!(backend.is_empty().await);
    }

    #[tokio::test]
    async fn load_signals_readiness() {
        let store = Arc::new(store_over(&MemoryBackend::new()));
        let mut signal = store.ready_signal();
        assert_eq!(*signal.borrow(), StoreStatus::Uninitialized);

        let waiter = {
            let store = Arc::clone(&store);
            tokio::spawn(async move { store.wait_ready().await })
        };

        store.load().await;
        waiter.await.unwrap();
        signal.changed().await.unwrap();
        assert_eq!(*signal.borrow(), StoreStatus::Ready);
    }

    #[tokio::test]
    async fn malformed_snapshot_falls_back_to_defaults() {
        let backend = MemoryBackend::new();
        backend
            .put(STORAGE_KEY_CUSTOMIZATION, b"{\"businessName\": tru")
            .await
            .unwrap();

        let store = store_over(&backend);
        assert_eq!(store.load().await, CustomizationState::default());
    }

    #[tokio::test]
    async fn second_load_keeps_in_memory_state() {
        let backend = MemoryBackend::new();
        let store = store_over(&backend);
        store.load().await;
        store.set_business_name("Acme").await.unwrap();

        let again = store.load().await;
        assert_eq!(again.business_name, "Acme");
    }

    #[tokio::test]
    async fn select_template_overwrites_prior_color_edits() {
        let store = store_over(&MemoryBackend::new());
        store.load().await;
        store.set_color(ColorSlot::Primary, "#123456").await.unwrap();

        let state = store.select_template("tech-startup").await.unwrap();
        assert_eq!(state.selected_template_id, "tech-startup");
        assert_eq!(state.customizations.colors.primary, "#6366F1");
        assert_eq!(state.customizations.colors.secondary, "#10B981");
    }

    #[tokio::test]
    async fn unknown_template_behaves_like_first_template() {
        let a = store_over(&MemoryBackend::new());
        let b = store_over(&MemoryBackend::new());
        a.load().await;
        b.load().await;
        a.set_color(ColorSlot::Secondary, "#000000").await.unwrap();
        b.set_color(ColorSlot::Secondary, "#000000").await.unwrap();

        let unknown = a.select_template("does-not-exist").await.unwrap();
        let first = b.select_template("modern-business").await.unwrap();
        assert_eq!(unknown, first);
        assert_eq!(unknown.selected_template_id, "modern-business");
    }

    #[tokio::test]
    async fn mutations_compose_in_order() {
        let store = store_over(&MemoryBackend::new());
        store.load().await;

        store.set_business_name("").await.unwrap();
        store.set_font(FontSlot::Heading, "Poppins").await.unwrap();
        store.toggle_section(Section::Contact).await.unwrap();
        store.set_logo("data:image/png;base64,AA==").await.unwrap();
        let state = store.select_template("ecommerce-store").await.unwrap();

        let mut expected = CustomizationState::default();
        expected.set_business_name("");
        expected.set_font(FontSlot::Heading, "Poppins");
        expected.toggle_section(Section::Contact);
        expected.set_logo("data:image/png;base64,AA==");
        expected.apply_template(store.catalog().get_by_id("ecommerce-store"));

        assert_eq!(state, expected);
        assert_eq!(store.snapshot().await.unwrap(), expected);
        assert_eq!(store.revision().await, 5);
    }

    #[tokio::test]
    async fn reset_restores_defaults_and_persists_them() {
        let backend = MemoryBackend::new();
        let store = store_over(&backend);
        store.load().await;
        store.set_business_name("Acme").await.unwrap();
        store.toggle_section(Section::Hero).await.unwrap();

        let state = store.reset().await.unwrap();
        assert_eq!(state, CustomizationState::default());
        assert!(store.flush().await);
        assert_eq!(
            persisted_state(&backend).await,
            Some(CustomizationState::default())
        );
    }

    #[tokio::test]
    async fn flush_persists_latest_snapshot() {
        let backend = MemoryBackend::new();
        let store = store_over(&backend);
        store.load().await;

        for i in 0..20 {
            store.set_business_name(format!("Name {i}")).await.unwrap();
        }
        assert!(store.flush().await);

        let persisted = persisted_state(&backend).await.unwrap();
        assert_eq!(persisted.business_name, "Name 19");
        assert_eq!(store.persisted_revision(), 20);
    }

    #[tokio::test]
    async fn write_failures_keep_memory_and_self_heal() {
        let backend = Arc::new(FlakyBackend::broken());
        let store = CustomizationStore::with_defaults(PersistenceAdapter::new(backend.clone()));
        store.load().await;

        let state = store.set_business_name("Kept in memory").await.unwrap();
        assert_eq!(state.business_name, "Kept in memory");
        assert!(!store.flush().await);
        assert_eq!(store.persisted_revision(), 0);
        assert_eq!(
            store.snapshot().await.unwrap().business_name,
            "Kept in memory"
        );

        backend.broken.store(false, Ordering::SeqCst);
        store.set_color(ColorSlot::Primary, "#FFFFFF").await.unwrap();
        assert!(store.flush().await);
        assert_eq!(store.persisted_revision(), 2);

        let bytes = backend.inner.get(STORAGE_KEY_CUSTOMIZATION).await.unwrap().unwrap();
        let persisted: CustomizationState = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(persisted.business_name, "Kept in memory");
        assert_eq!(persisted.customizations.colors.primary, "#FFFFFF");
    }

    #[tokio::test]
    async fn unavailable_storage_still_serves_the_session() {
        let store = CustomizationStore::with_defaults(PersistenceAdapter::unavailable());
        assert_eq!(store.load().await, CustomizationState::default());
        assert_eq!(store.storage_kind(), "none");

        let state = store.toggle_section(Section::Features).await.unwrap();
        assert!(!state.customizations.sections.features);
        assert!(!store.flush().await);
    }

    #[tokio::test]
    async fn preview_reflects_current_state() {
        let store = store_over(&MemoryBackend::new());
        assert_eq!(
            store.preview(Viewport::Desktop).await,
            Err(StoreError::NotReady)
        );

        store.load().await;
        store.set_business_name("Acme").await.unwrap();
        store.select_template("creative-portfolio").await.unwrap();

        let preview = store.preview(Viewport::Desktop).await.unwrap();
        assert_eq!(preview.title, "Acme - Creative Portfolio Template");
        assert_eq!(preview.palette.primary, "#EC4899");
    }

    #[tokio::test]
    async fn corrupt_storage_file_is_replaced_by_next_write() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("instasite.json");
        std::fs::write(&path, "{ not json").unwrap();

        let store = CustomizationStore::with_defaults(PersistenceAdapter::new(Arc::new(
            FileBackend::new(&path),
        )));
        assert_eq!(store.load().await, CustomizationState::default());

        store.set_business_name("Fresh Start").await.unwrap();
        assert!(store.flush().await);

        let reopened = CustomizationStore::with_defaults(PersistenceAdapter::new(Arc::new(
            FileBackend::new(&path),
        )));
        assert_eq!(reopened.load().await.business_name, "Fresh Start");
    }

    #[tokio::test]
    async fn end_to_end_session_roundtrip() {
        let backend = MemoryBackend::new();

        let first = store_over(&backend);
        let loaded = first.load().await;
        assert_eq!(loaded.selected_template_id, "modern-business");
        assert_eq!(loaded.customizations.colors.primary, "#3B82F6");

        let state = first.select_template("creative-portfolio").await.unwrap();
        assert_eq!(state.customizations.colors.primary, "#EC4899");
        assert_eq!(state.customizations.colors.secondary, "#8B5CF6");

        let state = first
            .set_color(ColorSlot::Secondary, "#000000")
            .await
            .unwrap();
        assert_eq!(state.customizations.colors.primary, "#EC4899");
        assert_eq!(state.customizations.colors.secondary, "#000000");
        assert!(first.flush().await);

        let second = store_over(&backend);
        assert_eq!(second.load().await, state);
    }
}
