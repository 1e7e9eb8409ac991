use anyhow::{Context, Result};
use shared::domain::{Draft, DraftId};
use storage::KeyValueStore;
use tracing::{debug, error, warn};

use crate::events::{StoreEvent, StoreObserver};

pub const DRAFTS_STORAGE_KEY: &str = "uwc_application_drafts";
pub const CURRENT_DRAFT_KEY: &str = "uwc_current_draft_id";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageKeys {
    pub drafts: String,
    pub current_draft: String,
}

impl Default for StorageKeys {
    fn default() -> Self {
        Self {
            drafts: DRAFTS_STORAGE_KEY.into(),
            current_draft: CURRENT_DRAFT_KEY.into(),
        }
    }
}

/// What was found in the backend at start-up.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RestoredState {
    pub drafts: Vec<Draft>,
    pub current_draft_id: Option<DraftId>,
}

/// Mirrors the application store into a [`KeyValueStore`].
///
/// Registered as a [`StoreObserver`]; every event is flushed synchronously.
/// Write failures are logged and otherwise ignored so the in-memory state
/// stays usable when the backend is not.
pub struct PersistenceAdapter<S> {
    backend: S,
    keys: StorageKeys,
}

impl<S: KeyValueStore> PersistenceAdapter<S> {
    pub fn new(backend: S) -> Self {
        Self::with_keys(backend, StorageKeys::default())
    }

    pub fn with_keys(backend: S, keys: StorageKeys) -> Self {
        Self { backend, keys }
    }

    /// Reads the stored collection and current-draft id. A missing,
    /// malformed or unreadable collection yields no drafts; the current id
    /// is still returned so the caller can clear it.
    pub fn restore(&self) -> RestoredState {
        let drafts = match self.read_drafts() {
            Ok(Some(drafts)) => drafts,
            Ok(None) => {
                debug!(key = %self.keys.drafts, "persistence: no stored drafts");
                Vec::new()
            }
            Err(err) => {
                error!(key = %self.keys.drafts, "persistence: error loading drafts: {err:#}");
                Vec::new()
            }
        };

        let current_draft_id = match self.backend.get_item(&self.keys.current_draft) {
            Ok(id) => id.filter(|id| !id.is_empty()).map(DraftId),
            Err(err) => {
                warn!(
                    key = %self.keys.current_draft,
                    "persistence: error reading current draft id: {err}"
                );
                None
            }
        };

        RestoredState {
            drafts,
            current_draft_id,
        }
    }

    fn read_drafts(&self) -> Result<Option<Vec<Draft>>> {
        let Some(raw) = self
            .backend
            .get_item(&self.keys.drafts)
            .context("failed to read stored drafts")?
        else {
            return Ok(None);
        };

        let mut drafts: Vec<Draft> =
            serde_json::from_str(&raw).context("stored drafts are not a valid draft list")?;
        for draft in &mut drafts {
            if draft.normalize() {
                warn!(
                    draft_id = %draft.id,
                    "persistence: dropped duplicate completed steps from stored draft"
                );
            }
        }
        Ok(Some(drafts))
    }

    pub fn flush_drafts(&self, drafts: &[Draft]) -> Result<()> {
        let encoded = serde_json::to_string(drafts).context("failed to encode drafts")?;
        self.backend
            .set_item(&self.keys.drafts, &encoded)
            .with_context(|| format!("failed to write key '{}'", self.keys.drafts))
    }

    pub fn flush_current(&self, current: Option<&DraftId>) -> Result<()> {
        let key = &self.keys.current_draft;
        let written = match current {
            Some(id) => self.backend.set_item(key, id.as_str()),
            None => self.backend.remove_item(key),
        };
        written.with_context(|| format!("failed to write key '{key}'"))
    }
}

impl<S: KeyValueStore> StoreObserver for PersistenceAdapter<S> {
    fn on_change(&mut self, event: &StoreEvent<'_>) {
        let result = match event {
            StoreEvent::DraftsChanged(drafts) => self.flush_drafts(drafts),
            StoreEvent::CurrentDraftChanged(current) => self.flush_current(*current),
        };
        if let Err(err) = result {
            error!("persistence: flush failed: {err:#}");
        }
    }
}

#[cfg(test)]
#[path = "tests/persistence_tests.rs"]
mod tests;
