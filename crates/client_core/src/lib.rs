//! Draft and step state for the admissions application wizard.
//!
//! [`ApplicationStore`] is the single owner of every [`Draft`]. Front ends
//! construct one at start-up, usually through [`ApplicationStore::restore`]
//! with a [`PersistenceAdapter`], and pass it by reference to whatever needs
//! to read or change application state.

pub mod events;
pub mod persistence;
mod store;

pub use events::{StoreEvent, StoreObserver};
pub use persistence::{
    PersistenceAdapter, RestoredState, StorageKeys, CURRENT_DRAFT_KEY, DRAFTS_STORAGE_KEY,
};
pub use shared::{Draft, DraftId, DraftStats, StepDefinition, StepId, APPLICATION_STEPS};
pub use store::{ApplicationStore, Clock, StepStatus, SystemClock};
