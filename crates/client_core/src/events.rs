//! Change notifications raised by [`crate::ApplicationStore`] after each mutation.

use shared::domain::{Draft, DraftId};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StoreEvent<'a> {
    /// The draft collection changed; carries the full collection.
    DraftsChanged(&'a [Draft]),
    /// The identity of the current draft changed.
    CurrentDraftChanged(Option<&'a DraftId>),
}

pub trait StoreObserver {
    fn on_change(&mut self, event: &StoreEvent<'_>);
}
