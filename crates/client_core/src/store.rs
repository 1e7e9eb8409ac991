use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use shared::{
    domain::{Draft, DraftId, DraftStats},
    steps::StepId,
};
use storage::KeyValueStore;
use tracing::{debug, info, warn};

use crate::{
    events::{StoreEvent, StoreObserver},
    persistence::PersistenceAdapter,
};

pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Navigation state of one step, as a sidebar would render it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StepStatus {
    pub step: StepId,
    pub unlocked: bool,
    pub completed: bool,
    pub current: bool,
}

/// Owns every draft and tracks which one the applicant is working on.
///
/// Operations that need a current draft are silent no-ops without one.
/// Registered observers hear about each change after it is applied.
///
/// The current draft is held as its own snapshot and written back into the
/// collection on each step mutation. A rename of the current draft updates
/// its name in the snapshot but leaves the snapshot's `updated_at` alone,
/// while the collection entry gets a fresh timestamp.
pub struct ApplicationStore {
    drafts: Vec<Draft>,
    current: Option<Draft>,
    observers: Vec<Box<dyn StoreObserver>>,
    clock: Box<dyn Clock>,
}

impl Default for ApplicationStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ApplicationStore {
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }

    pub fn with_clock(clock: impl Clock + 'static) -> Self {
        Self {
            drafts: Vec::new(),
            current: None,
            observers: Vec::new(),
            clock: Box::new(clock),
        }
    }

    /// Hydrates from `adapter`'s backend, then keeps it in sync.
    pub fn restore<S: KeyValueStore + 'static>(adapter: PersistenceAdapter<S>) -> Self {
        Self::restore_with_clock(adapter, SystemClock)
    }

    pub fn restore_with_clock<S: KeyValueStore + 'static>(
        adapter: PersistenceAdapter<S>,
        clock: impl Clock + 'static,
    ) -> Self {
        let restored = adapter.restore();
        let mut store = Self::with_clock(clock);
        store.drafts = restored.drafts;

        if let Some(id) = restored.current_draft_id {
            store.current = store.find(&id).cloned();
            if store.current.is_none() {
                debug!(draft_id = %id, "drafts: stored current draft not found, leaving unset");
                if let Err(err) = adapter.flush_current(None) {
                    warn!("drafts: failed to clear stale current draft id: {err:#}");
                }
            }
        }

        info!(
            drafts = store.drafts.len(),
            current = ?store.current.as_ref().map(|draft| draft.id.as_str()),
            "drafts: restored"
        );
        store.subscribe(adapter);
        store
    }

    pub fn subscribe(&mut self, observer: impl StoreObserver + 'static) {
        self.observers.push(Box::new(observer));
    }

    pub fn drafts(&self) -> &[Draft] {
        &self.drafts
    }

    pub fn current_draft(&self) -> Option<&Draft> {
        self.current.as_ref()
    }

    pub fn find(&self, id: &DraftId) -> Option<&Draft> {
        self.drafts.iter().find(|draft| &draft.id == id)
    }

    pub fn create_new_draft(&mut self, name: Option<&str>) -> Draft {
        let draft = Draft::new(name, self.clock.now());
        info!(draft_id = %draft.id, name = %draft.name, "drafts: created");

        self.drafts.push(draft.clone());
        self.current = Some(draft.clone());
        self.notify_drafts_changed();
        self.notify_current_changed();
        draft
    }

    pub fn load_draft(&mut self, id: &DraftId) {
        let Some(draft) = self.find(id).cloned() else {
            debug!(draft_id = %id, "drafts: load ignored, no such draft");
            return;
        };

        let identity_changed = self.current_id() != Some(id);
        self.current = Some(draft);
        if identity_changed {
            self.notify_current_changed();
        }
    }

    pub fn save_draft(&mut self, step: StepId, data: Value) {
        self.update_step_payload(step, data);
    }

    /// Same as [`ApplicationStore::save_draft`].
    pub fn set_step_data(&mut self, step: StepId, data: Value) {
        self.update_step_payload(step, data);
    }

    fn update_step_payload(&mut self, step: StepId, data: Value) {
        let now = self.clock.now();
        let Some(current) = self.current.as_mut() else {
            debug!(step = %step, "drafts: save ignored, no current draft");
            return;
        };

        current.set_step_payload(step, data, now);
        debug!(draft_id = %current.id, step = %step, "drafts: step data saved");
        self.write_back_current();
    }

    pub fn complete_step(&mut self, step: StepId) {
        let now = self.clock.now();
        let Some(current) = self.current.as_mut() else {
            debug!(step = %step, "drafts: complete ignored, no current draft");
            return;
        };

        current.complete_step(step, now);
        info!(
            draft_id = %current.id,
            step = %step,
            next = %current.current_step,
            "drafts: step completed"
        );
        self.write_back_current();
    }

    pub fn delete_draft(&mut self, id: &DraftId) {
        let before = self.drafts.len();
        self.drafts.retain(|draft| &draft.id != id);
        if self.drafts.len() != before {
            info!(draft_id = %id, "drafts: deleted");
            self.notify_drafts_changed();
        }

        if self.current_id() == Some(id) {
            self.current = None;
            self.notify_current_changed();
        }
    }

    pub fn rename_draft(&mut self, id: &DraftId, new_name: &str) {
        let now = self.clock.now();
        let Some(draft) = self.drafts.iter_mut().find(|draft| &draft.id == id) else {
            debug!(draft_id = %id, "drafts: rename ignored, no such draft");
            return;
        };

        draft.name = new_name.to_string();
        draft.updated_at = now;
        if let Some(current) = self.current.as_mut().filter(|current| &current.id == id) {
            current.name = new_name.to_string();
        }

        info!(draft_id = %id, name = new_name, "drafts: renamed");
        self.notify_drafts_changed();
    }

    pub fn completed_steps(&self) -> &[StepId] {
        self.current
            .as_ref()
            .map(|draft| draft.completed_steps.as_slice())
            .unwrap_or_default()
    }

    pub fn current_step(&self) -> StepId {
        self.current
            .as_ref()
            .map(|draft| draft.current_step)
            .unwrap_or(StepId::FIRST)
    }

    pub fn is_step_unlocked(&self, step: StepId) -> bool {
        let completed = self.completed_steps();
        step.predecessors()
            .iter()
            .all(|prior| completed.contains(&prior.id))
    }

    pub fn is_step_completed(&self, step: StepId) -> bool {
        self.completed_steps().contains(&step)
    }

    pub fn next_step(&self, step: StepId) -> Option<StepId> {
        step.next()
    }

    pub fn previous_step(&self, step: StepId) -> Option<StepId> {
        step.previous()
    }

    pub fn step_index(&self, step: StepId) -> usize {
        step.index()
    }

    pub fn progress_percentage(&self) -> u8 {
        shared::domain::progress_percentage(self.completed_steps().len())
    }

    pub fn step_data(&self, step: StepId) -> Option<&Value> {
        self.current.as_ref()?.step_data(step)
    }

    /// Step an applicant resumes at, when a draft is current.
    pub fn resume_step(&self) -> Option<StepId> {
        self.current.as_ref().map(Draft::resume_step)
    }

    pub fn stats(&self) -> DraftStats {
        DraftStats::from_drafts(&self.drafts)
    }

    /// Per-step navigation state. Without a current draft every step is
    /// locked.
    pub fn step_statuses(&self) -> Vec<StepStatus> {
        let has_draft = self.current.is_some();
        let current_step = self.current_step();
        StepId::all()
            .map(|step| StepStatus {
                step,
                unlocked: has_draft && self.is_step_unlocked(step),
                completed: has_draft && self.is_step_completed(step),
                current: has_draft && step == current_step,
            })
            .collect()
    }

    fn current_id(&self) -> Option<&DraftId> {
        self.current.as_ref().map(|draft| &draft.id)
    }

    fn write_back_current(&mut self) {
        let Some(current) = self.current.as_ref() else {
            return;
        };
        if let Some(slot) = self.drafts.iter_mut().find(|draft| draft.id == current.id) {
            *slot = current.clone();
        }
        self.notify_drafts_changed();
    }

    fn notify_drafts_changed(&mut self) {
        let event = StoreEvent::DraftsChanged(&self.drafts);
        for observer in &mut self.observers {
            observer.on_change(&event);
        }
    }

    fn notify_current_changed(&mut self) {
        let event = StoreEvent::CurrentDraftChanged(self.current.as_ref().map(|draft| &draft.id));
        for observer in &mut self.observers {
            observer.on_change(&event);
        }
    }
}

#[cfg(test)]
#[path = "tests/store_tests.rs"]
mod tests;
