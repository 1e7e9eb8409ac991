use std::{collections::BTreeMap, fmt};

use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::steps::{StepId, TOTAL_STEPS};

const DRAFT_ID_PREFIX: &str = "draft";
const DRAFT_ID_SUFFIX_LEN: usize = 9;
const DEFAULT_NAME_PREFIX: &str = "Application Draft";

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DraftId(pub String);

impl DraftId {
    /// `draft_<unix millis>_<9 lowercase alphanumerics>`
    pub fn generate(now: DateTime<Utc>) -> Self {
        let entropy = Uuid::new_v4().simple().to_string();
        Self(format!(
            "{DRAFT_ID_PREFIX}_{}_{}",
            now.timestamp_millis(),
            &entropy[..DRAFT_ID_SUFFIX_LEN]
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DraftId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DraftId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for DraftId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

pub fn default_draft_name(now: DateTime<Utc>) -> String {
    let local = now.with_timezone(&Local);
    format!("{DEFAULT_NAME_PREFIX} - {}", local.format("%-d %b %Y, %H:%M"))
}

/// A saved, in-progress application with its own step state and form data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Draft {
    pub id: DraftId,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub completed_steps: Vec<StepId>,
    pub current_step: StepId,
    #[serde(default)]
    pub data: BTreeMap<StepId, Value>,
}

impl Draft {
    pub fn new(name: Option<&str>, now: DateTime<Utc>) -> Self {
        let name = name
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| default_draft_name(now));

        Self {
            id: DraftId::generate(now),
            name,
            created_at: now,
            updated_at: now,
            completed_steps: Vec::new(),
            current_step: StepId::FIRST,
            data: BTreeMap::new(),
        }
    }

    pub fn is_step_completed(&self, step: StepId) -> bool {
        self.completed_steps.contains(&step)
    }

    /// The first step is always open; any other step opens once every step
    /// before it has been completed.
    pub fn is_step_unlocked(&self, step: StepId) -> bool {
        step.predecessors()
            .iter()
            .all(|prior| self.is_step_completed(prior.id))
    }

    pub fn progress_percentage(&self) -> u8 {
        progress_percentage(self.completed_steps.len())
    }

    /// Where a returning applicant picks up: the step after however many
    /// have been completed, wrapping to the first once all are done.
    pub fn resume_step(&self) -> StepId {
        StepId::from_index(self.completed_steps.len()).unwrap_or(StepId::FIRST)
    }

    /// Stored payload of `step`. Empty scalars (`null`, `false`, `0`, `""`)
    /// read back as absent.
    pub fn step_data(&self, step: StepId) -> Option<&Value> {
        self.data.get(&step).filter(|payload| !is_empty_scalar(payload))
    }

    pub fn set_step_payload(&mut self, step: StepId, payload: Value, now: DateTime<Utc>) {
        self.data.insert(step, payload);
        self.updated_at = now;
    }

    pub fn complete_step(&mut self, step: StepId, now: DateTime<Utc>) {
        if !self.is_step_completed(step) {
            self.completed_steps.push(step);
        }
        self.current_step = step.next().unwrap_or(step);
        self.updated_at = now;
    }

    pub fn is_in_progress(&self) -> bool {
        !self.completed_steps.is_empty() && self.completed_steps.len() < TOTAL_STEPS
    }

    pub fn is_complete(&self) -> bool {
        StepId::all().all(|step| self.is_step_completed(step))
    }

    /// Drops repeated entries from `completed_steps`, keeping first-seen
    /// order. Returns true when anything was removed.
    pub fn normalize(&mut self) -> bool {
        let before = self.completed_steps.len();
        let mut seen = Vec::with_capacity(before);
        self.completed_steps.retain(|step| {
            if seen.contains(step) {
                false
            } else {
                seen.push(*step);
                true
            }
        });
        before != self.completed_steps.len()
    }
}

fn is_empty_scalar(payload: &Value) -> bool {
    match payload {
        Value::Null => true,
        Value::Bool(flag) => !flag,
        Value::Number(number) => number.as_f64() == Some(0.0),
        Value::String(text) => text.is_empty(),
        Value::Array(_) | Value::Object(_) => false,
    }
}

/// `round(100 * completed / 13)`, zero when nothing is complete.
pub fn progress_percentage(completed: usize) -> u8 {
    if completed == 0 {
        return 0;
    }
    let completed = completed.min(TOTAL_STEPS);
    ((completed * 100) as f64 / TOTAL_STEPS as f64).round() as u8
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DraftStats {
    pub total: usize,
    pub in_progress: usize,
    pub completed: usize,
}

impl DraftStats {
    pub fn from_drafts<'a>(drafts: impl IntoIterator<Item = &'a Draft>) -> Self {
        drafts.into_iter().fold(Self::default(), |mut stats, draft| {
            stats.total += 1;
            if draft.is_in_progress() {
                stats.in_progress += 1;
            }
            if draft.is_complete() {
                stats.completed += 1;
            }
            stats
        })
    }
}
