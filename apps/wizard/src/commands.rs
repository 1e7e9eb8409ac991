use std::io::Write;

use anyhow::{bail, Context, Result};
use clap::Subcommand;
use client_core::{ApplicationStore, Draft, DraftId, StepId};
use serde_json::Value;
use tracing::debug;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start a new application draft and make it current.
    New {
        #[arg(long)]
        name: Option<String>,
    },
    /// List saved drafts.
    List,
    /// Make a saved draft current.
    Load { id: String },
    /// Show the current draft.
    Status,
    /// Show every step with its lock and completion state.
    Steps,
    /// Store form data for a step of the current draft.
    Save { step: StepId, data: String },
    /// Mark a step complete, optionally saving its data first.
    Complete {
        step: StepId,
        #[arg(long)]
        data: Option<String>,
    },
    /// Print the stored data of a step.
    Show { step: StepId },
    Rename { id: String, name: String },
    Delete { id: String },
}

pub fn execute(store: &mut ApplicationStore, command: Command, out: &mut impl Write) -> Result<()> {
    debug!(?command, "wizard: executing");
    match command {
        Command::New { name } => {
            let draft = store.create_new_draft(name.as_deref().map(str::trim));
            writeln!(out, "created {} ({})", draft.id, draft.name)?;
            writeln!(out, "start at {}", draft.current_step.path())?;
        }
        Command::List => list_drafts(store, out)?,
        Command::Load { id } => {
            let id = DraftId::from(id);
            if store.find(&id).is_none() {
                bail!("no draft with id '{id}'");
            }
            store.load_draft(&id);
            if let Some(step) = store.resume_step() {
                writeln!(out, "loaded {id}, continue at {}", step.path())?;
            }
        }
        Command::Status => {
            let Some(draft) = store.current_draft() else {
                writeln!(out, "no current draft")?;
                return Ok(());
            };
            writeln!(out, "{} ({})", draft.name, draft.id)?;
            writeln!(
                out,
                "progress {}% ({} of {} steps)",
                store.progress_percentage(),
                draft.completed_steps.len(),
                StepId::all().count()
            )?;
            writeln!(
                out,
                "current step {} [{}]",
                draft.current_step.title(),
                draft.current_step.path()
            )?;
            writeln!(out, "last saved {}", draft.updated_at.format("%Y-%m-%d %H:%M:%S"))?;
        }
        Command::Steps => {
            for status in store.step_statuses() {
                let marker = if status.completed {
                    "done"
                } else if status.unlocked {
                    "open"
                } else {
                    "locked"
                };
                let pointer = if status.current { ">" } else { " " };
                writeln!(
                    out,
                    "{pointer} {:>2}. {:<24} {:<7} {}",
                    status.step.index() + 1,
                    status.step.title(),
                    marker,
                    status.step.path()
                )?;
            }
        }
        Command::Save { step, data } => {
            ensure_step_open(store, step)?;
            store.save_draft(step, parse_payload(&data)?);
            writeln!(out, "saved {step}")?;
        }
        Command::Complete { step, data } => {
            ensure_step_open(store, step)?;
            if let Some(data) = data {
                store.save_draft(step, parse_payload(&data)?);
            }
            store.complete_step(step);
            match store.next_step(step) {
                Some(next) => writeln!(out, "completed {step}, next {}", next.path())?,
                None => writeln!(
                    out,
                    "completed {step}, application {}% complete",
                    store.progress_percentage()
                )?,
            }
        }
        Command::Show { step } => match store.step_data(step) {
            Some(payload) => writeln!(out, "{}", serde_json::to_string_pretty(payload)?)?,
            None => writeln!(out, "null")?,
        },
        Command::Rename { id, name } => {
            let id = DraftId::from(id);
            let name = name.trim();
            if name.is_empty() {
                bail!("draft name must not be empty");
            }
            if store.find(&id).is_none() {
                bail!("no draft with id '{id}'");
            }
            store.rename_draft(&id, name);
            writeln!(out, "renamed {id} to {name}")?;
        }
        Command::Delete { id } => {
            let id = DraftId::from(id);
            if store.find(&id).is_none() {
                bail!("no draft with id '{id}'");
            }
            store.delete_draft(&id);
            writeln!(out, "deleted {id}")?;
        }
    }
    Ok(())
}

fn list_drafts(store: &ApplicationStore, out: &mut impl Write) -> Result<()> {
    if store.drafts().is_empty() {
        writeln!(out, "no drafts")?;
        return Ok(());
    }

    let current = store.current_draft().map(|draft| &draft.id);
    for draft in store.drafts() {
        let marker = if Some(&draft.id) == current { "*" } else { " " };
        writeln!(out, "{marker} {}", describe(draft))?;
    }

    let stats = store.stats();
    writeln!(
        out,
        "{} drafts, {} in progress, {} complete",
        stats.total, stats.in_progress, stats.completed
    )?;
    Ok(())
}

fn describe(draft: &Draft) -> String {
    format!(
        "{}  {}  {}%  updated {}",
        draft.id,
        draft.name,
        draft.progress_percentage(),
        draft.updated_at.format("%Y-%m-%d %H:%M")
    )
}

/// Mirrors the navigation gate: a step can only be worked on once it is
/// unlocked for the current draft.
fn ensure_step_open(store: &ApplicationStore, step: StepId) -> Result<()> {
    if store.current_draft().is_none() {
        bail!("no current draft, run `wizard new` or `wizard load <id>` first");
    }
    if !store.is_step_unlocked(step) {
        let blocking = step
            .predecessors()
            .iter()
            .find(|prior| !store.is_step_completed(prior.id))
            .map(|prior| prior.id)
            .unwrap_or(StepId::FIRST);
        bail!("step '{step}' is locked, complete '{blocking}' first");
    }
    Ok(())
}

fn parse_payload(raw: &str) -> Result<Value> {
    serde_json::from_str(raw).context("step data must be valid JSON")
}

#[cfg(test)]
#[path = "tests/commands_tests.rs"]
mod tests;
