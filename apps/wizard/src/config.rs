use std::{collections::HashMap, fs, path::Path};

use anyhow::Context;
use client_core::{StorageKeys, CURRENT_DRAFT_KEY, DRAFTS_STORAGE_KEY};

pub const DEFAULT_CONFIG_FILE: &str = "wizard.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub database_path: String,
    pub drafts_key: String,
    pub current_draft_key: String,
    pub log_filter: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database_path: "./data/wizard.db".into(),
            drafts_key: DRAFTS_STORAGE_KEY.into(),
            current_draft_key: CURRENT_DRAFT_KEY.into(),
            log_filter: "info".into(),
        }
    }
}

impl Settings {
    pub fn storage_keys(&self) -> StorageKeys {
        StorageKeys {
            drafts: self.drafts_key.clone(),
            current_draft: self.current_draft_key.clone(),
        }
    }
}

/// Defaults, then the TOML file, then environment overrides.
///
/// An explicitly named file must exist and parse; the default
/// `wizard.toml` is optional.
pub fn load_settings(config_path: Option<&Path>) -> anyhow::Result<Settings> {
    let mut settings = Settings::default();

    match config_path {
        Some(path) => {
            let raw = fs::read_to_string(path)
                .with_context(|| format!("failed to read config file '{}'", path.display()))?;
            apply_file(&mut settings, &raw)
                .with_context(|| format!("invalid config file '{}'", path.display()))?;
        }
        None => {
            if let Ok(raw) = fs::read_to_string(DEFAULT_CONFIG_FILE) {
                apply_file(&mut settings, &raw)
                    .with_context(|| format!("invalid config file '{DEFAULT_CONFIG_FILE}'"))?;
            }
        }
    }

    apply_env(&mut settings, |name| std::env::var(name).ok());
    Ok(settings)
}

fn apply_file(settings: &mut Settings, raw: &str) -> anyhow::Result<()> {
    let file_cfg = toml::from_str::<HashMap<String, String>>(raw)?;

    if let Some(v) = file_cfg.get("database_path") {
        settings.database_path = v.clone();
    }
    if let Some(v) = file_cfg.get("drafts_key") {
        settings.drafts_key = v.clone();
    }
    if let Some(v) = file_cfg.get("current_draft_key") {
        settings.current_draft_key = v.clone();
    }
    if let Some(v) = file_cfg.get("log_filter") {
        settings.log_filter = v.clone();
    }

    Ok(())
}

fn apply_env(settings: &mut Settings, var: impl Fn(&str) -> Option<String>) {
    let non_empty = |name: &str| var(name).filter(|v| !v.trim().is_empty());

    if let Some(v) = non_empty("WIZARD_DATABASE_PATH") {
        settings.database_path = v;
    }
    if let Some(v) = non_empty("APP__DATABASE_PATH") {
        settings.database_path = v;
    }

    if let Some(v) = non_empty("WIZARD_DRAFTS_KEY") {
        settings.drafts_key = v;
    }
    if let Some(v) = non_empty("WIZARD_CURRENT_DRAFT_KEY") {
        settings.current_draft_key = v;
    }

    if let Some(v) = non_empty("RUST_LOG") {
        settings.log_filter = v;
    }
    if let Some(v) = non_empty("APP__LOG_FILTER") {
        settings.log_filter = v;
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
