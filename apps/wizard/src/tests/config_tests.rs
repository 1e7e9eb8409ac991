use super::*;

use std::io::Write;

fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let pairs: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |name| pairs.get(name).cloned()
}

#[test]
fn defaults_match_browser_storage_keys() {
    let settings = Settings::default();
    assert_eq!(settings.drafts_key, "uwc_application_drafts");
    assert_eq!(settings.current_draft_key, "uwc_current_draft_id");
    assert_eq!(settings.storage_keys(), StorageKeys::default());
}

#[test]
fn file_values_override_defaults() {
    let mut settings = Settings::default();
    apply_file(
        &mut settings,
        r#"
database_path = "/var/lib/wizard/drafts.db"
drafts_key = "drafts"
"#,
    )
    .expect("valid toml");

    assert_eq!(settings.database_path, "/var/lib/wizard/drafts.db");
    assert_eq!(settings.drafts_key, "drafts");
    assert_eq!(settings.current_draft_key, CURRENT_DRAFT_KEY);
}

#[test]
fn rejects_malformed_file() {
    let mut settings = Settings::default();
    assert!(apply_file(&mut settings, "database_path = [1, 2").is_err());
}

#[test]
fn app_prefixed_env_wins_over_short_names() {
    let mut settings = Settings::default();
    apply_env(
        &mut settings,
        env_from(&[
            ("WIZARD_DATABASE_PATH", "short.db"),
            ("APP__DATABASE_PATH", "prefixed.db"),
            ("RUST_LOG", "debug"),
            ("WIZARD_CURRENT_DRAFT_KEY", "current"),
        ]),
    );

    assert_eq!(settings.database_path, "prefixed.db");
    assert_eq!(settings.log_filter, "debug");
    assert_eq!(settings.current_draft_key, "current");
    assert_eq!(settings.drafts_key, DRAFTS_STORAGE_KEY);
}

#[test]
fn blank_env_values_are_ignored() {
    let mut settings = Settings::default();
    apply_env(&mut settings, env_from(&[("WIZARD_DATABASE_PATH", "  ")]));
    assert_eq!(settings, Settings::default());
}

#[test]
fn explicit_config_file_is_loaded() {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    writeln!(file, "drafts_key = \"drafts-from-file\"").expect("write");
    writeln!(file, "current_draft_key = \"current-from-file\"").expect("write");

    let settings = load_settings(Some(file.path())).expect("settings");
    assert_eq!(settings.drafts_key, "drafts-from-file");
    assert_eq!(settings.current_draft_key, "current-from-file");
}

#[test]
fn missing_explicit_config_file_is_an_error() {
    let temp = tempfile::tempdir().expect("tempdir");
    let missing = temp.path().join("nope.toml");
    assert!(load_settings(Some(missing.as_path())).is_err());
}
