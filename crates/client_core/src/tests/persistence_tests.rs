use serde_json::json;
use shared::steps::StepId;
use storage::MemoryStore;

use super::*;

fn stored_draft(id: &str) -> serde_json::Value {
    json!({
        "id": id,
        "name": "Application Draft - 4 Mar 2025, 09:30",
        "createdAt": "2025-03-04T09:30:00Z",
        "updatedAt": "2025-03-04T09:45:00Z",
        "completedSteps": ["program-details"],
        "currentStep": "personal-information",
        "data": { "program-details": { "faculty": "Law" } }
    })
}

#[test]
fn restore_from_empty_backend_is_empty() {
    let adapter = PersistenceAdapter::new(MemoryStore::new());
    assert_eq!(adapter.restore(), RestoredState::default());
}

#[test]
fn restore_reads_drafts_and_current_id() {
    let backend = MemoryStore::with_items([
        (
            DRAFTS_STORAGE_KEY,
            json!([stored_draft("draft_1_aaa"), stored_draft("draft_2_bbb")]).to_string(),
        ),
        (CURRENT_DRAFT_KEY, "draft_2_bbb".to_string()),
    ]);
    let restored = PersistenceAdapter::new(backend).restore();

    assert_eq!(restored.drafts.len(), 2);
    assert_eq!(restored.drafts[0].completed_steps, vec![StepId::ProgramDetails]);
    assert_eq!(
        restored.drafts[0].data.get(&StepId::ProgramDetails),
        Some(&json!({ "faculty": "Law" }))
    );
    assert_eq!(restored.current_draft_id, Some(DraftId::from("draft_2_bbb")));
}

#[test]
fn malformed_drafts_fall_back_to_empty_state() {
    for raw in ["not json", "{\"id\":1}", "[{\"id\":\"x\"}]"] {
        let backend = MemoryStore::with_items([
            (DRAFTS_STORAGE_KEY, raw),
            (CURRENT_DRAFT_KEY, "x"),
        ]);
        let adapter = PersistenceAdapter::new(backend.clone());

        let restored = adapter.restore();
        assert!(restored.drafts.is_empty(), "input {raw}");
        assert_eq!(restored.current_draft_id, Some(DraftId::from("x")));
        assert_eq!(
            backend.get_item(DRAFTS_STORAGE_KEY).expect("get").as_deref(),
            Some(raw)
        );
    }
}

#[test]
fn current_id_is_read_without_a_stored_collection() {
    let backend = MemoryStore::with_items([(CURRENT_DRAFT_KEY, "draft_0_gone")]);
    let restored = PersistenceAdapter::new(backend).restore();

    assert!(restored.drafts.is_empty());
    assert_eq!(restored.current_draft_id, Some(DraftId::from("draft_0_gone")));
}

#[test]
fn unknown_step_ids_are_treated_as_malformed() {
    let mut draft = stored_draft("draft_1_aaa");
    draft["completedSteps"] = json!(["program-selection"]);
    let backend = MemoryStore::with_items([(DRAFTS_STORAGE_KEY, json!([draft]).to_string())]);

    assert!(PersistenceAdapter::new(backend).restore().drafts.is_empty());
}

#[test]
fn restore_collapses_duplicate_completions() {
    let mut draft = stored_draft("draft_1_aaa");
    draft["completedSteps"] = json!(["program-details", "program-details"]);
    let backend = MemoryStore::with_items([(DRAFTS_STORAGE_KEY, json!([draft]).to_string())]);

    let restored = PersistenceAdapter::new(backend).restore();
    assert_eq!(restored.drafts[0].completed_steps, vec![StepId::ProgramDetails]);
}

#[test]
fn empty_current_id_is_ignored() {
    let backend = MemoryStore::with_items([
        (DRAFTS_STORAGE_KEY, "[]"),
        (CURRENT_DRAFT_KEY, ""),
    ]);
    assert_eq!(PersistenceAdapter::new(backend).restore().current_draft_id, None);
}

#[test]
fn flushes_use_configured_keys() {
    let backend = MemoryStore::new();
    let keys = StorageKeys {
        drafts: "drafts".into(),
        current_draft: "current".into(),
    };
    let mut adapter = PersistenceAdapter::with_keys(backend.clone(), keys);
    let id = DraftId::from("draft_1_aaa");

    adapter.on_change(&StoreEvent::DraftsChanged(&[]));
    adapter.on_change(&StoreEvent::CurrentDraftChanged(Some(&id)));
    assert_eq!(backend.get_item("drafts").expect("get").as_deref(), Some("[]"));
    assert_eq!(
        backend.get_item("current").expect("get").as_deref(),
        Some("draft_1_aaa")
    );
    assert_eq!(backend.get_item(DRAFTS_STORAGE_KEY).expect("get"), None);

    adapter.on_change(&StoreEvent::CurrentDraftChanged(None));
    assert_eq!(backend.get_item("current").expect("get"), None);
}

#[test]
fn flushed_collection_round_trips() {
    let backend = MemoryStore::with_items([(
        DRAFTS_STORAGE_KEY,
        json!([stored_draft("draft_1_aaa")]).to_string(),
    )]);
    let adapter = PersistenceAdapter::new(backend);
    let original = adapter.restore().drafts;

    adapter.flush_drafts(&original).expect("flush");
    assert_eq!(adapter.restore().drafts, original);
}
