use provenance_core::audit::event::{finalize_event, AuditEvent, ZERO_HASH_64};
use provenance_core::audit::log::{verify_audit_chain, AuditLog};
use provenance_core::config::LedgerConfig;
use provenance_core::disclosure::bundle::ExportSelection;
use provenance_core::ledger::Ledger;
use provenance_core::registry::model::{CreateClaim, EvidenceKind, RegisterEvidence};
use provenance_core::store::InMemoryStore;
use std::fs;
use std::sync::Arc;

fn event_types(path: &std::path::Path) -> Vec<String> {
    fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(|l| {
            let v: serde_json::Value = serde_json::from_str(l).unwrap();
            v["event_type"].as_str().unwrap().to_string()
        })
        .collect()
}

#[test]
fn event_hash_is_stable() {
    let mut ev = AuditEvent::new(
        "CLAIM_CREATED",
        "analyst",
        "c_1",
        "2026-02-10T00:00:00Z".to_string(),
        serde_json::json!({ "payload_hash": "ab" }),
    );
    ev.prev_event_hash = ZERO_HASH_64.to_string();
    let a = finalize_event(ev.clone()).unwrap().event_hash;
    let b = finalize_event(ev).unwrap().event_hash;
    assert_eq!(a, b);
    assert_eq!(a.len(), 64);
}

#[test]
fn unknown_event_types_and_missing_keys_are_rejected() {
    let mut ev = AuditEvent::new(
        "SOMETHING_ELSE",
        "analyst",
        "c_1",
        "2026-02-10T00:00:00Z".to_string(),
        serde_json::json!({}),
    );
    ev.prev_event_hash = ZERO_HASH_64.to_string();
    assert!(finalize_event(ev.clone()).is_err());
    ev.event_type = "EXPORT_DENIED".to_string();
    assert!(finalize_event(ev).is_err());
}

#[test]
fn ledger_records_mutations_and_export_decisions() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("audit").join("ledger.ndjson");
    let cfg = LedgerConfig {
        audit_log_path: Some(path.clone()),
        ..LedgerConfig::default()
    };
    let ledger = Ledger::new(Arc::new(InMemoryStore::new()), &cfg).unwrap();

    let claim = ledger.create_claim(CreateClaim::new("claim", "analyst")).unwrap();
    let mut req = RegisterEvidence::url(EvidenceKind::Url, "https://a.example/1", "analyst");
    req.license_terms = Some("no-export".to_string());
    req.license_owner = Some("Owner".to_string());
    let e = ledger.register_evidence(req).unwrap();
    ledger.attach(&claim.id, &e.id).unwrap();
    let sel = ExportSelection::Claims(vec![claim.id.clone()]);
    assert!(ledger.export(&sel, "analyst").is_err());

    let open = ledger
        .register_evidence(RegisterEvidence::url(EvidenceKind::Url, "https://b.example/2", "analyst"))
        .unwrap();
    let bundle = ledger
        .export(&ExportSelection::Evidence(vec![open.id]), "analyst")
        .unwrap();
    assert!(ledger.verify(&bundle).unwrap().ok);

    assert_eq!(
        event_types(&path),
        vec![
            "CLAIM_CREATED",
            "EVIDENCE_REGISTERED",
            "EVIDENCE_ATTACHED",
            "EXPORT_REQUESTED",
            "EXPORT_DENIED",
            "EVIDENCE_REGISTERED",
            "EXPORT_REQUESTED",
            "EXPORT_COMPLETED",
            "BUNDLE_VERIFIED",
        ]
    );
    assert!(verify_audit_chain(&path).unwrap().is_empty());
}

#[test]
fn reopened_log_continues_the_chain() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("audit.ndjson");
    let cfg = LedgerConfig {
        audit_log_path: Some(path.clone()),
        ..LedgerConfig::default()
    };
    {
        let ledger = Ledger::new(Arc::new(InMemoryStore::new()), &cfg).unwrap();
        ledger.create_claim(CreateClaim::new("one", "analyst")).unwrap();
    }
    let ledger = Ledger::new(Arc::new(InMemoryStore::new()), &cfg).unwrap();
    ledger.create_claim(CreateClaim::new("two", "analyst")).unwrap();
    assert!(verify_audit_chain(&path).unwrap().is_empty());

    let log = AuditLog::open_or_create(&path).unwrap();
    assert_eq!(log.path(), path.as_path());
}

#[test]
fn edited_line_breaks_the_chain() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("audit.ndjson");
    let cfg = LedgerConfig {
        audit_log_path: Some(path.clone()),
        ..LedgerConfig::default()
    };
    let ledger = Ledger::new(Arc::new(InMemoryStore::new()), &cfg).unwrap();
    ledger.create_claim(CreateClaim::new("first", "alice")).unwrap();
    ledger.create_claim(CreateClaim::new("second", "alice")).unwrap();

    let text = fs::read_to_string(&path).unwrap();
    fs::write(&path, text.replacen("alice", "mallory", 1)).unwrap();

    let problems = verify_audit_chain(&path).unwrap();
    assert!(!problems.is_empty());
    assert!(problems[0].starts_with("line 1:"));
}

#[test]
fn unwritable_log_blocks_mutations_before_they_reach_the_store() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("audit.ndjson");
    let cfg = LedgerConfig {
        audit_log_path: Some(path.clone()),
        ..LedgerConfig::default()
    };
    let store = Arc::new(InMemoryStore::new());
    let ledger = Ledger::new(store.clone(), &cfg).unwrap();
    let claim = ledger.create_claim(CreateClaim::new("kept", "analyst")).unwrap();
    let e = ledger
        .register_evidence(RegisterEvidence::url(EvidenceKind::Url, "https://a.example/1", "analyst"))
        .unwrap();
    assert_eq!((store.claim_count(), store.evidence_count()), (1, 1));

    fs::remove_file(&path).unwrap();

    for _ in 0..3 {
        let req = RegisterEvidence::url(EvidenceKind::Url, "https://b.example/2", "analyst");
        assert!(ledger.register_evidence(req).is_err());
    }
    assert!(ledger.create_claim(CreateClaim::new("lost", "analyst")).is_err());
    assert!(ledger.attach(&claim.id, &e.id).is_err());

    assert_eq!((store.claim_count(), store.evidence_count()), (1, 1));
    assert!(ledger.get_claim(&claim.id).unwrap().evidence_ids.is_empty());
}
