use provenance_core::disclosure::bundle::ExportSelection;
use provenance_core::disclosure::writer::{
    verify_bundle_dir, BundleWriter, BUNDLE_JSON, EVIDENCE_DIR, EVIDENCE_INDEX_CSV,
    FILES_MANIFEST_JSON, MANIFEST_JSON,
};
use provenance_core::ledger::Ledger;
use provenance_core::registry::model::{CreateClaim, EvidenceKind, RegisterEvidence};
use std::fs;

fn exported_bundle(ledger: &Ledger) -> provenance_core::disclosure::bundle::DisclosureBundle {
    let claim = ledger
        .create_claim(CreateClaim::new("Shipment left port on 4 May", "analyst"))
        .unwrap();
    let mut doc = RegisterEvidence::new(EvidenceKind::Document, "analyst");
    doc.content = Some(b"bill of lading".to_vec());
    doc.source_uri = Some("https://registry.example/bl/77".to_string());
    let doc = ledger.register_evidence(doc).unwrap();
    let link = ledger
        .register_evidence(RegisterEvidence::url(
            EvidenceKind::Url,
            "https://tracker.example/vessel/1",
            "analyst",
        ))
        .unwrap();
    ledger.attach(&claim.id, &doc.id).unwrap();
    ledger.attach(&claim.id, &link.id).unwrap();
    ledger
        .export(&ExportSelection::Claims(vec![claim.id]), "analyst")
        .unwrap()
}

#[test]
fn written_bundle_verifies_from_its_own_files() {
    let ledger = Ledger::in_memory();
    let bundle = exported_bundle(&ledger);
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("bundle");

    let files = ledger.write_bundle(&bundle, &out).unwrap();
    for name in [BUNDLE_JSON, MANIFEST_JSON, EVIDENCE_INDEX_CSV, FILES_MANIFEST_JSON] {
        assert!(out.join(name).is_file(), "missing {}", name);
    }
    // Only the document had content; the URL evidence ships no blob.
    let blobs: Vec<_> = fs::read_dir(out.join(EVIDENCE_DIR)).unwrap().collect();
    assert_eq!(blobs.len(), 1);
    assert!(files.files.iter().any(|f| f.path == BUNDLE_JSON));
    assert!(!files.files.iter().any(|f| f.path == FILES_MANIFEST_JSON));

    let v = verify_bundle_dir(&out);
    assert!(v.ok, "{:?}", v.reasons);
}

#[test]
fn flipped_blob_byte_is_detected() {
    let ledger = Ledger::in_memory();
    let bundle = exported_bundle(&ledger);
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("bundle");
    ledger.write_bundle(&bundle, &out).unwrap();

    let doc = &bundle.evidence[0];
    let blob = out.join(EVIDENCE_DIR).join(format!("{}.bin", doc.id));
    let mut bytes = fs::read(&blob).unwrap();
    bytes[0] ^= 0x01;
    fs::write(&blob, bytes).unwrap();

    let v = verify_bundle_dir(&out);
    assert!(!v.ok);
    assert!(v.reasons.iter().any(|r| r.contains(&doc.id)));
}

#[test]
fn edited_bundle_json_is_detected() {
    let ledger = Ledger::in_memory();
    let bundle = exported_bundle(&ledger);
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("bundle");
    ledger.write_bundle(&bundle, &out).unwrap();

    let mut edited = bundle.clone();
    edited.evidence.pop();
    fs::write(out.join(BUNDLE_JSON), serde_json::to_vec_pretty(&edited).unwrap()).unwrap();

    let v = verify_bundle_dir(&out);
    assert!(!v.ok);
    assert!(v.reasons.iter().any(|r| r.contains(BUNDLE_JSON)));
}

#[test]
fn missing_bundle_json_is_a_reason_not_a_panic() {
    let dir = tempfile::tempdir().unwrap();
    let v = verify_bundle_dir(dir.path());
    assert!(!v.ok);
    assert_eq!(v.reasons.len(), 1);
}

#[test]
fn zip_is_byte_stable() {
    let ledger = Ledger::in_memory();
    let bundle = exported_bundle(&ledger);
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("bundle");
    ledger.write_bundle(&bundle, &out).unwrap();

    let first = BundleWriter::build_zip(&out, &dir.path().join("one.zip")).unwrap();
    let second = BundleWriter::build_zip(&out, &dir.path().join("two.zip")).unwrap();
    assert_eq!(first, second);
    assert_eq!(first.len(), 64);
}

#[test]
fn evidence_index_lists_every_item() {
    let ledger = Ledger::in_memory();
    let bundle = exported_bundle(&ledger);
    let dir = tempfile::tempdir().unwrap();
    ledger.write_bundle(&bundle, dir.path()).unwrap();

    let csv = fs::read_to_string(dir.path().join(EVIDENCE_INDEX_CSV)).unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(
        lines[0],
        "evidence_id,sha256,mime,kind,signed,license_owner,license_terms"
    );
    assert_eq!(lines.len(), 1 + bundle.evidence.len());
    for e in &bundle.evidence {
        assert!(csv.contains(&e.hash));
    }
}

#[test]
fn rewriting_into_the_same_dir_still_verifies() {
    let ledger = Ledger::in_memory();
    let bundle = exported_bundle(&ledger);
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("bundle");

    ledger.write_bundle(&bundle, &out).unwrap();
    ledger.write_bundle(&bundle, &out).unwrap();
    let v = verify_bundle_dir(&out);
    assert!(v.ok, "{:?}", v.reasons);
}

#[test]
fn newer_bundle_replaces_older_blobs() {
    let ledger = Ledger::in_memory();
    let first = exported_bundle(&ledger);
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("bundle");
    ledger.write_bundle(&first, &out).unwrap();

    let mut other = RegisterEvidence::new(EvidenceKind::File, "analyst");
    other.content = Some(b"customs form".to_vec());
    let other = ledger.register_evidence(other).unwrap();
    let second = ledger
        .export(&ExportSelection::Evidence(vec![other.id.clone()]), "analyst")
        .unwrap();
    ledger.write_bundle(&second, &out).unwrap();

    let blobs: Vec<_> = fs::read_dir(out.join(EVIDENCE_DIR))
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
        .collect();
    assert_eq!(blobs, vec![format!("{}.bin", other.id)]);
    let v = verify_bundle_dir(&out);
    assert!(v.ok, "{:?}", v.reasons);
}
