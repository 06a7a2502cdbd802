use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use ed25519_dalek::{Signer, SigningKey};
use provenance_core::crypto::digest::{digest, is_hex_digest};
use provenance_core::crypto::signature::{
    check_encoded_signature, fingerprint, verify_signature, SignatureStatus,
};
use provenance_core::ledger::Ledger;
use provenance_core::registry::model::{EvidenceKind, RegisterEvidence};

fn signing_key() -> SigningKey {
    SigningKey::from_bytes(&[7u8; 32])
}

#[test]
fn digest_is_deterministic_and_known() {
    assert_eq!(
        digest(b""),
        "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
    );
    assert_eq!(
        digest(b"hello"),
        "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
    );
    assert_eq!(digest(b"hello"), digest(b"hello"));
    assert!(is_hex_digest(&digest(b"anything")));
}

#[test]
fn valid_signature_yields_fingerprint() {
    let sk = signing_key();
    let payload = b"evidence bytes";
    let sig = sk.sign(payload).to_bytes();
    let pk = sk.verifying_key().to_bytes();

    let (ok, fp) = verify_signature(&pk, payload, &sig);
    assert!(ok);
    assert_eq!(fp.as_deref(), Some(fingerprint(&pk).as_str()));
    assert!(fp.unwrap().starts_with("sha256:"));
}

#[test]
fn wrong_payload_or_garbage_never_panics() {
    let sk = signing_key();
    let sig = sk.sign(b"original").to_bytes();
    let pk = sk.verifying_key().to_bytes();

    assert_eq!(verify_signature(&pk, b"altered", &sig), (false, None));
    assert_eq!(verify_signature(&pk[..10], b"original", &sig), (false, None));
    assert_eq!(verify_signature(&pk, b"original", b"short"), (false, None));
    assert_eq!(verify_signature(&[], &[], &[]), (false, None));
}

#[test]
fn encoded_signature_accepts_hex_and_base64() {
    let sk = signing_key();
    let payload = b"payload";
    let sig = sk.sign(payload).to_bytes();
    let pk = sk.verifying_key().to_bytes();

    let hex_status =
        check_encoded_signature(Some(&hex::encode(pk)), payload, Some(&hex::encode(sig)));
    assert!(hex_status.is_verified());

    let b64_status =
        check_encoded_signature(Some(&BASE64.encode(pk)), payload, Some(&BASE64.encode(sig)));
    assert!(b64_status.is_verified());

    assert_eq!(
        check_encoded_signature(None, payload, Some("abcd")),
        SignatureStatus::Absent
    );
    assert!(matches!(
        check_encoded_signature(Some("%%%not-a-key%%%"), payload, Some("abcd")),
        SignatureStatus::Malformed { .. }
    ));
}

#[test]
fn registry_hashes_content_before_url() {
    let ledger = Ledger::in_memory();
    let mut req = RegisterEvidence::url(EvidenceKind::File, "https://example.org/a.pdf", "analyst");
    req.content = Some(b"pdf bytes".to_vec());
    let e = ledger.register_evidence(req).unwrap();
    assert_eq!(e.hash, digest(b"pdf bytes"));
    assert_eq!(e.mime, "application/octet-stream");

    let e = ledger
        .register_evidence(RegisterEvidence::url(
            EvidenceKind::Url,
            "https://example.org/page",
            "analyst",
        ))
        .unwrap();
    assert_eq!(e.hash, digest(b"https://example.org/page"));
    assert_eq!(e.mime, "text/uri-list");

    let e = ledger
        .register_evidence(RegisterEvidence::new(EvidenceKind::Document, "analyst"))
        .unwrap();
    assert_eq!(e.hash, digest(b""));
}

#[test]
fn registry_records_signature_outcome_fail_closed() {
    let ledger = Ledger::in_memory();
    let sk = signing_key();
    let content = b"signed memo".to_vec();
    let pk_hex = hex::encode(sk.verifying_key().to_bytes());

    let mut good = RegisterEvidence::new(EvidenceKind::Document, "analyst");
    good.content = Some(content.clone());
    good.public_key = Some(pk_hex.clone());
    good.signature = Some(hex::encode(sk.sign(&content).to_bytes()));
    let e = ledger.register_evidence(good).unwrap();
    assert!(e.signed);
    assert_eq!(
        e.signer_fingerprint.as_deref(),
        Some(fingerprint(&sk.verifying_key().to_bytes()).as_str())
    );

    let mut bad = RegisterEvidence::new(EvidenceKind::Document, "analyst");
    bad.content = Some(content.clone());
    bad.public_key = Some(pk_hex.clone());
    bad.signature = Some(hex::encode(sk.sign(b"something else").to_bytes()));
    let e = ledger.register_evidence(bad).unwrap();
    assert!(!e.signed);
    assert!(e.signer_fingerprint.is_none());

    let mut malformed = RegisterEvidence::new(EvidenceKind::Document, "analyst");
    malformed.content = Some(content.clone());
    malformed.public_key = Some(pk_hex);
    malformed.signature = Some("not base64 !!".to_string());
    let e = ledger.register_evidence(malformed).unwrap();
    assert!(!e.signed);

    let mut key_only = RegisterEvidence::new(EvidenceKind::Document, "analyst");
    key_only.content = Some(content);
    key_only.public_key = Some(hex::encode(sk.verifying_key().to_bytes()));
    let e = ledger.register_evidence(key_only).unwrap();
    assert!(!e.signed);
}

#[test]
fn registry_rejects_empty_actor_and_unknown_ids() {
    let ledger = Ledger::in_memory();
    let err = ledger
        .register_evidence(RegisterEvidence::new(EvidenceKind::Url, "  "))
        .unwrap_err();
    assert_eq!(err.http_status(), 400);

    let err = ledger.get_evidence("e_missing").unwrap_err();
    assert_eq!(err.http_status(), 404);
}
