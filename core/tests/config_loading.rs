use provenance_core::config::LedgerConfig;
use provenance_core::error::CoreError;
use std::fs;

#[test]
fn defaults_apply_to_missing_fields() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ledger.json");
    fs::write(&path, r#"{"scoring": {"saturation": 2.0}}"#).unwrap();

    let cfg = LedgerConfig::load(&path).unwrap();
    assert_eq!(cfg.scoring.saturation, 2.0);
    assert_eq!(cfg.scoring.duplicate_domain_weight, 0.25);
    assert_eq!(cfg.license.denied_terms, vec!["no-export"]);
    assert!(cfg.audit_log_path.is_none());
}

#[test]
fn out_of_range_weights_are_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ledger.json");
    fs::write(&path, r#"{"scoring": {"duplicate_domain_weight": 1.0}}"#).unwrap();
    assert!(matches!(
        LedgerConfig::load(&path).unwrap_err(),
        CoreError::InvalidInput(_)
    ));

    fs::write(&path, r#"{"scoring": {"saturation": 0}}"#).unwrap();
    assert!(LedgerConfig::load(&path).is_err());

    fs::write(&path, r#"{"license": {"denied_terms": [" "]}}"#).unwrap();
    assert!(LedgerConfig::load(&path).is_err());
}

#[test]
fn default_config_is_valid() {
    assert!(LedgerConfig::default().validate().is_ok());
}
