//! The ledger facade: one store shared by the registry, claim store, scorer,
//! and exporter, plus an optional audit log of every mutation and export
//! decision.

use crate::audit::event::AuditEvent;
use crate::audit::log::AuditLog;
use crate::config::LedgerConfig;
use crate::determinism::clock::now_rfc3339_utc;
use crate::disclosure::bundle::{
    verify_bundle, BundleExporter, BundleVerification, DisclosureBundle, ExportSelection,
};
use crate::disclosure::license_gate::LicenseGate;
use crate::disclosure::writer::{collect_contents, BundleWriter};
use crate::error::{CoreError, CoreResult};
use crate::manifest::files::FileManifest;
use crate::registry::claims::ClaimStore;
use crate::registry::evidence::EvidenceRegistry;
use crate::registry::model::{Claim, CreateClaim, Evidence, RegisterEvidence};
use crate::scoring::corroboration::{Corroboration, CorroborationScorer};
use crate::store::{InMemoryStore, LedgerStore};
use serde_json::json;
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::warn;

pub const SYSTEM_ACTOR: &str = "system";

pub struct Ledger {
    store: Arc<dyn LedgerStore>,
    evidence: EvidenceRegistry,
    claims: ClaimStore,
    scorer: CorroborationScorer,
    exporter: BundleExporter,
    audit: Option<Mutex<AuditLog>>,
}

impl Ledger {
    pub fn new(store: Arc<dyn LedgerStore>, cfg: &LedgerConfig) -> CoreResult<Self> {
        cfg.validate()?;
        let audit = match &cfg.audit_log_path {
            Some(p) => Some(Mutex::new(AuditLog::open_or_create(p)?)),
            None => None,
        };
        Ok(Self::assemble(store, cfg, audit))
    }

    /// Fresh in-memory store, default configuration, no audit log.
    pub fn in_memory() -> Self {
        Self::assemble(
            Arc::new(InMemoryStore::new()),
            &LedgerConfig::default(),
            None,
        )
    }

    fn assemble(
        store: Arc<dyn LedgerStore>,
        cfg: &LedgerConfig,
        audit: Option<Mutex<AuditLog>>,
    ) -> Self {
        Self {
            evidence: EvidenceRegistry::new(store.clone()),
            claims: ClaimStore::new(store.clone()),
            scorer: CorroborationScorer::new(cfg.scoring.clone()),
            exporter: BundleExporter::new(store.clone(), LicenseGate::new(&cfg.license)),
            store,
            audit,
        }
    }

    pub fn store(&self) -> &Arc<dyn LedgerStore> {
        &self.store
    }

    pub fn register_evidence(&self, req: RegisterEvidence) -> CoreResult<Evidence> {
        self.check_audit()?;
        let registered = self.evidence.register_detailed(req)?;
        let e = &registered.evidence;
        self.record(AuditEvent::new(
            "EVIDENCE_REGISTERED",
            &e.actor,
            &e.id,
            e.created_at.clone(),
            json!({
                "hash": e.hash,
                "kind": e.kind,
                "signed": e.signed,
                "signature_status": registered.signature,
            }),
        ))?;
        Ok(registered.evidence)
    }

    pub fn get_evidence(&self, id: &str) -> CoreResult<Evidence> {
        self.evidence.get(id)
    }

    pub fn create_claim(&self, req: CreateClaim) -> CoreResult<Claim> {
        self.check_audit()?;
        let claim = self.claims.create(req)?;
        self.record(AuditEvent::new(
            "CLAIM_CREATED",
            &claim.actor,
            &claim.id,
            claim.created_at.clone(),
            json!({ "payload_hash": claim.payload_hash }),
        ))?;
        Ok(claim)
    }

    pub fn get_claim(&self, id: &str) -> CoreResult<Claim> {
        self.claims.get(id)
    }

    pub fn attach(&self, claim_id: &str, evidence_id: &str) -> CoreResult<bool> {
        self.check_audit()?;
        let added = self.claims.attach(claim_id, evidence_id)?;
        self.record(AuditEvent::new(
            "EVIDENCE_ATTACHED",
            SYSTEM_ACTOR,
            claim_id,
            now_rfc3339_utc(),
            json!({ "evidence_id": evidence_id, "added": added }),
        ))?;
        Ok(added)
    }

    /// Scores the claim's evidence as it stands right now.
    pub fn corroboration(&self, claim_id: &str) -> CoreResult<Corroboration> {
        let evidence = self.claims.evidence_for(claim_id)?;
        Ok(self.scorer.score(&evidence))
    }

    pub fn export(&self, selection: &ExportSelection, actor: &str) -> CoreResult<DisclosureBundle> {
        let subject = match selection {
            ExportSelection::Claims(ids) | ExportSelection::Evidence(ids) => ids.join(","),
        };
        self.record(AuditEvent::new(
            "EXPORT_REQUESTED",
            actor,
            &subject,
            now_rfc3339_utc(),
            json!({ "selection": selection }),
        ))?;

        match self.exporter.export(selection) {
            Ok(bundle) => {
                self.record(AuditEvent::new(
                    "EXPORT_COMPLETED",
                    actor,
                    &bundle.bundle_id,
                    now_rfc3339_utc(),
                    json!({
                        "manifest_root": bundle.manifest.root,
                        "claim_count": bundle.claims.len(),
                        "evidence_count": bundle.evidence.len(),
                    }),
                ))?;
                Ok(bundle)
            }
            Err(CoreError::PolicyDenied(denial)) => {
                self.record(AuditEvent::new(
                    "EXPORT_DENIED",
                    actor,
                    &subject,
                    now_rfc3339_utc(),
                    json!({ "violations": denial.violations }),
                ))?;
                Err(CoreError::PolicyDenied(denial))
            }
            Err(e) => Err(e),
        }
    }

    pub fn verify(&self, bundle: &DisclosureBundle) -> CoreResult<BundleVerification> {
        let result = verify_bundle(bundle);
        self.record(AuditEvent::new(
            "BUNDLE_VERIFIED",
            SYSTEM_ACTOR,
            &bundle.bundle_id,
            now_rfc3339_utc(),
            json!({ "ok": result.ok, "reasons": result.reasons }),
        ))?;
        Ok(result)
    }

    /// Writes the bundle with whatever evidence content the store holds.
    pub fn write_bundle(&self, bundle: &DisclosureBundle, dir: &Path) -> CoreResult<FileManifest> {
        let contents = collect_contents(self.store.as_ref(), bundle)?;
        BundleWriter::write_dir(bundle, &contents, dir)
    }

    // Mutations check the log first so a store write never lands without its
    // event because the log went away.
    fn check_audit(&self) -> CoreResult<()> {
        if let Some(audit) = &self.audit {
            let log = audit.lock().unwrap_or_else(PoisonError::into_inner);
            if let Err(e) = log.check_writable() {
                warn!(path = %log.path().display(), error = %e, "audit log not writable");
                return Err(e);
            }
        }
        Ok(())
    }

    fn record(&self, event: AuditEvent) -> CoreResult<()> {
        if let Some(audit) = &self.audit {
            let mut log = audit.lock().unwrap_or_else(PoisonError::into_inner);
            log.append(event)?;
        }
        Ok(())
    }
}
