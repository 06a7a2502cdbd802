use crate::crypto::digest::digest_file;
use crate::determinism::json_canonical::to_canonical_bytes;
use crate::determinism::zip::zip_dir_deterministic;
use crate::error::CoreResult;
use crate::manifest::files::{generate_manifest_for_dir, verify_manifest_report, FileManifest};
use crate::manifest::merkle::Manifest;
use crate::store::LedgerStore;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::info;

use super::bundle::{verify_bundle, BundleVerification, DisclosureBundle};
use super::evidence_index::render_evidence_index_csv;

pub const BUNDLE_JSON: &str = "bundle.json";
pub const MANIFEST_JSON: &str = "manifest.json";
pub const FILES_MANIFEST_JSON: &str = "files_manifest.json";
pub const EVIDENCE_INDEX_CSV: &str = "evidence_index.csv";
pub const EVIDENCE_DIR: &str = "evidence";

/// Stored content for every bundled evidence item that has any.
pub fn collect_contents(
    store: &dyn LedgerStore,
    bundle: &DisclosureBundle,
) -> CoreResult<BTreeMap<String, Vec<u8>>> {
    let mut out = BTreeMap::new();
    for e in &bundle.evidence {
        if let Some(bytes) = store.evidence_content(&e.id)? {
            out.insert(e.id.clone(), bytes);
        }
    }
    Ok(out)
}

pub struct BundleWriter;

impl BundleWriter {
    /// Lays the bundle out under `dir` and returns the flat manifest written
    /// to `files_manifest.json`, which covers every other file. An existing
    /// `files_manifest.json` and `evidence/` directory are replaced.
    pub fn write_dir(
        bundle: &DisclosureBundle,
        contents: &BTreeMap<String, Vec<u8>>,
        dir: &Path,
    ) -> CoreResult<FileManifest> {
        fs::create_dir_all(dir)?;
        // A previous bundle's flat manifest and blobs must not be re-hashed
        // into this one.
        let stale_manifest = dir.join(FILES_MANIFEST_JSON);
        if stale_manifest.exists() {
            fs::remove_file(&stale_manifest)?;
        }
        let blobs = dir.join(EVIDENCE_DIR);
        if blobs.exists() {
            fs::remove_dir_all(&blobs)?;
        }

        fs::write(dir.join(BUNDLE_JSON), serde_json::to_vec_pretty(bundle)?)?;
        fs::write(dir.join(MANIFEST_JSON), bundle.manifest.to_json_bytes()?)?;
        fs::write(
            dir.join(EVIDENCE_INDEX_CSV),
            render_evidence_index_csv(&bundle.evidence)?,
        )?;

        fs::create_dir_all(&blobs)?;
        for e in &bundle.evidence {
            if let Some(bytes) = contents.get(&e.id) {
                fs::write(blobs.join(format!("{}.bin", e.id)), bytes)?;
            }
        }

        let files = generate_manifest_for_dir(dir)?;
        fs::write(dir.join(FILES_MANIFEST_JSON), to_canonical_bytes(&files)?)?;
        info!(
            bundle_id = %bundle.bundle_id,
            dir = %dir.display(),
            files = files.files.len(),
            "bundle written"
        );
        Ok(files)
    }

    pub fn build_zip(dir: &Path, out_zip: &Path) -> CoreResult<String> {
        zip_dir_deterministic(dir, out_zip)
    }
}

/// Verifies a directory produced by [`BundleWriter::write_dir`] using only
/// the files inside it.
pub fn verify_bundle_dir(dir: &Path) -> BundleVerification {
    let bundle: DisclosureBundle = match fs::read(dir.join(BUNDLE_JSON))
        .map_err(|e| e.to_string())
        .and_then(|b| serde_json::from_slice(&b).map_err(|e| e.to_string()))
    {
        Ok(b) => b,
        Err(e) => {
            return BundleVerification::from_reasons(vec![format!(
                "{}: cannot be read ({})",
                BUNDLE_JSON, e
            )])
        }
    };

    let mut reasons = Vec::new();

    match fs::read(dir.join(MANIFEST_JSON))
        .map_err(|e| e.to_string())
        .and_then(|b| Manifest::from_json_bytes(&b).map_err(|e| e.to_string()))
    {
        Ok(m) if m == bundle.manifest => {}
        Ok(_) => reasons.push(format!(
            "{} differs from the manifest embedded in {}",
            MANIFEST_JSON, BUNDLE_JSON
        )),
        Err(e) => reasons.push(format!("{}: cannot be read ({})", MANIFEST_JSON, e)),
    }

    match FileManifest::load(&dir.join(FILES_MANIFEST_JSON)) {
        Ok(files) => {
            let report = verify_manifest_report(dir, &files);
            reasons.extend(report.mismatches.iter().map(|m| m.to_string()));
        }
        Err(e) => reasons.push(format!("{}: cannot be read ({})", FILES_MANIFEST_JSON, e)),
    }

    let expected: BTreeMap<&str, &str> = bundle
        .evidence
        .iter()
        .map(|e| (e.id.as_str(), e.hash.as_str()))
        .collect();
    if let Ok(entries) = fs::read_dir(dir.join(EVIDENCE_DIR)) {
        for entry in entries.flatten() {
            let path = entry.path();
            let name = entry.file_name().to_string_lossy().to_string();
            let Some(id) = name.strip_suffix(".bin") else {
                reasons.push(format!("{}/{}: unexpected file", EVIDENCE_DIR, name));
                continue;
            };
            let Some(hash) = expected.get(id) else {
                reasons.push(format!(
                    "{}/{}: no such evidence in bundle",
                    EVIDENCE_DIR, name
                ));
                continue;
            };
            match digest_file(&path) {
                Ok(actual) if actual == *hash => {}
                Ok(actual) => reasons.push(format!(
                    "evidence {}: content hashes to {} but bundle records {}",
                    id, actual, hash
                )),
                Err(e) => reasons.push(format!("evidence {}: content unreadable ({})", id, e)),
            }
        }
    }

    BundleVerification::from_reasons(reasons).merge(verify_bundle(&bundle))
}
