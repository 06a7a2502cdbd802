//! Flat per-file manifests: one digest per file, verified file by file.

use crate::crypto::digest::{digest_file_with_size, DIGEST_ALGORITHM};
use crate::determinism::json_canonical::to_canonical_bytes;
use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Component, Path};
use tracing::warn;
use walkdir::WalkDir;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FileEntry {
    pub path: String,
    pub sha256: String,
    pub size: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct FileManifest {
    pub files: Vec<FileEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MismatchReason {
    Missing,
    EscapesRoot,
    DigestMismatch { expected: String, actual: String },
    SizeMismatch { expected: u64, actual: u64 },
    Unreadable(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileMismatch {
    pub path: String,
    pub reason: MismatchReason,
}

impl fmt::Display for FileMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.reason {
            MismatchReason::Missing => write!(f, "{}: missing", self.path),
            MismatchReason::EscapesRoot => write!(f, "{}: path escapes root directory", self.path),
            MismatchReason::DigestMismatch { expected, actual } => write!(
                f,
                "{}: {} mismatch (expected {}, got {})",
                self.path, DIGEST_ALGORITHM, expected, actual
            ),
            MismatchReason::SizeMismatch { expected, actual } => write!(
                f,
                "{}: size mismatch (expected {}, got {})",
                self.path, expected, actual
            ),
            MismatchReason::Unreadable(e) => write!(f, "{}: unreadable ({})", self.path, e),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ManifestReport {
    pub checked: usize,
    pub mismatches: Vec<FileMismatch>,
}

impl ManifestReport {
    pub fn is_ok(&self) -> bool {
        self.mismatches.is_empty()
    }

    pub fn into_result(self) -> CoreResult<usize> {
        if self.is_ok() {
            Ok(self.checked)
        } else {
            Err(CoreError::IntegrityMismatch(
                self.mismatches.iter().map(|m| m.to_string()).collect(),
            ))
        }
    }
}

/// Hashes each path as given and records it with `/` separators.
pub fn generate_manifest<P: AsRef<Path>>(paths: &[P]) -> CoreResult<FileManifest> {
    let mut files = Vec::with_capacity(paths.len());
    for p in paths {
        let p = p.as_ref();
        let (sha256, size) = digest_file_with_size(p)?;
        files.push(FileEntry {
            path: slash_path(p),
            sha256,
            size,
        });
    }
    Ok(FileManifest { files })
}

/// Every regular file under `root`, as root-relative paths in sorted order.
pub fn generate_manifest_for_dir(root: &Path) -> CoreResult<FileManifest> {
    let mut files = Vec::new();
    for e in WalkDir::new(root).min_depth(1).sort_by_file_name() {
        let e = e.map_err(|err| CoreError::Io(std::io::Error::other(err)))?;
        if !e.file_type().is_file() {
            continue;
        }
        let rel = e.path().strip_prefix(root).map_err(|_| {
            CoreError::InvalidInput(format!("{} escapes manifest root", e.path().display()))
        })?;
        let (sha256, size) = digest_file_with_size(e.path())?;
        files.push(FileEntry {
            path: slash_path(rel),
            sha256,
            size,
        });
    }
    files.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(FileManifest { files })
}

/// Checks every entry and collects all failures.
///
/// Relative entries resolve under `root_dir` and may not contain `..`.
/// Absolute entries, as written by [`generate_manifest`] for absolute
/// inputs, are read from that absolute location and ignore `root_dir`, so a
/// manifest from an untrusted source can name any readable file. Use
/// [`generate_manifest_for_dir`] when entries must stay under a root.
pub fn verify_manifest_report(root_dir: &Path, manifest: &FileManifest) -> ManifestReport {
    let mut report = ManifestReport::default();
    for entry in &manifest.files {
        report.checked += 1;
        if let Some(reason) = check_entry(root_dir, entry) {
            warn!(path = %entry.path, "file manifest entry failed verification");
            report.mismatches.push(FileMismatch {
                path: entry.path.clone(),
                reason,
            });
        }
    }
    report
}

/// See [`verify_manifest_report`] for how entry paths resolve.
pub fn verify_manifest(root_dir: &Path, manifest: &FileManifest) -> bool {
    verify_manifest_report(root_dir, manifest).is_ok()
}

fn check_entry(root_dir: &Path, entry: &FileEntry) -> Option<MismatchReason> {
    let rel = Path::new(&entry.path);
    if rel.components().any(|c| matches!(c, Component::ParentDir)) {
        return Some(MismatchReason::EscapesRoot);
    }
    let full = root_dir.join(rel);
    if !full.is_file() {
        return Some(MismatchReason::Missing);
    }
    let (actual, size) = match digest_file_with_size(&full) {
        Ok(x) => x,
        Err(e) => return Some(MismatchReason::Unreadable(e.to_string())),
    };
    if actual != entry.sha256.to_ascii_lowercase() {
        return Some(MismatchReason::DigestMismatch {
            expected: entry.sha256.clone(),
            actual,
        });
    }
    if size != entry.size {
        return Some(MismatchReason::SizeMismatch {
            expected: entry.size,
            actual: size,
        });
    }
    None
}

impl FileManifest {
    pub fn save(&self, path: &Path) -> CoreResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, to_canonical_bytes(self)?)?;
        Ok(())
    }

    pub fn load(path: &Path) -> CoreResult<Self> {
        let bytes = fs::read(path)?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

fn slash_path(p: &Path) -> String {
    p.to_string_lossy().replace('\\', "/")
}
