use crate::audit::event::{compute_event_hash, finalize_event, AuditEvent, ZERO_HASH_64};
use crate::determinism::clock::is_rfc3339;
use crate::error::{CoreError, CoreResult};
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

/// Append-only NDJSON log where every event commits to its predecessor.
pub struct AuditLog {
    path: PathBuf,
    last_hash: String,
}

impl AuditLog {
    pub fn open_or_create(path: impl AsRef<Path>) -> CoreResult<Self> {
        let path = path.as_ref().to_path_buf();
        if !path.exists() {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            File::create(&path)?;
            return Ok(Self {
                path,
                last_hash: ZERO_HASH_64.to_string(),
            });
        }

        let mut last_hash = ZERO_HASH_64.to_string();
        for line in BufReader::new(File::open(&path)?).lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let event: AuditEvent = serde_json::from_str(&line)?;
            if event.event_hash.is_empty() {
                return Err(CoreError::InvalidInput(
                    "audit_log line missing event_hash".to_string(),
                ));
            }
            last_hash = event.event_hash;
        }
        Ok(Self { path, last_hash })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Fails if the next [`append`](Self::append) could not open the log.
    pub fn check_writable(&self) -> CoreResult<()> {
        OpenOptions::new().append(true).open(&self.path)?;
        Ok(())
    }

    pub fn append(&mut self, mut event: AuditEvent) -> CoreResult<AuditEvent> {
        event.prev_event_hash = self.last_hash.clone();
        let event = finalize_event(event)?;
        let line = serde_json::to_string(&event)?;
        let mut f = OpenOptions::new().append(true).open(&self.path)?;
        f.write_all(line.as_bytes())?;
        f.write_all(b"\n")?;
        self.last_hash = event.event_hash.clone();
        Ok(event)
    }
}

/// Walks the whole log and returns every broken link or unparseable line.
/// An empty result means the chain is intact.
pub fn verify_audit_chain(path: impl AsRef<Path>) -> CoreResult<Vec<String>> {
    let mut problems = Vec::new();
    let mut prev = ZERO_HASH_64.to_string();
    for (idx, line) in BufReader::new(File::open(path.as_ref())?).lines().enumerate() {
        let line = line?;
        let n = idx + 1;
        if line.trim().is_empty() {
            continue;
        }
        let event: AuditEvent = match serde_json::from_str(&line) {
            Ok(e) => e,
            Err(e) => {
                problems.push(format!("line {}: not an audit event ({})", n, e));
                continue;
            }
        };
        if event.prev_event_hash != prev {
            problems.push(format!(
                "line {}: prev_event_hash {} does not match preceding event {}",
                n, event.prev_event_hash, prev
            ));
        }
        match compute_event_hash(&event) {
            Ok(h) if h == event.event_hash => {}
            Ok(h) => problems.push(format!(
                "line {}: event_hash {} does not match content ({})",
                n, event.event_hash, h
            )),
            Err(e) => problems.push(format!("line {}: cannot hash event ({})", n, e)),
        }
        if !is_rfc3339(&event.ts_utc) {
            problems.push(format!("line {}: ts_utc {:?} is not RFC 3339", n, event.ts_utc));
        }
        prev = event.event_hash;
    }
    Ok(problems)
}
