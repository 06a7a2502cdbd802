use crate::error::CoreResult;
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Name of the content digest. Persisted manifests are only comparable when
/// they were produced with the same function.
pub const DIGEST_ALGORITHM: &str = "sha256";

/// Lowercase hex SHA-256 of `bytes`. Total: the empty slice has a digest too.
pub fn digest(bytes: &[u8]) -> String {
    let mut h = Sha256::new();
    h.update(bytes);
    hex::encode(h.finalize())
}

/// Streams a file through SHA-256 and returns `(hex_digest, size_in_bytes)`.
pub fn digest_file_with_size(path: &Path) -> CoreResult<(String, u64)> {
    let mut f = File::open(path)?;
    let mut h = Sha256::new();
    let mut buf = [0u8; 8192];
    let mut size = 0u64;
    loop {
        let n = f.read(&mut buf)?;
        if n == 0 {
            break;
        }
        size += n as u64;
        h.update(&buf[..n]);
    }
    Ok((hex::encode(h.finalize()), size))
}

pub fn digest_file(path: &Path) -> CoreResult<String> {
    digest_file_with_size(path).map(|(d, _)| d)
}

pub fn is_hex_digest(s: &str) -> bool {
    s.len() == 64 && s.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase())
}
