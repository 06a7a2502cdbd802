use crate::crypto::digest::digest_file;
use crate::error::{CoreError, CoreResult};
use std::fs::File;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;
use zip::write::{FileOptions, ZipWriter};
use zip::CompressionMethod;

/// Packs `root_dir` into `out_zip` so identical directory contents always yield
/// identical archive bytes, and returns the archive's SHA-256.
///
/// Entries are sorted by their `/`-separated relative path, stamped with the
/// DOS epoch, and given fixed permissions and compression. The archive comment
/// is empty.
pub fn zip_dir_deterministic(root_dir: &Path, out_zip: &Path) -> CoreResult<String> {
    let mut entries: Vec<(PathBuf, String, bool)> = Vec::new();

    for e in WalkDir::new(root_dir).min_depth(1) {
        let e = e.map_err(|err| CoreError::Io(std::io::Error::other(err)))?;
        let p = e.path();
        let rel = p
            .strip_prefix(root_dir)
            .map_err(|_| CoreError::InvalidInput(format!("{} escapes zip root", p.display())))?;
        let mut rel_s = rel.to_string_lossy().replace('\\', "/");
        if e.file_type().is_dir() {
            if !rel_s.ends_with('/') {
                rel_s.push('/');
            }
            entries.push((p.to_path_buf(), rel_s, true));
        } else if e.file_type().is_file() {
            entries.push((p.to_path_buf(), rel_s, false));
        }
    }
    entries.sort_by(|a, b| a.1.cmp(&b.1));

    let f = File::create(out_zip)?;
    let mut zw = ZipWriter::new(f);

    let fixed_time = zip::DateTime::from_date_and_time(1980, 1, 1, 0, 0, 0).map_err(|_| {
        CoreError::DeterminismViolation("failed to create fixed zip datetime".to_string())
    })?;
    let base_opts = FileOptions::<()>::default()
        .compression_method(CompressionMethod::Deflated)
        .compression_level(Some(9))
        .last_modified_time(fixed_time);

    for (abs_path, rel, is_dir) in entries {
        if is_dir {
            zw.add_directory(rel, base_opts.unix_permissions(0o755))
                .map_err(|e| CoreError::Zip(e.to_string()))?;
            continue;
        }
        zw.start_file(rel, base_opts.unix_permissions(0o644))
            .map_err(|e| CoreError::Zip(e.to_string()))?;
        let mut rf = File::open(abs_path)?;
        std::io::copy(&mut rf, &mut zw)?;
    }

    zw.set_comment("");
    zw.finish().map_err(|e| CoreError::Zip(e.to_string()))?;

    digest_file(out_zip)
}
