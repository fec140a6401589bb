use std::fs;
use std::io::Write;
use std::path::Path;

use tempfile::{Builder, NamedTempFile};

use crate::PersistError;

/// Makes sure `dir` exists and accepts new files.
///
/// Returns `true` when the directory had to be created.
pub fn ensure_output_dir(dir: &Path) -> Result<bool, PersistError> {
    let outdir_error = |e: std::io::Error| PersistError::OutputDir(format!("{}: {e}", dir.display()));

    let created = match fs::metadata(dir) {
        Ok(meta) if meta.is_dir() => false,
        Ok(_) => {
            return Err(PersistError::OutputDir(format!(
                "{} is not a directory",
                dir.display()
            )))
        }
        Err(_) => {
            fs::create_dir_all(dir).map_err(outdir_error)?;
            true
        }
    };

    Builder::new()
        .prefix(".rem-write-probe")
        .tempfile_in(dir)
        .map_err(outdir_error)?;
    Ok(created)
}

/// Replaces `target` in one step: the content is written and synced to a
/// sibling temp file which is then renamed over the target.
pub fn write_atomic(target: &Path, content: &[u8]) -> Result<(), PersistError> {
    let parent = match target.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent)?;

    let mut tmp = NamedTempFile::new_in(parent)?;
    tmp.write_all(content)?;
    tmp.as_file_mut().sync_all()?;
    tmp.persist(target).map_err(|e| PersistError::Io(e.error))?;
    Ok(())
}
