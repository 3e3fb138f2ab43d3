use std::fs;
use std::io::{self, Write};
use std::path::Path;

/// Prefix of the temporary files used while an artifact is being written.
pub const TEMP_FILE_PREFIX: &str = ".upload-";

/// Write `bytes` to `path` through a temporary sibling file and an atomic
/// rename, so `path` is either absent, the previous content or the full new
/// content.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let dir = path.parent().ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("{} has no parent directory", path.display()),
        )
    })?;

    let mut tmp = tempfile::Builder::new()
        .prefix(TEMP_FILE_PREFIX)
        .tempfile_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// Remove `path`, treating a missing file as success.
///
/// Returns whether a file was actually removed.
pub fn remove_if_present(path: &Path) -> io::Result<bool> {
    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}
