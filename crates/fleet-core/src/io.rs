use crate::error::Result;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Atomically write `data` to `path` using a tempfile in the same directory.
/// A crash mid-write leaves the previous file intact.
pub fn atomic_write(path: &Path, data: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(data)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// Move an unreadable file to `<name>.corrupt`, or `<name>.corrupt.N` when
/// earlier copies exist. Earlier copies are never replaced. Returns the new
/// location.
pub fn quarantine(path: &Path) -> Result<PathBuf> {
    let base = path.file_name().unwrap_or_default();
    let target = (0u32..1000)
        .map(|n| {
            let mut name = base.to_os_string();
            name.push(".corrupt");
            if n > 0 {
                name.push(format!(".{n}"));
            }
            path.with_file_name(name)
        })
        .find(|candidate| std::fs::symlink_metadata(candidate).is_err())
        .ok_or_else(|| {
            std::io::Error::new(
                std::io::ErrorKind::AlreadyExists,
                "too many quarantined copies",
            )
        })?;
    std::fs::rename(path, &target)?;
    Ok(target)
}
