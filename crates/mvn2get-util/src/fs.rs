use std::path::{Path, PathBuf};
use std::process;

/// Ensure a directory exists, creating it and any parents if needed.
pub fn ensure_dir(path: &Path) -> std::io::Result<()> {
    if !path.exists() {
        std::fs::create_dir_all(path)?;
    }
    Ok(())
}

/// Write `bytes` to `dir/filename` atomically.
///
/// The data is first written to a temporary name inside the same directory
/// and then renamed over the target, so a crash mid-write never leaves a
/// partial file at the final name.
pub fn write_atomic(dir: &Path, filename: &str, bytes: &[u8]) -> std::io::Result<PathBuf> {
    ensure_dir(dir)?;
    let target = dir.join(filename);
    let tmp = dir.join(format!(".{}.{}.part", filename, process::id()));
    std::fs::write(&tmp, bytes)?;
    match std::fs::rename(&tmp, &target) {
        Ok(()) => Ok(target),
        Err(e) => {
            let _ = std::fs::remove_file(&tmp);
            Err(e)
        }
    }
}
