//! Atomic artifact writes.
//!
//! Bytes go to a uniquely named temp file in the destination directory and
//! are then renamed over the final name. A crash or a failed write never
//! leaves a truncated `{page}.{ext}` behind, and two tasks targeting the same
//! name (a page listed twice) cannot interleave their bytes.

use std::io::{self, Write};
use std::path::Path;
use tempfile::Builder;

/// Write `bytes` to `path`, replacing any existing file atomically.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    let mut tmp = Builder::new()
        .prefix(".imagify-")
        .suffix(".part")
        .tempfile_in(dir)?;
    tmp.write_all(bytes)?;
    // Temp files are created 0600; artifacts get ordinary file permissions.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        tmp.as_file()
            .set_permissions(std::fs::Permissions::from_mode(0o644))?;
    }
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
