//! Input validation and output-directory resolution.
//!
//! The source file is checked before anything else happens so that a bad
//! `pdf_path` never leaves an empty output directory behind. The PDF magic
//! bytes (`%PDF`) are verified up front so callers get a meaningful error
//! rather than an opaque engine failure.
//!
//! The output directory naming rule is part of the artifact contract: without
//! an explicit path, `some/dir/report.pdf` converts into `./report/`.

use crate::error::ImagifyError;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const FALLBACK_OUTPUT_DIR: &str = "output";

/// Validate that `path` names a readable PDF file.
pub fn validate_source(path: &Path) -> Result<(), ImagifyError> {
    let meta = match std::fs::metadata(path) {
        Ok(meta) => meta,
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(ImagifyError::PermissionDenied {
                path: path.to_path_buf(),
            });
        }
        Err(_) => {
            return Err(ImagifyError::InputNotFound {
                path: path.to_path_buf(),
            });
        }
    };

    if !meta.is_file() {
        return Err(ImagifyError::InvalidInput {
            path: path.to_path_buf(),
        });
    }

    match std::fs::File::open(path) {
        Ok(f) => {
            let mut head = Vec::with_capacity(4);
            f.take(4)
                .read_to_end(&mut head)
                .map_err(|_| ImagifyError::InvalidInput {
                    path: path.to_path_buf(),
                })?;
            if head != b"%PDF" {
                // Files shorter than the magic are zero-padded.
                let mut magic = [0u8; 4];
                magic[..head.len()].copy_from_slice(&head);
                return Err(ImagifyError::NotAPdf {
                    path: path.to_path_buf(),
                    magic,
                });
            }
        }
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(ImagifyError::PermissionDenied {
                path: path.to_path_buf(),
            });
        }
        Err(_) => {
            return Err(ImagifyError::InputNotFound {
                path: path.to_path_buf(),
            });
        }
    }

    debug!("Resolved local PDF: {}", path.display());
    Ok(())
}

/// Default output directory for `source`, relative to `cwd`.
///
/// Backslashes are normalised to `/` before the base name is taken, so a
/// Windows-style `C:\docs\report.pdf` also yields `report`. A stem that
/// would name `cwd` itself or its parent (`..`, `/`) falls back to the full
/// base name, or to `output` when that is unusable too.
pub fn default_output_dir(source: &Path, cwd: &Path) -> PathBuf {
    let normalised = source.to_string_lossy().replace('\\', "/");
    let file_name = normalised
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or_default();

    let stem = match file_name.rfind('.') {
        Some(idx) if idx > 0 => &file_name[..idx],
        _ => file_name,
    };

    let usable = |name: &str| !name.trim_matches('.').is_empty();
    if usable(stem) {
        cwd.join(stem)
    } else if usable(file_name) {
        cwd.join(file_name)
    } else {
        cwd.join(FALLBACK_OUTPUT_DIR)
    }
}

/// Pick the output directory: the explicit path verbatim, otherwise the
/// source's base name (extension removed) under the current directory.
pub fn resolve_output_dir(
    explicit: Option<&Path>,
    source: &Path,
) -> Result<PathBuf, ImagifyError> {
    if let Some(dir) = explicit {
        return Ok(dir.to_path_buf());
    }

    let cwd = std::env::current_dir().map_err(|e| {
        ImagifyError::Internal(format!(
            "Unable to retrieve the current working directory: {e}"
        ))
    })?;
    let dir = default_output_dir(source, &cwd);
    warn!(
        "No output path specified. Defaulting to ({}).",
        dir.display()
    );
    Ok(dir)
}

/// Create `dir` and any missing parents.
///
/// Fails with [`ImagifyError::DirectoryError`] if creation fails or the path
/// is occupied by something that is not a directory.
pub async fn ensure_output_dir(dir: &Path) -> Result<(), ImagifyError> {
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|source| ImagifyError::DirectoryError {
            path: dir.to_path_buf(),
            source,
        })?;

    let meta = tokio::fs::metadata(dir)
        .await
        .map_err(|source| ImagifyError::DirectoryError {
            path: dir.to_path_buf(),
            source,
        })?;
    if !meta.is_dir() {
        return Err(ImagifyError::DirectoryError {
            path: dir.to_path_buf(),
            source: std::io::Error::new(
                std::io::ErrorKind::AlreadyExists,
                "path exists and is not a directory",
            ),
        });
    }

    debug!("Output directory ready: {}", dir.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_dir_strips_extension() {
        let cwd = Path::new("/work");
        assert_eq!(
            default_output_dir(Path::new("docs/report.pdf"), cwd),
            PathBuf::from("/work/report")
        );
        assert_eq!(
            default_output_dir(Path::new("report"), cwd),
            PathBuf::from("/work/report")
        );
        assert_eq!(
            default_output_dir(Path::new("archive.v2.pdf"), cwd),
            PathBuf::from("/work/archive.v2")
        );
    }

    #[test]
    fn default_dir_normalises_backslashes() {
        let cwd = Path::new("/work");
        assert_eq!(
            default_output_dir(Path::new(r"C:\docs\report.pdf"), cwd),
            PathBuf::from("/work/report")
        );
    }

    #[test]
    fn default_dir_keeps_dotfile_names() {
        let cwd = Path::new("/work");
        assert_eq!(
            default_output_dir(Path::new(".hidden"), cwd),
            PathBuf::from("/work/.hidden")
        );
    }

    #[test]
    fn default_dir_never_resolves_to_cwd_or_parent() {
        let cwd = Path::new("/work");
        assert_eq!(
            default_output_dir(Path::new(".."), cwd),
            PathBuf::from("/work/output")
        );
        assert_eq!(
            default_output_dir(Path::new("docs/.."), cwd),
            PathBuf::from("/work/output")
        );
        assert_eq!(default_output_dir(Path::new("/"), cwd), PathBuf::from("/work/output"));
        assert_eq!(
            default_output_dir(Path::new("..pdf"), cwd),
            PathBuf::from("/work/..pdf")
        );
    }

    #[test]
    fn explicit_dir_is_used_verbatim() {
        let dir = resolve_output_dir(Some(Path::new("out/pages")), Path::new("a.pdf")).unwrap();
        assert_eq!(dir, PathBuf::from("out/pages"));
    }

    #[test]
    fn validate_missing_file() {
        let err = validate_source(Path::new("/definitely/not/here.pdf")).unwrap_err();
        assert!(matches!(err, ImagifyError::InputNotFound { .. }));
    }

    #[test]
    fn validate_directory_is_rejected() {
        let tmp = TempDir::new().unwrap();
        let err = validate_source(tmp.path()).unwrap_err();
        assert!(matches!(err, ImagifyError::InvalidInput { .. }));
    }

    #[test]
    fn validate_rejects_non_pdf() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("fake.pdf");
        std::fs::write(&path, b"GIF89a").unwrap();
        let err = validate_source(&path).unwrap_err();
        assert!(matches!(err, ImagifyError::NotAPdf { magic, .. } if &magic == b"GIF8"));
    }

    #[test]
    fn validate_rejects_short_files() {
        let tmp = TempDir::new().unwrap();
        let empty = tmp.path().join("empty.pdf");
        std::fs::write(&empty, b"").unwrap();
        let err = validate_source(&empty).unwrap_err();
        assert!(matches!(err, ImagifyError::NotAPdf { magic, .. } if magic == [0; 4]));

        let short = tmp.path().join("short.pdf");
        std::fs::write(&short, b"%PD").unwrap();
        let err = validate_source(&short).unwrap_err();
        assert!(matches!(err, ImagifyError::NotAPdf { magic, .. } if &magic == b"%PD\0"));
    }

    #[test]
    fn validate_accepts_pdf_magic() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("ok.pdf");
        std::fs::write(&path, b"%PDF-1.7\n").unwrap();
        validate_source(&path).unwrap();
    }

    #[tokio::test]
    async fn ensure_creates_nested_dirs() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("a/b/c");
        ensure_output_dir(&dir).await.unwrap();
        assert!(dir.is_dir());
        // Idempotent.
        ensure_output_dir(&dir).await.unwrap();
    }

    #[tokio::test]
    async fn ensure_fails_on_file_collision() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("taken");
        std::fs::write(&file, b"x").unwrap();
        let err = ensure_output_dir(&file).await.unwrap_err();
        assert!(matches!(err, ImagifyError::DirectoryError { .. }));
    }
}
