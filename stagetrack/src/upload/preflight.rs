//! Checks applied before a file is sent.

use super::UploadError;
use crate::config::UploadConfig;
use std::path::Path;

/// A file that passed preflight and is ready to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedUpload {
    /// Base name sent as the multipart file name.
    pub filename: String,
    /// File contents.
    pub bytes: Vec<u8>,
}

/// Returns the lowercase extension of `path` with a leading dot, or an empty
/// string if it has none.
fn extension_of(path: &Path) -> String {
    path.extension()
        .map(|e| format!(".{}", e.to_string_lossy().to_ascii_lowercase()))
        .unwrap_or_default()
}

/// Reads `path` and checks it against the configured type and size limits.
///
/// # Errors
///
/// Returns [`UploadError::UnsupportedType`], [`UploadError::Io`] or
/// [`UploadError::TooLarge`].
pub async fn read_for_upload(
    path: &Path,
    config: &UploadConfig,
) -> Result<PreparedUpload, UploadError> {
    let extension = extension_of(path);
    if !config.allows_extension(&extension) {
        return Err(UploadError::UnsupportedType { extension });
    }

    let io_error = |source| UploadError::Io {
        path: path.display().to_string(),
        source,
    };

    let size = tokio::fs::metadata(path).await.map_err(io_error)?.len();
    if size > config.max_file_size_bytes {
        return Err(UploadError::TooLarge {
            size,
            max: config.max_file_size_bytes,
        });
    }

    let bytes = tokio::fs::read(path).await.map_err(io_error)?;
    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    Ok(PreparedUpload { filename, bytes })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn write(dir: &tempfile::TempDir, name: &str, bytes: &[u8]) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, bytes).unwrap();
        path
    }

    #[test]
    fn test_extension_of() {
        assert_eq!(extension_of(Path::new("scan.PNG")), ".png");
        assert_eq!(extension_of(Path::new("a/b/report.tiff")), ".tiff");
        assert_eq!(extension_of(Path::new("README")), "");
    }

    #[tokio::test]
    async fn test_accepts_pdf() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "invoice.pdf", b"%PDF-1.4");

        let prepared = read_for_upload(&path, &UploadConfig::default()).await.unwrap();
        assert_eq!(prepared.filename, "invoice.pdf");
        assert_eq!(prepared.bytes, b"%PDF-1.4");
    }

    #[tokio::test]
    async fn test_rejects_unsupported_type() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "notes.docx", b"hello");

        let err = read_for_upload(&path, &UploadConfig::default())
            .await
            .unwrap_err();
        assert!(matches!(err, UploadError::UnsupportedType { ref extension } if extension == ".docx"));
        assert!(err.is_preflight());
    }

    #[tokio::test]
    async fn test_rejects_oversized_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "scan.jpg", &[0u8; 64]);
        let config = UploadConfig::default().with_max_file_size(32);

        let err = read_for_upload(&path, &config).await.unwrap_err();
        assert!(matches!(err, UploadError::TooLarge { size: 64, max: 32 }));
    }

    #[tokio::test]
    async fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gone.png");

        let err = read_for_upload(&path, &UploadConfig::default())
            .await
            .unwrap_err();
        assert!(matches!(err, UploadError::Io { .. }));
    }
}
