//! Upload error types.

use thiserror::Error;

/// Shown when an upload is attempted with nothing selected.
pub const NO_FILE_MESSAGE: &str = "Please select a file.";
/// Shown when the service gives no usable reason.
pub const FALLBACK_MESSAGE: &str = "Upload failed.";

const MIB: u64 = 1024 * 1024;

/// Why an upload did not produce a result.
///
/// The `Display` text of each variant is the message meant for the user.
#[derive(Debug, Error)]
pub enum UploadError {
    /// No file was selected.
    #[error("Please select a file.")]
    NoFile,

    /// The file's extension is not accepted.
    #[error("Unsupported file type. Please upload PDF or image.")]
    UnsupportedType {
        /// The rejected extension, lowercase with leading dot; empty if none.
        extension: String,
    },

    /// The file exceeds the size limit.
    #[error("File too large. Max size is {}MB.", .max / MIB)]
    TooLarge {
        /// Actual size in bytes.
        size: u64,
        /// Limit in bytes.
        max: u64,
    },

    /// The file could not be read.
    #[error("Failed to read '{path}': {source}")]
    Io {
        /// The file.
        path: String,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The service answered with an error status.
    #[error("{}", .detail.as_deref().unwrap_or(FALLBACK_MESSAGE))]
    Server {
        /// HTTP status code.
        status: u16,
        /// The service's `detail` field, if it sent one.
        detail: Option<String>,
    },

    /// The request never completed.
    #[error("Upload failed.")]
    Transport(#[source] reqwest::Error),
}

impl UploadError {
    /// Returns true if the file was rejected before anything was sent.
    #[must_use]
    pub fn is_preflight(&self) -> bool {
        matches!(
            self,
            Self::NoFile | Self::UnsupportedType { .. } | Self::TooLarge { .. } | Self::Io { .. }
        )
    }

    /// Returns the HTTP status, for errors the service reported.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Server { status, .. } => Some(*status),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        assert_eq!(UploadError::NoFile.to_string(), NO_FILE_MESSAGE);
        assert_eq!(
            UploadError::TooLarge {
                size: 11 * MIB,
                max: 10 * MIB
            }
            .to_string(),
            "File too large. Max size is 10MB."
        );
    }

    #[test]
    fn test_server_detail_or_fallback() {
        let with_detail = UploadError::Server {
            status: 400,
            detail: Some("Unsupported file type. Please upload PDF or image.".to_string()),
        };
        assert_eq!(
            with_detail.to_string(),
            "Unsupported file type. Please upload PDF or image."
        );
        assert_eq!(with_detail.status(), Some(400));

        let bare = UploadError::Server {
            status: 502,
            detail: None,
        };
        assert_eq!(bare.to_string(), FALLBACK_MESSAGE);
        assert!(!bare.is_preflight());
    }
}
