//! Document submission to the extraction service.
//!
//! This module provides:
//! - The [`UploadCollaborator`] seam and its reqwest implementation
//! - Preflight checks mirroring the service's own limits
//! - [`UploadSession`], which fires the driver's trigger on success

mod client;
mod error;
mod preflight;
mod session;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub use client::HttpUploadCollaborator;
pub use error::{UploadError, FALLBACK_MESSAGE, NO_FILE_MESSAGE};
pub use preflight::{read_for_upload, PreparedUpload};
pub use session::{UploadSession, UPLOAD_TRIGGER_SOURCE};

/// What the extraction service returned for one document.
///
/// The payload is opaque to the tracker; it is handed back to the caller
/// untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResult {
    /// Name the service reported for the file.
    pub filename: String,
    /// The full response body.
    pub payload: serde_json::Value,
}

/// Submits a document for extraction.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UploadCollaborator: Send + Sync {
    /// Uploads the file at `path` and returns the service's result.
    async fn submit(&self, path: &Path) -> Result<ExtractionResult, UploadError>;
}
