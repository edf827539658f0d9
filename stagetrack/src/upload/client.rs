//! reqwest-backed upload collaborator.

use super::{read_for_upload, ExtractionResult, UploadCollaborator, UploadError};
use crate::config::UploadConfig;
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use std::path::Path;
use tracing::{debug, warn};

/// Multipart field the service reads the document from.
const FILE_FIELD: &str = "file";

/// Posts documents to the extraction endpoint as multipart form data.
#[derive(Debug, Clone)]
pub struct HttpUploadCollaborator {
    client: reqwest::Client,
    config: UploadConfig,
}

/// Error body returned by the service.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    detail: Option<serde_json::Value>,
}

impl ErrorBody {
    fn into_message(self) -> Option<String> {
        match self.detail? {
            serde_json::Value::String(s) => Some(s),
            serde_json::Value::Null => None,
            other => Some(other.to_string()),
        }
    }
}

impl HttpUploadCollaborator {
    /// Creates a collaborator for the configured endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: UploadConfig) -> Result<Self, UploadError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .user_agent(concat!("stagetrack/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(UploadError::Transport)?;
        Ok(Self { client, config })
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &UploadConfig {
        &self.config
    }
}

#[async_trait]
impl UploadCollaborator for HttpUploadCollaborator {
    async fn submit(&self, path: &Path) -> Result<ExtractionResult, UploadError> {
        let prepared = read_for_upload(path, &self.config).await?;
        let size = prepared.bytes.len();
        debug!(
            endpoint = %self.config.endpoint,
            filename = %prepared.filename,
            size,
            "Submitting document"
        );

        let part = Part::bytes(prepared.bytes).file_name(prepared.filename.clone());
        let form = Form::new().part(FILE_FIELD, part);

        let response = self
            .client
            .post(&self.config.endpoint)
            .multipart(form)
            .send()
            .await
            .map_err(UploadError::Transport)?;

        let status = response.status();
        if !status.is_success() {
            let detail = response
                .json::<ErrorBody>()
                .await
                .ok()
                .and_then(ErrorBody::into_message);
            warn!(status = status.as_u16(), detail = ?detail, "Extraction service rejected upload");
            return Err(UploadError::Server {
                status: status.as_u16(),
                detail,
            });
        }

        let payload: serde_json::Value = response.json().await.map_err(UploadError::Transport)?;
        let filename = payload
            .get("filename")
            .and_then(serde_json::Value::as_str)
            .map_or(prepared.filename, str::to_string);

        Ok(ExtractionResult { filename, payload })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serves one canned response and returns the raw request it received.
    async fn serve_once(status: &'static str, body: &'static str) -> (String, tokio::task::JoinHandle<Vec<u8>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let endpoint = format!("http://{}/extract", listener.local_addr().unwrap());

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 4096];
            loop {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
                if request_complete(&request) {
                    break;
                }
            }
            let response = format!(
                "HTTP/1.1 {status}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();
            request
        });

        (endpoint, handle)
    }

    fn request_complete(request: &[u8]) -> bool {
        let text = String::from_utf8_lossy(request);
        let Some(header_end) = text.find("\r\n\r\n") else {
            return false;
        };
        let headers = text[..header_end].to_ascii_lowercase();
        let body_len = request.len() - (header_end + 4);
        match headers
            .lines()
            .find_map(|l| l.strip_prefix("content-length:"))
            .and_then(|v| v.trim().parse::<usize>().ok())
        {
            Some(expected) => body_len >= expected,
            None => text.ends_with("0\r\n\r\n"),
        }
    }

    fn document(dir: &tempfile::TempDir, name: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, b"%PDF-1.4 test").unwrap();
        path
    }

    #[tokio::test]
    async fn test_submit_success() {
        let (endpoint, server) = serve_once(
            "200 OK",
            r#"{"filename":"invoice.pdf","extracted_text":"Total: 42","olmocr_output":{"total":42}}"#,
        )
        .await;
        let dir = tempfile::tempdir().unwrap();
        let path = document(&dir, "invoice.pdf");

        let collaborator =
            HttpUploadCollaborator::new(UploadConfig::default().with_endpoint(endpoint)).unwrap();
        let result = collaborator.submit(&path).await.unwrap();

        assert_eq!(result.filename, "invoice.pdf");
        assert_eq!(result.payload["olmocr_output"]["total"], serde_json::json!(42));

        let request = String::from_utf8_lossy(&server.await.unwrap()).into_owned();
        assert!(request.starts_with("POST /extract"));
        assert!(request.contains("name=\"file\""));
        assert!(request.contains("filename=\"invoice.pdf\""));
    }

    #[tokio::test]
    async fn test_submit_surfaces_detail() {
        let (endpoint, _server) = serve_once(
            "400 Bad Request",
            r#"{"detail":"File too large. Max size is 10MB."}"#,
        )
        .await;
        let dir = tempfile::tempdir().unwrap();
        let path = document(&dir, "big.pdf");

        let collaborator =
            HttpUploadCollaborator::new(UploadConfig::default().with_endpoint(endpoint)).unwrap();
        let err = collaborator.submit(&path).await.unwrap_err();

        assert_eq!(err.status(), Some(400));
        assert_eq!(err.to_string(), "File too large. Max size is 10MB.");
    }

    #[tokio::test]
    async fn test_submit_without_detail_falls_back() {
        let (endpoint, _server) = serve_once("500 Internal Server Error", "{}").await;
        let dir = tempfile::tempdir().unwrap();
        let path = document(&dir, "scan.pdf");

        let collaborator =
            HttpUploadCollaborator::new(UploadConfig::default().with_endpoint(endpoint)).unwrap();
        let err = collaborator.submit(&path).await.unwrap_err();

        assert_eq!(err.to_string(), "Upload failed.");
    }

    #[tokio::test]
    async fn test_submit_rejects_before_sending() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, b"plain").unwrap();

        // Nothing listens here; preflight must fail first.
        let collaborator = HttpUploadCollaborator::new(
            UploadConfig::default().with_endpoint("http://127.0.0.1:9/extract"),
        )
        .unwrap();
        let err = collaborator.submit(&path).await.unwrap_err();
        assert!(matches!(err, UploadError::UnsupportedType { .. }));
    }

    #[test]
    fn test_error_body_detail_shapes() {
        let text: ErrorBody = serde_json::from_str(r#"{"detail":"bad"}"#).unwrap();
        assert_eq!(text.into_message().as_deref(), Some("bad"));

        let list: ErrorBody = serde_json::from_str(r#"{"detail":[{"msg":"field required"}]}"#).unwrap();
        assert_eq!(list.into_message().as_deref(), Some(r#"[{"msg":"field required"}]"#));

        let none: ErrorBody = serde_json::from_str("{}").unwrap();
        assert_eq!(none.into_message(), None);
    }
}
