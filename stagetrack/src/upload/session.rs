//! Binds an upload collaborator to a simulation driver.

use super::{ExtractionResult, UploadCollaborator, UploadError};
use crate::simulation::{SimulationDriver, TriggerEvent, TriggerOutcome};
use parking_lot::Mutex;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

/// Trigger source recorded for runs started by a successful upload.
pub const UPLOAD_TRIGGER_SOURCE: &str = "upload";

/// One user's upload flow: pick a file, submit it, watch the pipeline.
///
/// Picking a new file resets the driver so the next successful upload starts
/// a fresh run. A failed upload leaves the driver untouched.
pub struct UploadSession {
    collaborator: Arc<dyn UploadCollaborator>,
    driver: Arc<SimulationDriver>,
    selected: Mutex<Option<PathBuf>>,
}

impl UploadSession {
    /// Creates a session.
    #[must_use]
    pub fn new(collaborator: Arc<dyn UploadCollaborator>, driver: Arc<SimulationDriver>) -> Self {
        Self {
            collaborator,
            driver,
            selected: Mutex::new(None),
        }
    }

    /// Returns the driver.
    #[must_use]
    pub fn driver(&self) -> &Arc<SimulationDriver> {
        &self.driver
    }

    /// Selects the file to upload next and resets the pipeline.
    pub fn select(&self, path: impl Into<PathBuf>) {
        *self.selected.lock() = Some(path.into());
        self.driver.reset();
    }

    /// Returns the selected file.
    #[must_use]
    pub fn selected(&self) -> Option<PathBuf> {
        self.selected.lock().clone()
    }

    /// Uploads the selected file and, on success, starts the pipeline run.
    ///
    /// # Errors
    ///
    /// Returns [`UploadError::NoFile`] if nothing is selected, or whatever
    /// the collaborator reported. The driver is not triggered in either case.
    pub async fn upload(&self) -> Result<ExtractionResult, UploadError> {
        let Some(path) = self.selected() else {
            warn!("Upload attempted without a selected file");
            return Err(UploadError::NoFile);
        };

        let result = match self.collaborator.submit(&path).await {
            Ok(result) => result,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Upload failed");
                return Err(e);
            }
        };

        let event = TriggerEvent::new(UPLOAD_TRIGGER_SOURCE).with_reference(result.filename.clone());
        match self.driver.trigger(event) {
            TriggerOutcome::Started(run_id) => {
                info!(run_id = %run_id, filename = %result.filename, "Upload accepted; pipeline started");
            }
            TriggerOutcome::Ignored(state) => {
                info!(state = %state, filename = %result.filename, "Upload accepted; pipeline already {}", state.name());
            }
        }
        Ok(result)
    }
}

impl std::fmt::Debug for UploadSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadSession")
            .field("driver", &self.driver)
            .field("selected", &self.selected())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::RunState;
    use crate::upload::MockUploadCollaborator;
    use std::time::Duration;

    fn accepted(filename: &str) -> ExtractionResult {
        ExtractionResult {
            filename: filename.to_string(),
            payload: serde_json::json!({ "filename": filename, "olmocr_output": {} }),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_triggers_run() {
        let mut mock = MockUploadCollaborator::new();
        mock.expect_submit()
            .withf(|path| path.ends_with("invoice.pdf"))
            .times(1)
            .returning(|_| Ok(accepted("invoice.pdf")));

        let driver = Arc::new(SimulationDriver::reference());
        let session = UploadSession::new(Arc::new(mock), driver.clone());
        session.select("/tmp/invoice.pdf");

        let result = session.upload().await.unwrap();
        assert_eq!(result.filename, "invoice.pdf");
        assert!(driver.state().is_running());

        assert!(matches!(driver.wait().await, RunState::Done { .. }));
        assert!(driver.snapshot().is_complete());
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_leaves_driver_idle() {
        let mut mock = MockUploadCollaborator::new();
        mock.expect_submit().returning(|_| {
            Err(UploadError::Server {
                status: 400,
                detail: Some("Unsupported file type. Please upload PDF or image.".to_string()),
            })
        });

        let driver = Arc::new(SimulationDriver::reference());
        let session = UploadSession::new(Arc::new(mock), driver.clone());
        session.select("/tmp/notes.docx");

        let err = session.upload().await.unwrap_err();
        assert_eq!(err.to_string(), "Unsupported file type. Please upload PDF or image.");

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(driver.state(), RunState::Idle);
        assert!(driver.snapshot().is_pristine());
    }

    #[tokio::test]
    async fn test_no_selection() {
        let mut mock = MockUploadCollaborator::new();
        mock.expect_submit().never();

        let driver = Arc::new(SimulationDriver::reference());
        let session = UploadSession::new(Arc::new(mock), driver.clone());

        let err = session.upload().await.unwrap_err();
        assert_eq!(err.to_string(), "Please select a file.");
        assert_eq!(driver.state(), RunState::Idle);

        let err = crate::errors::TrackerError::from(err);
        assert!(matches!(err, crate::errors::TrackerError::Upload(UploadError::NoFile)));
        assert_eq!(err.to_string(), "Please select a file.");
    }

    #[tokio::test(start_paused = true)]
    async fn test_new_selection_resets_pipeline() {
        let mut mock = MockUploadCollaborator::new();
        mock.expect_submit()
            .times(2)
            .returning(|path| Ok(accepted(&path.file_name().unwrap().to_string_lossy())));

        let driver = Arc::new(SimulationDriver::reference());
        let session = UploadSession::new(Arc::new(mock), driver.clone());

        session.select("/tmp/first.png");
        session.upload().await.unwrap();
        tokio::time::sleep(Duration::from_millis(1500)).await;
        let first_graph = driver.graph();

        session.select("/tmp/second.png");
        assert_eq!(driver.state(), RunState::Idle);
        assert!(!driver.graph().same_instance(&first_graph));

        session.upload().await.unwrap();
        assert!(driver.state().is_running());
        assert_eq!(session.selected(), Some(PathBuf::from("/tmp/second.png")));
    }

    #[tokio::test(start_paused = true)]
    async fn test_repeat_upload_does_not_restart_run() {
        let mut mock = MockUploadCollaborator::new();
        mock.expect_submit().returning(|_| Ok(accepted("scan.jpg")));

        let driver = Arc::new(SimulationDriver::reference());
        let session = UploadSession::new(Arc::new(mock), driver.clone());
        session.select("/tmp/scan.jpg");

        session.upload().await.unwrap();
        let run_id = driver.state().run_id();
        tokio::time::sleep(Duration::from_millis(500)).await;

        // Same file again without reselecting: the result comes back but the
        // run in flight keeps its schedule.
        session.upload().await.unwrap();
        assert_eq!(driver.state().run_id(), run_id);
        assert_eq!(driver.pending_steps().len(), 3);
    }
}
