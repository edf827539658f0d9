//! Span attributes for runs.

use crate::simulation::{RunId, TriggerEvent};
use serde::{Deserialize, Serialize};
use tracing::Span;

/// Attributes attached to the span wrapping one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSpanAttributes {
    /// Run id.
    pub run_id: Option<String>,
    /// Graph name.
    pub graph: Option<String>,
    /// Where the trigger came from.
    pub trigger_source: Option<String>,
    /// What the trigger referred to, such as an uploaded file name.
    pub reference: Option<String>,
}

impl RunSpanAttributes {
    /// Collects the attributes of a run started by `event`.
    #[must_use]
    pub fn for_run(run_id: RunId, graph: &str, event: &TriggerEvent) -> Self {
        Self {
            run_id: Some(run_id.to_string()),
            graph: Some(graph.to_string()),
            trigger_source: Some(event.source.clone()),
            reference: event.reference.clone(),
        }
    }

    /// Opens an info-level span carrying these attributes.
    #[must_use]
    pub fn span(&self) -> Span {
        tracing::info_span!(
            "stagetrack.run",
            run_id = self.run_id.as_deref().unwrap_or_default(),
            graph = self.graph.as_deref().unwrap_or_default(),
            trigger_source = self.trigger_source.as_deref().unwrap_or_default(),
            reference = self.reference.as_deref(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_for_run_collects_trigger() {
        let run_id = RunId::new();
        let event = TriggerEvent::new("upload").with_reference("scan.png");
        let attrs = RunSpanAttributes::for_run(run_id, "document-processing", &event);

        assert_eq!(attrs.run_id, Some(run_id.to_string()));
        assert_eq!(attrs.graph.as_deref(), Some("document-processing"));
        assert_eq!(attrs.trigger_source.as_deref(), Some("upload"));
        assert_eq!(attrs.reference.as_deref(), Some("scan.png"));
    }

    #[test]
    fn test_manual_trigger_has_no_reference() {
        let attrs = RunSpanAttributes::for_run(RunId::new(), "g", &TriggerEvent::new("manual"));
        assert_eq!(attrs.reference, None);
    }
}
