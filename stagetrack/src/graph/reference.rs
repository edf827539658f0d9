//! The five-stage document-processing pipeline.

use super::builder::{assemble, StageDefinition};
use super::StageGraph;

/// Name of the reference graph.
pub const REFERENCE_PIPELINE_NAME: &str = "document-processing";

/// Stage definitions of the reference pipeline:
/// Upload → OCR → Entity Extraction → Table Detection → Structured Data.
#[must_use]
pub fn reference_definitions() -> Vec<StageDefinition> {
    vec![
        StageDefinition::new("1", "Upload Document")
            .in_progress("Uploading Document...")
            .complete("Document Uploaded")
            .outgoing("Document"),
        StageDefinition::new("2", "OCR Processing")
            .in_progress("Processing OCR...")
            .complete("OCR Complete")
            .outgoing("Text"),
        StageDefinition::new("3", "Entity Extraction")
            .in_progress("Extracting Entities...")
            .complete("Entities Extracted")
            .outgoing("Entities"),
        StageDefinition::new("4", "Table Detection")
            .in_progress("Detecting Table...")
            .complete("Table Detected")
            .outgoing("Structured"),
        StageDefinition::new("5", "Structured Data")
            .in_progress("Structured Output")
            .complete("Structured Output"),
    ]
}

/// Builds a fresh instance of the reference pipeline.
#[must_use]
pub fn reference_pipeline() -> StageGraph {
    assemble(REFERENCE_PIPELINE_NAME.to_string(), reference_definitions())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::StageRole;
    use crate::graph::StageGraphBuilder;

    #[test]
    fn test_reference_definitions_validate() {
        let graph = StageGraphBuilder::new(REFERENCE_PIPELINE_NAME)
            .stages(reference_definitions())
            .unwrap()
            .build()
            .unwrap();
        assert_eq!(graph.stage_count(), 5);
    }

    #[test]
    fn test_reference_shape() {
        let graph = reference_pipeline();
        assert_eq!(graph.stage_count(), 5);
        assert_eq!(graph.transition_count(), 4);
        assert_eq!(graph.entry().label(), "Upload Document");
        assert_eq!(graph.exit().role(), StageRole::Exit);

        let edges: Vec<(&str, &str)> = graph
            .transitions()
            .iter()
            .map(|t| (t.id().as_str(), t.label()))
            .collect();
        assert_eq!(
            edges,
            vec![
                ("e1-2", "Document"),
                ("e2-3", "Text"),
                ("e3-4", "Entities"),
                ("e4-5", "Structured"),
            ]
        );
    }

    #[test]
    fn test_exactly_one_entry_and_exit() {
        let graph = reference_pipeline();
        let entries = graph
            .stages()
            .iter()
            .filter(|s| s.role() == StageRole::Entry)
            .count();
        let exits = graph
            .stages()
            .iter()
            .filter(|s| s.role() == StageRole::Exit)
            .count();
        assert_eq!((entries, exits), (1, 1));
    }
}
