//! Plain-text rendering of a snapshot.

use crate::graph::GraphSnapshot;
use std::fmt::Write;

/// Renders a snapshot as a one-line diagram.
///
/// Stages print as `[glyph label]`; active transitions as `==label==>` and
/// inactive ones as `--label-->`.
#[must_use]
pub fn render_diagram(snapshot: &GraphSnapshot) -> String {
    let mut out = String::new();
    for (i, stage) in snapshot.stages.iter().enumerate() {
        let _ = write!(out, "[{} {}]", stage.status().glyph(), stage.label());
        if let Some(transition) = snapshot.transitions.get(i) {
            let (line, head) = if transition.is_active() {
                ("==", "==>")
            } else {
                ("--", "-->")
            };
            let _ = write!(out, " {line}{}{head} ", transition.label());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::StageStatus;
    use crate::graph::reference_pipeline;

    #[test]
    fn test_render_idle_reference() {
        let text = render_diagram(&reference_pipeline().snapshot());
        assert!(text.starts_with("[  Upload Document] --Document--> [  OCR Processing]"));
        assert!(text.ends_with("[  Structured Data]"));
    }

    #[test]
    fn test_render_active_edge_and_stage() {
        let mut graph = reference_pipeline();
        graph.set_transition_active("e1-2", true).unwrap();
        graph
            .set_stage_status("2", StageStatus::Active, "Processing OCR...")
            .unwrap();

        let text = render_diagram(&graph.snapshot());
        assert!(text.contains("==Document==> [▶ Processing OCR...]"));
        assert!(text.contains("--Text-->"));
    }
}
