//! Graph builder with validation.

use super::{StageGraph, StageId, StageLabels, TransitionId};
use crate::errors::{ErrorInfo, GraphValidationError};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Declarative description of one stage, as supplied to the builder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageDefinition {
    /// The stage id.
    pub id: String,
    /// Labels for each phase.
    pub labels: StageLabels,
    /// Label of the transition leaving this stage. Ignored for the exit stage.
    #[serde(default)]
    pub outgoing_label: String,
}

impl StageDefinition {
    /// Creates a definition whose labels all read `label`.
    #[must_use]
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            labels: StageLabels::uniform(label),
            outgoing_label: String::new(),
        }
    }

    /// Sets the in-progress label.
    #[must_use]
    pub fn in_progress(mut self, label: impl Into<String>) -> Self {
        self.labels.in_progress = label.into();
        self
    }

    /// Sets the completion label.
    #[must_use]
    pub fn complete(mut self, label: impl Into<String>) -> Self {
        self.labels.complete = label.into();
        self
    }

    /// Sets the label of the outgoing transition.
    #[must_use]
    pub fn outgoing(mut self, label: impl Into<String>) -> Self {
        self.outgoing_label = label.into();
        self
    }
}

/// Builder for validated stage graphs.
///
/// Stages are chained in insertion order: the first one added becomes the
/// entry stage and the last one the exit stage.
#[derive(Debug, Clone)]
pub struct StageGraphBuilder {
    name: String,
    stages: Vec<StageDefinition>,
    seen: HashSet<String>,
}

impl StageGraphBuilder {
    /// Creates a new builder.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            stages: Vec::new(),
            seen: HashSet::new(),
        }
    }

    /// Appends a stage to the chain.
    ///
    /// # Errors
    ///
    /// Returns an error if the id is empty or already used.
    pub fn stage(mut self, definition: StageDefinition) -> Result<Self, GraphValidationError> {
        self.add_stage(definition)?;
        Ok(self)
    }

    /// Appends a stage to the chain in place.
    ///
    /// # Errors
    ///
    /// Returns an error if the id is empty or already used.
    pub fn add_stage(&mut self, definition: StageDefinition) -> Result<(), GraphValidationError> {
        if definition.id.trim().is_empty() {
            return Err(GraphValidationError::new("Stage id cannot be empty")
                .with_error_info(
                    ErrorInfo::new("GRAPH-EMPTY-ID", "A stage was declared without an id")
                        .with_context_entry("position", self.stages.len().to_string()),
                ));
        }

        if !self.seen.insert(definition.id.clone()) {
            return Err(GraphValidationError::new(format!(
                "Duplicate stage id '{}'",
                definition.id
            ))
            .with_stages(vec![definition.id.clone()])
            .with_error_info(
                ErrorInfo::new(
                    "GRAPH-DUPLICATE-STAGE",
                    format!("Stage '{}' is declared twice", definition.id),
                )
                .with_fix_hint("Stage ids must be unique within a graph."),
            ));
        }

        self.stages.push(definition);
        Ok(())
    }

    /// Appends several stages in order.
    ///
    /// # Errors
    ///
    /// Returns the first validation error encountered.
    pub fn stages(
        mut self,
        definitions: impl IntoIterator<Item = StageDefinition>,
    ) -> Result<Self, GraphValidationError> {
        for definition in definitions {
            self.add_stage(definition)?;
        }
        Ok(self)
    }

    /// Returns the graph name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the number of stages added so far.
    #[must_use]
    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }

    /// Builds the graph.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is blank or the chain has fewer than two
    /// stages.
    pub fn build(self) -> Result<StageGraph, GraphValidationError> {
        if self.name.trim().is_empty() {
            return Err(GraphValidationError::new(
                "Graph name cannot be empty or whitespace-only",
            )
            .with_error_info(ErrorInfo::new("GRAPH-EMPTY-NAME", "Graph has no name")));
        }

        match self.stages.len() {
            0 => {
                return Err(GraphValidationError::new("Graph has no stages").with_error_info(
                    ErrorInfo::new("GRAPH-EMPTY", "Cannot build an empty graph")
                        .with_fix_hint("Add an entry and an exit stage before building."),
                ));
            }
            1 => {
                return Err(GraphValidationError::new(
                    "Graph needs at least an entry and an exit stage",
                )
                .with_stages(vec![self.stages[0].id.clone()])
                .with_error_info(
                    ErrorInfo::new("GRAPH-TOO-SHORT", "A single stage has no transitions")
                        .with_fix_hint("Add at least one more stage."),
                ));
            }
            _ => {}
        }

        let mut edge_ids = HashSet::new();
        for pair in self.stages.windows(2) {
            let (source, target) = (StageId::new(pair[0].id.as_str()), StageId::new(pair[1].id.as_str()));
            let id = TransitionId::between(&source, &target);
            if !edge_ids.insert(id.clone()) {
                return Err(GraphValidationError::new(format!(
                    "Transition id '{id}' is derived twice"
                ))
                .with_stages(vec![pair[0].id.clone(), pair[1].id.clone()])
                .with_error_info(
                    ErrorInfo::new(
                        "GRAPH-DUPLICATE-TRANSITION",
                        format!("Two stage pairs both map to transition '{id}'"),
                    )
                    .with_fix_hint("Avoid '-' in stage ids that could merge with a neighbour."),
                ));
            }
        }

        Ok(assemble(self.name, self.stages))
    }
}

/// Assembles definitions that are known to be valid.
pub(crate) fn assemble(name: String, definitions: Vec<StageDefinition>) -> StageGraph {
    let last = definitions.len().saturating_sub(1);
    let mut stages = Vec::with_capacity(definitions.len());
    let mut edge_labels = Vec::with_capacity(last);

    for (position, definition) in definitions.into_iter().enumerate() {
        if position < last {
            edge_labels.push(definition.outgoing_label);
        }
        stages.push((StageId::new(definition.id), definition.labels));
    }

    StageGraph::assemble(name, stages, edge_labels)
}
