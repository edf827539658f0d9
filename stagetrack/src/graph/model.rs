//! Stage and transition entities and the graph that owns them.

use crate::core::{StageRole, StageStatus};
use crate::errors::UnknownEntityError;
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::collections::HashMap;
use std::fmt;

use super::GraphSnapshot;

/// Stable identifier of a stage, unique within its graph.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StageId(String);

impl StageId {
    /// Creates a stage id.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for StageId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for StageId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for StageId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Identifier of a transition, derived from its (source, target) pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransitionId(String);

impl TransitionId {
    /// Derives the id of the edge from `source` to `target` (`e{source}-{target}`).
    #[must_use]
    pub fn between(source: &StageId, target: &StageId) -> Self {
        Self(format!("e{source}-{target}"))
    }

    /// Wraps a raw id string, e.g. one received from an external caller.
    #[must_use]
    pub fn from_raw(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TransitionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for TransitionId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// The labels a stage shows in each phase of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageLabels {
    /// Shown before the stage has started.
    pub idle: String,
    /// Shown while the stage is active.
    pub in_progress: String,
    /// Shown once the stage has succeeded.
    pub complete: String,
}

impl StageLabels {
    /// Creates a label set.
    #[must_use]
    pub fn new(
        idle: impl Into<String>,
        in_progress: impl Into<String>,
        complete: impl Into<String>,
    ) -> Self {
        Self {
            idle: idle.into(),
            in_progress: in_progress.into(),
            complete: complete.into(),
        }
    }

    /// Uses the same text for every phase.
    #[must_use]
    pub fn uniform(label: impl Into<String>) -> Self {
        let label = label.into();
        Self {
            idle: label.clone(),
            in_progress: label.clone(),
            complete: label,
        }
    }

    /// Returns the label matching `status`.
    #[must_use]
    pub fn for_status(&self, status: StageStatus) -> &str {
        match status {
            StageStatus::Idle | StageStatus::Failed => &self.idle,
            StageStatus::Active => &self.in_progress,
            StageStatus::Succeeded => &self.complete,
        }
    }
}

/// A named step of the pipeline with a visual status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stage {
    id: StageId,
    position: usize,
    role: StageRole,
    label: String,
    status: StageStatus,
    labels: StageLabels,
}

impl Stage {
    pub(crate) fn new(id: StageId, position: usize, role: StageRole, labels: StageLabels) -> Self {
        Self {
            id,
            position,
            role,
            label: labels.idle.clone(),
            status: StageStatus::Idle,
            labels,
        }
    }

    /// Returns the stage id.
    #[must_use]
    pub fn id(&self) -> &StageId {
        &self.id
    }

    /// Returns the zero-based ordinal position.
    #[must_use]
    pub fn position(&self) -> usize {
        self.position
    }

    /// Returns the structural role.
    #[must_use]
    pub fn role(&self) -> StageRole {
        self.role
    }

    /// Returns the current display label.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Returns the current status.
    #[must_use]
    pub fn status(&self) -> StageStatus {
        self.status
    }

    /// Returns the label script for this stage.
    #[must_use]
    pub fn labels(&self) -> &StageLabels {
        &self.labels
    }
}

/// A directed edge between two consecutive stages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transition {
    id: TransitionId,
    source: StageId,
    target: StageId,
    label: String,
    active: bool,
}

impl Transition {
    pub(crate) fn new(source: StageId, target: StageId, label: impl Into<String>) -> Self {
        Self {
            id: TransitionId::between(&source, &target),
            source,
            target,
            label: label.into(),
            active: false,
        }
    }

    /// Returns the transition id.
    #[must_use]
    pub fn id(&self) -> &TransitionId {
        &self.id
    }

    /// Returns the source stage id.
    #[must_use]
    pub fn source(&self) -> &StageId {
        &self.source
    }

    /// Returns the target stage id.
    #[must_use]
    pub fn target(&self) -> &StageId {
        &self.target
    }

    /// Returns the display label.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Returns whether the edge is visually emphasized.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active
    }
}

/// A single write against the graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Mutation {
    /// Set a stage's status and label.
    SetStageStatus {
        /// Target stage.
        id: StageId,
        /// New status.
        status: StageStatus,
        /// New display label.
        label: String,
    },
    /// Toggle a transition's active flag.
    SetTransitionActive {
        /// Target transition.
        id: TransitionId,
        /// New active flag.
        active: bool,
    },
}

/// A linear chain of stages joined by transitions.
///
/// The shape (which stages and transitions exist) is fixed when the graph is
/// built. Only stage labels, stage statuses and transition active flags change
/// afterwards, and every change bumps [`StageGraph::revision`].
#[derive(Debug, Clone)]
pub struct StageGraph {
    name: String,
    stages: Vec<Stage>,
    transitions: Vec<Transition>,
    stage_index: HashMap<StageId, usize>,
    transition_index: HashMap<TransitionId, usize>,
    revision: u64,
}

impl StageGraph {
    /// Assembles a graph from already-validated stages.
    ///
    /// Transitions are derived from consecutive pairs; `edge_labels[i]` labels
    /// the edge leaving stage `i`.
    pub(crate) fn assemble(
        name: String,
        stages: Vec<(StageId, StageLabels)>,
        edge_labels: Vec<String>,
    ) -> Self {
        let len = stages.len();
        let stages: Vec<Stage> = stages
            .into_iter()
            .enumerate()
            .map(|(position, (id, labels))| {
                Stage::new(id, position, StageRole::for_position(position, len), labels)
            })
            .collect();

        let transitions: Vec<Transition> = stages
            .windows(2)
            .zip(edge_labels)
            .map(|(pair, label)| Transition::new(pair[0].id.clone(), pair[1].id.clone(), label))
            .collect();

        let stage_index = stages
            .iter()
            .enumerate()
            .map(|(i, s)| (s.id.clone(), i))
            .collect();
        let transition_index = transitions
            .iter()
            .enumerate()
            .map(|(i, t)| (t.id.clone(), i))
            .collect();

        Self {
            name,
            stages,
            transitions,
            stage_index,
            transition_index,
            revision: 0,
        }
    }

    /// Returns the graph name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the stages in pipeline order.
    #[must_use]
    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    /// Returns the transitions in pipeline order.
    #[must_use]
    pub fn transitions(&self) -> &[Transition] {
        &self.transitions
    }

    /// Returns the number of stages.
    #[must_use]
    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }

    /// Returns the number of transitions.
    #[must_use]
    pub fn transition_count(&self) -> usize {
        self.transitions.len()
    }

    /// Returns the mutation counter.
    #[must_use]
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Looks up a stage by id.
    #[must_use]
    pub fn stage(&self, id: &str) -> Option<&Stage> {
        self.stage_index.get(id).map(|&i| &self.stages[i])
    }

    /// Looks up a transition by id.
    #[must_use]
    pub fn transition(&self, id: &str) -> Option<&Transition> {
        self.transition_index.get(id).map(|&i| &self.transitions[i])
    }

    /// Returns the edge from `source` to `target`, if the pair is adjacent.
    #[must_use]
    pub fn transition_between(&self, source: &StageId, target: &StageId) -> Option<&Transition> {
        self.transition(TransitionId::between(source, target).as_str())
    }

    /// Returns the entry stage.
    #[must_use]
    pub fn entry(&self) -> &Stage {
        &self.stages[0]
    }

    /// Returns the exit stage.
    #[must_use]
    pub fn exit(&self) -> &Stage {
        &self.stages[self.stages.len() - 1]
    }

    /// Returns the transition leading into the stage, if any.
    #[must_use]
    pub fn incoming(&self, id: &str) -> Option<&Transition> {
        let position = *self.stage_index.get(id)?;
        position.checked_sub(1).map(|i| &self.transitions[i])
    }

    /// Returns the transition leaving the stage, if any.
    #[must_use]
    pub fn outgoing(&self, id: &str) -> Option<&Transition> {
        let position = *self.stage_index.get(id)?;
        self.transitions.get(position)
    }

    /// Sets a stage's status and display label.
    ///
    /// # Errors
    ///
    /// Returns [`UnknownEntityError`] if no stage has this id.
    pub fn set_stage_status(
        &mut self,
        id: &str,
        status: StageStatus,
        label: impl Into<String>,
    ) -> Result<(), UnknownEntityError> {
        let index = self.resolve_stage(id)?;
        let stage = &mut self.stages[index];
        stage.status = status;
        stage.label = label.into();
        self.revision += 1;
        Ok(())
    }

    /// Sets a transition's active flag.
    ///
    /// # Errors
    ///
    /// Returns [`UnknownEntityError`] if no transition has this id.
    pub fn set_transition_active(&mut self, id: &str, active: bool) -> Result<(), UnknownEntityError> {
        let index = self.resolve_transition(id)?;
        self.transitions[index].active = active;
        self.revision += 1;
        Ok(())
    }

    /// Applies a batch of mutations all-or-nothing.
    ///
    /// Every id is resolved before anything is written, so a batch naming an
    /// unknown entity leaves the graph and its revision untouched.
    ///
    /// # Errors
    ///
    /// Returns the first [`UnknownEntityError`] found in the batch.
    pub fn apply(&mut self, batch: &[Mutation]) -> Result<(), UnknownEntityError> {
        let resolved = batch
            .iter()
            .map(|mutation| match mutation {
                Mutation::SetStageStatus { id, .. } => self.resolve_stage(id.as_str()),
                Mutation::SetTransitionActive { id, .. } => self.resolve_transition(id.as_str()),
            })
            .collect::<Result<Vec<usize>, _>>()?;

        for (mutation, index) in batch.iter().zip(resolved) {
            match mutation {
                Mutation::SetStageStatus { status, label, .. } => {
                    let stage = &mut self.stages[index];
                    stage.status = *status;
                    stage.label.clone_from(label);
                }
                Mutation::SetTransitionActive { active, .. } => {
                    self.transitions[index].active = *active;
                }
            }
            self.revision += 1;
        }
        Ok(())
    }

    /// Takes a read-only copy of the current state.
    #[must_use]
    pub fn snapshot(&self) -> GraphSnapshot {
        GraphSnapshot {
            name: self.name.clone(),
            revision: self.revision,
            stages: self.stages.clone(),
            transitions: self.transitions.clone(),
        }
    }

    fn resolve_stage(&self, id: &str) -> Result<usize, UnknownEntityError> {
        self.stage_index
            .get(id)
            .copied()
            .ok_or_else(|| UnknownEntityError::stage(id))
    }

    fn resolve_transition(&self, id: &str) -> Result<usize, UnknownEntityError> {
        self.transition_index
            .get(id)
            .copied()
            .ok_or_else(|| UnknownEntityError::transition(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::EntityKind;
    use pretty_assertions::assert_eq;

    fn three_stage_graph() -> StageGraph {
        StageGraph::assemble(
            "test".to_string(),
            vec![
                (StageId::new("a"), StageLabels::uniform("A")),
                (StageId::new("b"), StageLabels::new("B", "B...", "B done")),
                (StageId::new("c"), StageLabels::uniform("C")),
            ],
            vec!["ab".to_string(), "bc".to_string()],
        )
    }

    #[test]
    fn test_assemble_derives_consecutive_edges() {
        let graph = three_stage_graph();
        let ids: Vec<&str> = graph.transitions().iter().map(|t| t.id().as_str()).collect();
        assert_eq!(ids, vec!["ea-b", "eb-c"]);
        assert_eq!(graph.transitions()[1].label(), "bc");
    }

    #[test]
    fn test_roles_and_positions() {
        let graph = three_stage_graph();
        assert_eq!(graph.entry().id().as_str(), "a");
        assert_eq!(graph.exit().id().as_str(), "c");
        assert_eq!(graph.stage("b").unwrap().role(), StageRole::Interior);
        assert_eq!(graph.stage("b").unwrap().position(), 1);
    }

    #[test]
    fn test_new_stage_shows_idle_label() {
        let graph = three_stage_graph();
        let stage = graph.stage("b").unwrap();
        assert_eq!(stage.label(), "B");
        assert_eq!(stage.status(), StageStatus::Idle);
    }

    #[test]
    fn test_incoming_and_outgoing() {
        let graph = three_stage_graph();
        assert!(graph.incoming("a").is_none());
        assert_eq!(graph.outgoing("a").unwrap().id().as_str(), "ea-b");
        assert_eq!(graph.incoming("c").unwrap().id().as_str(), "eb-c");
        assert!(graph.outgoing("c").is_none());
        assert!(graph.incoming("zzz").is_none());
    }

    #[test]
    fn test_transition_between() {
        let graph = three_stage_graph();
        assert!(graph
            .transition_between(&StageId::new("a"), &StageId::new("b"))
            .is_some());
        assert!(graph
            .transition_between(&StageId::new("a"), &StageId::new("c"))
            .is_none());
    }

    #[test]
    fn test_set_stage_status() {
        let mut graph = three_stage_graph();
        graph.set_stage_status("b", StageStatus::Active, "B...").unwrap();

        let stage = graph.stage("b").unwrap();
        assert_eq!(stage.status(), StageStatus::Active);
        assert_eq!(stage.label(), "B...");
        assert_eq!(graph.revision(), 1);
    }

    #[test]
    fn test_set_stage_status_unknown_id() {
        let mut graph = three_stage_graph();
        let err = graph
            .set_stage_status("nope", StageStatus::Active, "x")
            .unwrap_err();
        assert_eq!(err.kind, EntityKind::Stage);
        assert_eq!(graph.revision(), 0);
    }

    #[test]
    fn test_set_transition_active_unknown_id() {
        let mut graph = three_stage_graph();
        let err = graph.set_transition_active("ea-c", true).unwrap_err();
        assert_eq!(err, UnknownEntityError::transition("ea-c"));
    }

    #[test]
    fn test_apply_is_all_or_nothing() {
        let mut graph = three_stage_graph();
        let batch = vec![
            Mutation::SetStageStatus {
                id: StageId::new("a"),
                status: StageStatus::Succeeded,
                label: "A".to_string(),
            },
            Mutation::SetTransitionActive {
                id: TransitionId::from_raw("ex-y"),
                active: true,
            },
        ];

        assert!(graph.apply(&batch).is_err());
        assert_eq!(graph.stage("a").unwrap().status(), StageStatus::Idle);
        assert_eq!(graph.revision(), 0);
    }

    #[test]
    fn test_apply_counts_each_mutation() {
        let mut graph = three_stage_graph();
        let batch = vec![
            Mutation::SetTransitionActive {
                id: TransitionId::from_raw("ea-b"),
                active: true,
            },
            Mutation::SetStageStatus {
                id: StageId::new("b"),
                status: StageStatus::Active,
                label: "B...".to_string(),
            },
        ];

        graph.apply(&batch).unwrap();
        assert!(graph.transition("ea-b").unwrap().is_active());
        assert_eq!(graph.revision(), 2);
    }

    #[test]
    fn test_labels_for_status() {
        let labels = StageLabels::new("idle", "busy", "done");
        assert_eq!(labels.for_status(StageStatus::Idle), "idle");
        assert_eq!(labels.for_status(StageStatus::Active), "busy");
        assert_eq!(labels.for_status(StageStatus::Succeeded), "done");
    }

    #[test]
    fn test_mutation_serialization() {
        let mutation = Mutation::SetTransitionActive {
            id: TransitionId::from_raw("e1-2"),
            active: true,
        };
        let json = serde_json::to_value(&mutation).unwrap();
        assert_eq!(json["op"], "set_transition_active");
        assert_eq!(json["id"], "e1-2");
    }
}
