//! Read-only snapshots and the lock-guarded shared graph handle.

use super::{Mutation, Stage, StageGraph, Transition};
use crate::core::StageStatus;
use crate::errors::UnknownEntityError;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A consistent copy of a graph's state at one revision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphSnapshot {
    /// The graph name.
    pub name: String,
    /// The revision the snapshot was taken at.
    pub revision: u64,
    /// Stages in pipeline order.
    pub stages: Vec<Stage>,
    /// Transitions in pipeline order.
    pub transitions: Vec<Transition>,
}

impl GraphSnapshot {
    /// Looks up a stage by id.
    #[must_use]
    pub fn stage(&self, id: &str) -> Option<&Stage> {
        self.stages.iter().find(|s| s.id().as_str() == id)
    }

    /// Looks up a transition by id.
    #[must_use]
    pub fn transition(&self, id: &str) -> Option<&Transition> {
        self.transitions.iter().find(|t| t.id().as_str() == id)
    }

    /// Returns the ids of stages currently active.
    #[must_use]
    pub fn active_stages(&self) -> Vec<&str> {
        self.stages
            .iter()
            .filter(|s| s.status().is_active())
            .map(|s| s.id().as_str())
            .collect()
    }

    /// Returns the ids of transitions currently active.
    #[must_use]
    pub fn active_transitions(&self) -> Vec<&str> {
        self.transitions
            .iter()
            .filter(|t| t.is_active())
            .map(|t| t.id().as_str())
            .collect()
    }

    /// Returns true when every stage has succeeded and no transition is active.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.stages
            .iter()
            .all(|s| s.status() == StageStatus::Succeeded)
            && self.transitions.iter().all(|t| !t.is_active())
    }

    /// Returns true when nothing has been touched yet.
    #[must_use]
    pub fn is_pristine(&self) -> bool {
        self.stages.iter().all(|s| s.status() == StageStatus::Idle)
            && self.transitions.iter().all(|t| !t.is_active())
    }
}

/// A graph shared between its driver (the only writer) and any readers.
///
/// Every write holds the lock for its whole batch, so readers never observe
/// a half-applied step.
#[derive(Debug, Clone)]
pub struct SharedStageGraph {
    inner: Arc<RwLock<StageGraph>>,
}

impl SharedStageGraph {
    /// Wraps a graph.
    #[must_use]
    pub fn new(graph: StageGraph) -> Self {
        Self {
            inner: Arc::new(RwLock::new(graph)),
        }
    }

    /// Takes a consistent snapshot.
    #[must_use]
    pub fn snapshot(&self) -> GraphSnapshot {
        self.inner.read().snapshot()
    }

    /// Runs `f` with shared read access.
    pub fn read<R>(&self, f: impl FnOnce(&StageGraph) -> R) -> R {
        f(&self.inner.read())
    }

    /// Returns the current revision.
    #[must_use]
    pub fn revision(&self) -> u64 {
        self.inner.read().revision()
    }

    /// Sets a stage's status and label.
    ///
    /// # Errors
    ///
    /// Returns [`UnknownEntityError`] if no stage has this id.
    pub fn set_stage_status(
        &self,
        id: &str,
        status: StageStatus,
        label: impl Into<String>,
    ) -> Result<(), UnknownEntityError> {
        self.inner.write().set_stage_status(id, status, label)
    }

    /// Sets a transition's active flag.
    ///
    /// # Errors
    ///
    /// Returns [`UnknownEntityError`] if no transition has this id.
    pub fn set_transition_active(&self, id: &str, active: bool) -> Result<(), UnknownEntityError> {
        self.inner.write().set_transition_active(id, active)
    }

    /// Applies a batch atomically and returns the resulting snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`UnknownEntityError`] and leaves the graph untouched if any id
    /// in the batch does not resolve.
    pub fn apply(&self, batch: &[Mutation]) -> Result<GraphSnapshot, UnknownEntityError> {
        let mut graph = self.inner.write();
        graph.apply(batch)?;
        Ok(graph.snapshot())
    }

    /// Runs `f` with exclusive access, holding the lock for its duration.
    pub(crate) fn write<R>(&self, f: impl FnOnce(&mut StageGraph) -> R) -> R {
        f(&mut self.inner.write())
    }

    /// Returns true if both handles refer to the same graph instance.
    #[must_use]
    pub fn same_instance(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Returns a read-only handle to the same instance.
    #[must_use]
    pub fn reader(&self) -> GraphReader {
        GraphReader {
            shared: self.clone(),
        }
    }
}

/// A read-only view of a shared graph.
///
/// This is what [`SimulationDriver::graph`](crate::simulation::SimulationDriver::graph)
/// hands out. It cannot be turned back into a writable handle:
///
/// ```compile_fail
/// use stagetrack::core::StageStatus;
/// use stagetrack::simulation::SimulationDriver;
///
/// let driver = SimulationDriver::reference();
/// driver.graph().set_stage_status("4", StageStatus::Active, "hijacked");
/// ```
#[derive(Debug, Clone)]
pub struct GraphReader {
    shared: SharedStageGraph,
}

impl GraphReader {
    /// Takes a consistent snapshot.
    #[must_use]
    pub fn snapshot(&self) -> GraphSnapshot {
        self.shared.snapshot()
    }

    /// Runs `f` with shared read access.
    pub fn read<R>(&self, f: impl FnOnce(&StageGraph) -> R) -> R {
        self.shared.read(f)
    }

    /// Returns the current revision.
    #[must_use]
    pub fn revision(&self) -> u64 {
        self.shared.revision()
    }

    /// Returns true if both views observe the same graph instance.
    #[must_use]
    pub fn same_instance(&self, other: &Self) -> bool {
        self.shared.same_instance(&other.shared)
    }
}
