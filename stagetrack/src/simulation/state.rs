//! Run identity, trigger events and the run state machine.

use crate::utils::{generate_uuid, now_utc, Timestamp};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Identifies one run of the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(Uuid);

impl RunId {
    /// Generates a fresh run id.
    #[must_use]
    pub fn new() -> Self {
        Self(generate_uuid())
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// The signal that upstream processing has started.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerEvent {
    /// Who fired the trigger (e.g., "upload").
    pub source: String,
    /// Optional correlation reference, such as the uploaded file name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    /// When the trigger was created.
    pub fired_at: Timestamp,
}

impl TriggerEvent {
    /// Creates a trigger from `source`.
    #[must_use]
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            reference: None,
            fired_at: now_utc(),
        }
    }

    /// Attaches a correlation reference.
    #[must_use]
    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = Some(reference.into());
        self
    }
}

/// Where a driver is in its run lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum RunState {
    /// No trigger observed yet.
    Idle,
    /// Steps are being applied.
    Running {
        /// The active run.
        run_id: RunId,
    },
    /// The final step has been applied.
    Done {
        /// The finished run.
        run_id: RunId,
    },
    /// The run was torn down before completion; pending steps were dropped.
    Cancelled {
        /// The cancelled run.
        run_id: RunId,
        /// Why it was cancelled.
        reason: String,
    },
    /// A step named an entity the graph does not contain.
    Failed {
        /// The failed run.
        run_id: RunId,
        /// The error message.
        error: String,
    },
}

impl RunState {
    /// Returns the run id, if a run has started.
    #[must_use]
    pub fn run_id(&self) -> Option<RunId> {
        match self {
            Self::Idle => None,
            Self::Running { run_id }
            | Self::Done { run_id }
            | Self::Cancelled { run_id, .. }
            | Self::Failed { run_id, .. } => Some(*run_id),
        }
    }

    /// Returns true while steps remain to be applied.
    #[must_use]
    pub fn is_running(&self) -> bool {
        matches!(self, Self::Running { .. })
    }

    /// Returns true once the run can make no further progress.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Done { .. } | Self::Cancelled { .. } | Self::Failed { .. }
        )
    }

    /// Short name of the state.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Running { .. } => "running",
            Self::Done { .. } => "done",
            Self::Cancelled { .. } => "cancelled",
            Self::Failed { .. } => "failed",
        }
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What happened to a trigger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TriggerOutcome {
    /// A new run started.
    Started(RunId),
    /// The driver was not idle; the trigger was dropped.
    Ignored(RunState),
}

impl TriggerOutcome {
    /// Returns true if the trigger started a run.
    #[must_use]
    pub fn is_started(&self) -> bool {
        matches!(self, Self::Started(_))
    }
}
