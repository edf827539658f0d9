//! Stage status and role enums.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The structural role a stage plays in the linear pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageRole {
    /// The first stage; has no incoming transition.
    Entry,
    /// A stage with both an incoming and an outgoing transition.
    Interior,
    /// The last stage; has no outgoing transition.
    Exit,
}

impl StageRole {
    /// Returns the role for the stage at `position` in a chain of `len` stages.
    #[must_use]
    pub fn for_position(position: usize, len: usize) -> Self {
        if position == 0 {
            Self::Entry
        } else if position + 1 == len {
            Self::Exit
        } else {
            Self::Interior
        }
    }
}

impl fmt::Display for StageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Entry => write!(f, "entry"),
            Self::Interior => write!(f, "interior"),
            Self::Exit => write!(f, "exit"),
        }
    }
}

/// The visual status of a stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    /// Stage has not started.
    #[default]
    Idle,
    /// Stage is currently in progress.
    Active,
    /// Stage completed.
    Succeeded,
    /// Stage failed. Nothing in the simulated timeline produces this status.
    Failed,
}

impl fmt::Display for StageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Active => write!(f, "active"),
            Self::Succeeded => write!(f, "succeeded"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

impl StageStatus {
    /// Returns true if the status represents a terminal state.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }

    /// Returns true if the stage is in progress.
    #[must_use]
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active)
    }

    /// Short glyph used by the text diagram.
    #[must_use]
    pub fn glyph(&self) -> &'static str {
        match self {
            Self::Idle => " ",
            Self::Active => "▶",
            Self::Succeeded => "✓",
            Self::Failed => "✗",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_role_for_position() {
        assert_eq!(StageRole::for_position(0, 5), StageRole::Entry);
        assert_eq!(StageRole::for_position(2, 5), StageRole::Interior);
        assert_eq!(StageRole::for_position(4, 5), StageRole::Exit);
        assert_eq!(StageRole::for_position(1, 2), StageRole::Exit);
    }

    #[test]
    fn test_stage_status_display() {
        assert_eq!(StageStatus::Idle.to_string(), "idle");
        assert_eq!(StageStatus::Active.to_string(), "active");
        assert_eq!(StageStatus::Succeeded.to_string(), "succeeded");
        assert_eq!(StageStatus::Failed.to_string(), "failed");
    }

    #[test]
    fn test_stage_status_is_terminal() {
        assert!(StageStatus::Succeeded.is_terminal());
        assert!(StageStatus::Failed.is_terminal());
        assert!(!StageStatus::Idle.is_terminal());
        assert!(!StageStatus::Active.is_terminal());
    }

    #[test]
    fn test_stage_status_default_is_idle() {
        assert_eq!(StageStatus::default(), StageStatus::Idle);
    }

    #[test]
    fn test_stage_status_serialize() {
        let json = serde_json::to_string(&StageStatus::Succeeded).unwrap();
        assert_eq!(json, r#""succeeded""#);

        let deserialized: StageStatus = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized, StageStatus::Succeeded);
    }

    #[test]
    fn test_stage_role_serialize() {
        let json = serde_json::to_string(&StageRole::Exit).unwrap();
        assert_eq!(json, r#""exit""#);
    }
}
