//! Error types for the stage tracker.
//!
//! The core only knows two failure modes: a mutation that names an entity the
//! graph does not contain, and a graph definition that violates the linear
//! chain invariants. Configuration and upload errors belong to the ambient
//! layers around the core.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

/// The main error type for stagetrack operations.
#[derive(Debug, Error)]
pub enum TrackerError {
    /// A mutation referenced a stage or transition that does not exist.
    #[error("{0}")]
    UnknownEntity(#[from] UnknownEntityError),

    /// A graph definition failed validation.
    #[error("{0}")]
    Validation(#[from] GraphValidationError),

    /// Configuration could not be loaded.
    #[error("{0}")]
    Config(#[from] ConfigError),

    /// The upload collaborator failed.
    #[cfg(feature = "upload")]
    #[error("{0}")]
    Upload(#[from] crate::upload::UploadError),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// The kind of graph entity an id refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    /// A pipeline stage.
    Stage,
    /// A transition between two stages.
    Transition,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stage => write!(f, "stage"),
            Self::Transition => write!(f, "transition"),
        }
    }
}

/// Raised when a mutation names a stage or transition id not present in the graph.
///
/// Graph shapes are fixed at construction, so this is a programmer error and
/// is fatal to the run that hits it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown {kind} '{id}'")]
pub struct UnknownEntityError {
    /// What kind of entity was referenced.
    pub kind: EntityKind,
    /// The id that failed to resolve.
    pub id: String,
}

impl UnknownEntityError {
    /// Creates an error for an unknown stage id.
    #[must_use]
    pub fn stage(id: impl Into<String>) -> Self {
        Self {
            kind: EntityKind::Stage,
            id: id.into(),
        }
    }

    /// Creates an error for an unknown transition id.
    #[must_use]
    pub fn transition(id: impl Into<String>) -> Self {
        Self {
            kind: EntityKind::Transition,
            id: id.into(),
        }
    }

    /// Converts to a dictionary representation.
    #[must_use]
    pub fn to_dict(&self) -> HashMap<String, serde_json::Value> {
        let mut map = HashMap::new();
        map.insert("type".to_string(), serde_json::json!("UnknownEntity"));
        map.insert("kind".to_string(), serde_json::json!(self.kind));
        map.insert("id".to_string(), serde_json::json!(self.id));
        map.insert("message".to_string(), serde_json::json!(self.to_string()));
        map
    }
}

/// Diagnostic metadata attached to validation errors.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ErrorInfo {
    /// Error code (e.g., "GRAPH-DUPLICATE-STAGE").
    pub code: String,
    /// Short summary of the error.
    pub summary: String,
    /// Hint for fixing the error.
    pub fix_hint: Option<String>,
    /// Additional context key-value pairs.
    #[serde(default)]
    pub context: HashMap<String, String>,
}

impl ErrorInfo {
    /// Creates new error info.
    #[must_use]
    pub fn new(code: impl Into<String>, summary: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            summary: summary.into(),
            fix_hint: None,
            context: HashMap::new(),
        }
    }

    /// Sets the fix hint.
    #[must_use]
    pub fn with_fix_hint(mut self, hint: impl Into<String>) -> Self {
        self.fix_hint = Some(hint.into());
        self
    }

    /// Adds a single context entry.
    #[must_use]
    pub fn with_context_entry(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    /// Converts to a dictionary representation.
    #[must_use]
    pub fn to_dict(&self) -> HashMap<String, serde_json::Value> {
        let mut map = HashMap::new();
        map.insert("code".to_string(), serde_json::Value::String(self.code.clone()));
        map.insert("summary".to_string(), serde_json::Value::String(self.summary.clone()));

        if let Some(ref hint) = self.fix_hint {
            map.insert("fix_hint".to_string(), serde_json::Value::String(hint.clone()));
        }
        if !self.context.is_empty() {
            let context_map: serde_json::Map<String, serde_json::Value> = self
                .context
                .iter()
                .map(|(k, v)| (k.clone(), serde_json::Value::String(v.clone())))
                .collect();
            map.insert("context".to_string(), serde_json::Value::Object(context_map));
        }

        map
    }
}

/// Error raised when a stage graph definition is invalid.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct GraphValidationError {
    /// The error message.
    pub message: String,
    /// The stage ids involved in the error.
    pub stages: Vec<String>,
    /// Optional diagnostic info.
    pub error_info: Option<ErrorInfo>,
}

impl GraphValidationError {
    /// Creates a new graph validation error.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            stages: Vec::new(),
            error_info: None,
        }
    }

    /// Sets the stages involved.
    #[must_use]
    pub fn with_stages(mut self, stages: Vec<String>) -> Self {
        self.stages = stages;
        self
    }

    /// Sets the diagnostic info.
    #[must_use]
    pub fn with_error_info(mut self, info: ErrorInfo) -> Self {
        self.error_info = Some(info);
        self
    }

    /// Returns the error code, if diagnostic info is attached.
    #[must_use]
    pub fn code(&self) -> Option<&str> {
        self.error_info.as_ref().map(|info| info.code.as_str())
    }

    /// Converts to a dictionary representation.
    #[must_use]
    pub fn to_dict(&self) -> HashMap<String, serde_json::Value> {
        let mut map = HashMap::new();
        map.insert("message".to_string(), serde_json::Value::String(self.message.clone()));
        map.insert(
            "stages".to_string(),
            serde_json::Value::Array(
                self.stages
                    .iter()
                    .map(|s| serde_json::Value::String(s.clone()))
                    .collect(),
            ),
        );
        if let Some(ref info) = self.error_info {
            let info_map: serde_json::Map<String, serde_json::Value> =
                info.to_dict().into_iter().collect();
            map.insert("error_info".to_string(), serde_json::Value::Object(info_map));
        }
        map
    }
}

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("Failed to read config file '{path}': {source}")]
    Read {
        /// The file path.
        path: String,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The configuration could not be parsed.
    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    /// A value was present but not acceptable.
    #[error("Invalid config value for '{field}': {reason}")]
    Invalid {
        /// The offending field.
        field: String,
        /// Why it was rejected.
        reason: String,
    },
}

impl ConfigError {
    /// Creates an invalid value error.
    #[must_use]
    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_entity_display() {
        let err = UnknownEntityError::stage("9");
        assert_eq!(err.to_string(), "Unknown stage '9'");

        let err = UnknownEntityError::transition("e9-10");
        assert_eq!(err.to_string(), "Unknown transition 'e9-10'");
    }

    #[test]
    fn test_unknown_entity_to_dict() {
        let dict = UnknownEntityError::transition("e1-3").to_dict();
        assert_eq!(dict.get("type").unwrap(), "UnknownEntity");
        assert_eq!(dict.get("kind").unwrap(), "transition");
        assert_eq!(dict.get("id").unwrap(), "e1-3");
    }

    #[test]
    fn test_error_info_creation() {
        let info = ErrorInfo::new("GRAPH-EMPTY", "No stages")
            .with_fix_hint("Add stages")
            .with_context_entry("graph", "ocr");

        assert_eq!(info.code, "GRAPH-EMPTY");
        assert_eq!(info.fix_hint, Some("Add stages".to_string()));
        assert_eq!(info.context.get("graph"), Some(&"ocr".to_string()));
    }

    #[test]
    fn test_validation_error_to_dict() {
        let err = GraphValidationError::new("Duplicate stage")
            .with_stages(vec!["2".to_string()])
            .with_error_info(ErrorInfo::new("GRAPH-DUPLICATE-STAGE", "dup"));

        assert_eq!(err.code(), Some("GRAPH-DUPLICATE-STAGE"));
        let dict = err.to_dict();
        assert_eq!(dict.get("message").unwrap(), "Duplicate stage");
        assert!(dict.contains_key("error_info"));
    }

    #[test]
    fn test_tracker_error_from_unknown_entity() {
        let err: TrackerError = UnknownEntityError::stage("x").into();
        assert!(matches!(err, TrackerError::UnknownEntity(_)));
        assert_eq!(err.to_string(), "Unknown stage 'x'");
    }

    #[test]
    fn test_config_error_invalid() {
        let err = ConfigError::invalid("step_interval_ms", "must be positive");
        assert!(err.to_string().contains("step_interval_ms"));
    }
}
