//! Stable diagnostic codes and the structured messages built from them.

use crate::foundation::ids::NodeId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable, user-facing diagnostic code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DiagnosticCode {
    /// No scene/frame terminal exists.
    #[serde(rename = "ErrSceneRequired")]
    SceneRequired,
    /// More than one scene/frame terminal exists.
    #[serde(rename = "ErrTooManyScenes")]
    TooManyScenes,
    /// A drawable id would be delivered to the terminal more than once.
    #[serde(rename = "ErrDuplicateObjectIds")]
    DuplicateObjectIds,
    /// The graph contains a cycle.
    #[serde(rename = "ErrCircularDependency")]
    CircularDependency,
    /// A drawable reaches the terminal without passing an insert node.
    #[serde(rename = "ErrMissingInsertConnection")]
    MissingInsertConnection,
    /// Dangling or mismatched connection.
    #[serde(rename = "ErrInvalidConnection")]
    InvalidConnection,
    /// A node payload or node type cannot be compiled.
    #[serde(rename = "ErrNodeValidationFailed")]
    NodeValidationFailed,
    /// The assembled scene violates a scene-level bound.
    #[serde(rename = "ErrSceneValidationFailed")]
    SceneValidationFailed,
}

impl DiagnosticCode {
    /// Stable wire name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::SceneRequired => "ErrSceneRequired",
            Self::TooManyScenes => "ErrTooManyScenes",
            Self::DuplicateObjectIds => "ErrDuplicateObjectIds",
            Self::CircularDependency => "ErrCircularDependency",
            Self::MissingInsertConnection => "ErrMissingInsertConnection",
            Self::InvalidConnection => "ErrInvalidConnection",
            Self::NodeValidationFailed => "ErrNodeValidationFailed",
            Self::SceneValidationFailed => "ErrSceneValidationFailed",
        }
    }
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Diagnostic severity. Errors abort compilation; warnings ride along with the scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Non-fatal.
    Warning,
    /// Fatal.
    Error,
}

/// One structured, coded message about graph validity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Stable code.
    pub code: DiagnosticCode,
    /// Human-readable message.
    pub message: String,
    /// Severity.
    pub severity: Severity,
    /// Suggested fixes, if any.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub suggestions: Vec<String>,
    /// Nodes the UI should highlight.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub nodes: Vec<NodeId>,
}

impl Diagnostic {
    /// Error-severity diagnostic.
    pub fn error(code: DiagnosticCode, message: impl Into<String>) -> Self {
        Self::new(code, Severity::Error, message)
    }

    /// Warning-severity diagnostic.
    pub fn warning(code: DiagnosticCode, message: impl Into<String>) -> Self {
        Self::new(code, Severity::Warning, message)
    }

    fn new(code: DiagnosticCode, severity: Severity, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            severity,
            suggestions: Vec::new(),
            nodes: Vec::new(),
        }
    }

    /// Attach the nodes involved.
    pub fn with_nodes(mut self, nodes: impl IntoIterator<Item = NodeId>) -> Self {
        self.nodes.extend(nodes);
        self
    }

    /// Attach one suggested fix.
    pub fn suggest(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    /// Whether this diagnostic aborts compilation.
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sev = match self.severity {
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        write!(f, "{sev}[{}]: {}", self.code, self.message)
    }
}

/// Diagnostics returned when compilation fails. Always holds at least one error.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Diagnostics {
    /// Every diagnostic collected, errors and warnings, in discovery order.
    pub entries: Vec<Diagnostic>,
}

impl Diagnostics {
    /// Whether any entry carries `code`.
    pub fn has(&self, code: DiagnosticCode) -> bool {
        self.entries.iter().any(|d| d.code == code)
    }

    /// Error-severity entries.
    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter().filter(|d| d.is_error())
    }

    pub(crate) fn has_errors(&self) -> bool {
        self.entries.iter().any(Diagnostic::is_error)
    }

    pub(crate) fn push(&mut self, d: Diagnostic) {
        self.entries.push(d);
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, d) in self.entries.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{d}")?;
        }
        Ok(())
    }
}

impl std::error::Error for Diagnostics {}

#[cfg(test)]
#[path = "../../tests/unit/compile/diagnostics.rs"]
mod tests;
