/// Convenience result type used across nodeflow.
pub type NodeflowResult<T> = Result<T, NodeflowError>;

/// Programming-error class failures.
///
/// These are distinct from user-facing graph [`crate::Diagnostic`]s: they signal payloads that
/// cannot be interpreted at all (a known node type missing a required field, unreadable JSON),
/// never a graph that is merely invalid.
#[derive(thiserror::Error, Debug)]
pub enum NodeflowError {
    /// A node payload does not match the shape required by its type.
    #[error("payload error on node '{node}': {message}")]
    Payload {
        /// Offending node id.
        node: String,
        /// Parser message.
        message: String,
    },

    /// Invalid caller-provided options or inputs.
    #[error("validation error: {0}")]
    Validation(String),

    /// Errors when serializing or deserializing data structures.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl NodeflowError {
    /// Build a [`NodeflowError::Payload`] value.
    pub fn payload(node: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Payload {
            node: node.into(),
            message: message.into(),
        }
    }

    /// Build a [`NodeflowError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`NodeflowError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
