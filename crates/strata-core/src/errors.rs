use thiserror::Error;

use crate::node::NodeKind;

/// Lowering-specific error types
///
/// Rules and the engine return these wrapped in `anyhow::Error`, so callers can
/// `downcast_ref::<LoweringError>()` to tell configuration problems apart from
/// failures reported by collaborators.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LoweringError {
    #[error("Configuration error: collaborator `{key}` is missing from the lowering context")]
    MissingCollaborator { key: String },

    #[error("Configuration error: collaborators missing from the lowering context: {}", keys.join(", "))]
    MissingCollaborators { keys: Vec<String> },

    #[error("Configuration error: collaborator `{key}` is not a {expected}")]
    CollaboratorType { key: String, expected: &'static str },

    #[error("Rule {rule} cannot lower {found} (expected {expected})")]
    UnexpectedNode {
        rule: &'static str,
        expected: &'static str,
        found: NodeKind,
    },

    #[error("Stage `{stage}` left {found} unlowered")]
    NotLowered { stage: String, found: NodeKind },

    #[error("Float literal `{value}` has no target representation")]
    NonFiniteFloat { value: String },

    #[error("Lowering exceeded maximum depth ({max})")]
    DepthExceeded { max: usize },

    #[error("Unknown standard library module `{path}`")]
    UnknownStdlibModule { path: String },

    #[error("Configuration error: {0}")]
    Config(String),
}

impl LoweringError {
    /// Create a missing collaborator error
    pub fn missing(key: impl ToString) -> Self {
        Self::MissingCollaborator {
            key: key.to_string(),
        }
    }

    /// Create a collaborator type mismatch error
    pub fn collaborator_type(key: impl ToString, expected: &'static str) -> Self {
        Self::CollaboratorType {
            key: key.to_string(),
            expected,
        }
    }

    /// Create an error for a node a rule was asked to lower but does not claim
    pub fn unexpected_node(rule: &'static str, expected: &'static str, found: NodeKind) -> Self {
        Self::UnexpectedNode {
            rule,
            expected,
            found,
        }
    }

    /// True for the configuration class of errors (absent or mistyped collaborators)
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::MissingCollaborator { .. }
                | Self::MissingCollaborators { .. }
                | Self::CollaboratorType { .. }
                | Self::Config(_)
        )
    }
}
