//! Error taxonomy for the linting pipeline.
//!
//! Build-phase errors (`DocumentError`, `ModelError`) are fatal and abort a
//! run before any findings are produced. Everything else is scoped: a
//! `RuleValidationError` only rejects one registration candidate, a
//! `ConfigurationError` only rejects one rule activation, and a `RuleError`
//! is caught per dispatch and surfaced as a finding.

use thiserror::Error;

use crate::model::NodeKind;

/// Malformed input document. Should not occur for well-formed JSON.
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("document root must be a JSON object")]
    NotAnObject,

    #[error("document nesting exceeds {limit} levels at '{path}'")]
    DepthExceeded { path: String, limit: usize },
}

/// Structural integrity failure while rebuilding the node tree.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("duplicate anchors normalize to path '{path}' ({existing} and {incoming})")]
    DuplicateAnchor {
        path: String,
        existing: NodeKind,
        incoming: NodeKind,
    },

    /// Strict mode only; the default build attaches orphans to a synthetic root.
    #[error("entry '{path}' has no owning node")]
    OrphanEntry { path: String },
}

/// A registration candidate that does not satisfy the rule contract.
#[derive(Debug, Error)]
pub enum RuleValidationError {
    #[error("rule id must not be empty")]
    EmptyId,

    #[error("rule '{0}' is already registered")]
    DuplicateId(String),

    #[error("rule '{0}' has an empty description")]
    MissingDescription(String),

    #[error("rule '{0}' declares no node kind interests")]
    NoInterests(String),

    #[error("rule '{id}' is not constructible from default parameters: {source}")]
    Construction {
        id: String,
        source: ConfigurationError,
    },
}

/// Malformed rule parameters, scoped to one rule's activation.
#[derive(Debug, Clone, Error)]
#[error("invalid value for parameter '{key}': {message}")]
pub struct ConfigurationError {
    pub key: String,
    pub message: String,
}

impl ConfigurationError {
    pub fn new(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            message: message.into(),
        }
    }
}

/// Failure inside a rule's visit or post-process step.
///
/// Never aborts a run; the engine records it as an error-severity finding and
/// keeps dispatching to the remaining rules and nodes.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct RuleError(pub String);

impl RuleError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

impl From<std::io::Error> for RuleError {
    fn from(err: std::io::Error) -> Self {
        Self(err.to_string())
    }
}

/// Fatal pipeline error: the document could not be flattened or modeled.
#[derive(Debug, Error)]
pub enum LintError {
    #[error(transparent)]
    Document(#[from] DocumentError),

    #[error(transparent)]
    Model(#[from] ModelError),
}
