//! Engine-level error types.

use thiserror::Error;

/// Structural problems found while validating a template.
///
/// A template that fails validation must not be registered or used.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TemplateError {
    #[error("start step is empty")]
    StartStepEmpty,

    #[error("config is empty")]
    ConfigEmpty,

    /// A step has an empty identifier.
    #[error("bad step config")]
    BadStepConfig,

    /// A non-end step has no outgoing edges.
    #[error("next step is empty in non-end step '{0}'")]
    NextStepEmpty(String),

    #[error("bad sign type '{sign_type}' in step '{step}'")]
    BadSignType {
        step: String,
        sign_type: String,
    },

    #[error("bad joint sign rate {rate} in step '{step}'")]
    BadJointSignRate {
        step: String,
        rate: f32,
    },

    #[error("end step '{0}' has next steps")]
    EndStepHasNext(String),

    #[error("duplicate step definition: '{0}'")]
    DuplicateStep(String),

    #[error("start step '{0}' not found in configurations")]
    StartStepNotFound(String),

    /// An edge leaving the named step has an empty target.
    #[error("bad next step in step '{0}'")]
    BadNextStep(String),

    /// Steps that are referenced but undefined, or defined but never reached.
    #[error("some steps are unreachable: {0:?}")]
    UnreachableSteps(Vec<String>),
}

/// Rejected ticket transitions.  The ticket is never modified when one of
/// these is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApprovalError {
    /// The named argument was empty.
    #[error("bad arguments: {0} is empty")]
    BadArguments(&'static str),

    /// The ticket is no longer running, or the actor already acted here.
    #[error("already approved")]
    AlreadyApproved,

    #[error("invalid step: '{0}'")]
    InvalidStep(String),

    #[error("operator '{0}' not in operator list")]
    OperatorNotInOperatorList(String),
}

/// Crate-wide error for loading and construction paths.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("template validation failed: {0}")]
    Template(#[from] TemplateError),

    #[error("approval rejected: {0}")]
    Approval(#[from] ApprovalError),

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid status: '{0}'")]
    UnknownStatus(String),

    #[error("invalid sign type: '{0}'")]
    UnknownSignType(String),
}
