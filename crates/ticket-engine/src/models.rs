//! Core domain models for approval workflows.
//!
//! These types are plain data: a [`Template`] describes the step graph and
//! a [`Ticket`] is one instance travelling through it.  They serialise
//! to/from JSON with the field names used by stored templates and tickets.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::EngineError;

// ---------------------------------------------------------------------------
// SignType
// ---------------------------------------------------------------------------

/// Consensus rule deciding when a step is complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignType {
    /// A share of the roster (the step's joint sign rate) must act.
    JointlySign,
    /// Every listed operator must act.
    SerialSign,
    /// The first authorised actor completes the step.
    AnyoneSign,
}

impl SignType {
    pub const ALL: [SignType; 3] = [Self::JointlySign, Self::SerialSign, Self::AnyoneSign];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::JointlySign => "jointly_sign",
            Self::SerialSign  => "serial_sign",
            Self::AnyoneSign  => "anyone_sign",
        }
    }
}

impl fmt::Display for SignType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SignType {
    type Err = EngineError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "jointly_sign" => Ok(Self::JointlySign),
            "serial_sign"  => Ok(Self::SerialSign),
            "anyone_sign"  => Ok(Self::AnyoneSign),
            other          => Err(EngineError::UnknownSignType(other.to_owned())),
        }
    }
}

// ---------------------------------------------------------------------------
// Disposal
// ---------------------------------------------------------------------------

/// How a step's completion is decided.
///
/// `sign_type` is kept as the wire string so that a template naming an
/// unknown discipline still deserialises and is rejected by the validator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Disposal {
    #[serde(default)]
    pub sign_type: String,
    /// Required share of the roster, only read for `jointly_sign`.
    #[serde(default)]
    pub joint_sign_rate: f32,
}

impl Disposal {
    pub fn new(sign_type: SignType, joint_sign_rate: f32) -> Self {
        Self {
            sign_type: sign_type.as_str().to_owned(),
            joint_sign_rate,
        }
    }

    pub fn anyone() -> Self {
        Self::new(SignType::AnyoneSign, 0.0)
    }

    pub fn serial() -> Self {
        Self::new(SignType::SerialSign, 0.0)
    }

    pub fn jointly(rate: f32) -> Self {
        Self::new(SignType::JointlySign, rate)
    }

    /// Resolve the sign type, `None` if the string is not recognised.
    pub fn kind(&self) -> Option<SignType> {
        self.sign_type.parse().ok()
    }
}

// ---------------------------------------------------------------------------
// NextStep
// ---------------------------------------------------------------------------

/// Labelled edge to another step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NextStep {
    /// Target step identifier.
    #[serde(default)]
    pub step: String,
    /// Action that triggers this transition, e.g. `approve` or `reject`.
    #[serde(default)]
    pub operation: String,
}

impl NextStep {
    pub fn new(step: impl Into<String>, operation: impl Into<String>) -> Self {
        Self {
            step: step.into(),
            operation: operation.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Step
// ---------------------------------------------------------------------------

/// A named node in a template's graph.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Step {
    /// Unique identifier within the template.
    #[serde(default)]
    pub step: String,
    /// Informational state label.
    #[serde(default)]
    pub state: String,
    /// Users entitled to act when a ticket arrives at this step.
    #[serde(default)]
    pub operator: Vec<String>,
    /// Outgoing edges, in match order.
    #[serde(default)]
    pub next: Vec<NextStep>,
    #[serde(default)]
    pub disposal: Disposal,
}

// ---------------------------------------------------------------------------
// Template
// ---------------------------------------------------------------------------

/// A reusable workflow definition.
///
/// Validate it (see [`crate::ValidatedTemplate`]) before handing it to
/// the approval engine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Template {
    #[serde(default)]
    pub uid: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub start_step: String,
    #[serde(default)]
    pub end_step: Vec<String>,
    #[serde(rename = "config", default)]
    pub steps: Vec<Step>,
    #[serde(default)]
    pub builtin: bool,
}

// ---------------------------------------------------------------------------
// TicketStatus
// ---------------------------------------------------------------------------

/// Lifecycle status of a ticket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
    #[default]
    Running,
    Passed,
    Rejected,
}

impl fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Running  => write!(f, "running"),
            Self::Passed   => write!(f, "passed"),
            Self::Rejected => write!(f, "rejected"),
        }
    }
}

impl FromStr for TicketStatus {
    type Err = EngineError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "running"  => Ok(Self::Running),
            "passed"   => Ok(Self::Passed),
            "rejected" => Ok(Self::Rejected),
            other      => Err(EngineError::UnknownStatus(other.to_owned())),
        }
    }
}

impl From<TicketStatus> for String {
    fn from(status: TicketStatus) -> Self {
        status.to_string()
    }
}

// ---------------------------------------------------------------------------
// Ticket
// ---------------------------------------------------------------------------

/// A live workflow instance.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticket {
    #[serde(default)]
    pub order_num: String,
    #[serde(default)]
    pub name: String,
    pub status: TicketStatus,
    pub uid: String,
    /// Current step; always names a step of the ticket's template.
    pub step: String,
    /// Users still expected to act at the current step.
    #[serde(default)]
    pub operator: Vec<String>,
    /// Users who already acted at the current step.
    #[serde(default)]
    pub operated_user: Vec<String>,
    #[serde(default)]
    pub memo: String,
}

impl Ticket {
    pub fn is_running(&self) -> bool {
        self.status == TicketStatus::Running
    }

    pub fn has_operated(&self, user: &str) -> bool {
        self.operated_user.iter().any(|u| u == user)
    }

    pub fn is_operator(&self, user: &str) -> bool {
        self.operator.iter().any(|u| u == user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn sign_type_round_trips_through_wire_strings() {
        for kind in SignType::ALL {
            assert_eq!(kind.as_str().parse::<SignType>().unwrap(), kind);
        }
        assert!(matches!(
            "majority_sign".parse::<SignType>(),
            Err(EngineError::UnknownSignType(s)) if s == "majority_sign"
        ));
    }

    #[test]
    fn unknown_status_is_rejected() {
        assert_eq!("passed".parse::<TicketStatus>().unwrap(), TicketStatus::Passed);
        assert!(matches!(
            "archived".parse::<TicketStatus>(),
            Err(EngineError::UnknownStatus(_))
        ));
    }

    #[test]
    fn disposal_with_unknown_sign_type_still_deserialises() {
        let disposal: Disposal =
            serde_json::from_value(json!({ "sign_type": "vote", "joint_sign_rate": 0.5 }))
                .expect("should deserialise");
        assert_eq!(disposal.sign_type, "vote");
        assert_eq!(disposal.kind(), None);
        assert_eq!(Disposal::jointly(0.5).kind(), Some(SignType::JointlySign));
    }

    #[test]
    fn template_uses_config_as_step_list_key() {
        let template: Template = serde_json::from_value(json!({
            "uid": "tpl-1",
            "start_step": "draft",
            "end_step": ["done"],
            "config": [
                { "step": "draft", "next": [{ "step": "done", "operation": "submit" }],
                  "disposal": { "sign_type": "anyone_sign" } },
                { "step": "done", "disposal": { "sign_type": "anyone_sign" } }
            ]
        }))
        .expect("should deserialise");

        assert_eq!(template.steps.len(), 2);
        assert_eq!(template.steps[0].next[0], NextStep::new("done", "submit"));
        assert!(template.steps[1].next.is_empty());
        assert!(!template.builtin);
    }

    #[test]
    fn ticket_serialises_status_in_snake_case() {
        let ticket = Ticket {
            uid: "t-1".into(),
            step: "draft".into(),
            status: TicketStatus::Rejected,
            ..Default::default()
        };
        let value = serde_json::to_value(&ticket).unwrap();
        assert_eq!(value["status"], "rejected");
        assert_eq!(value["operated_user"], json!([]));
    }
}
