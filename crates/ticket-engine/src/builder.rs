//! Fluent builders for templates, steps and tickets.
//!
//! Builders only assemble data.  [`TemplateBuilder::build`] delegates to
//! the validator and [`TicketBuilder::build`] checks the status string; the
//! `*_or_panic` variants are for callers that treat a bad definition as a
//! programming error.

use tracing::instrument;

use crate::models::{Disposal, NextStep, Step, Template, Ticket, TicketStatus};
use crate::{EngineError, TemplateError, ValidatedTemplate, Validator};

// ---------------------------------------------------------------------------
// TemplateBuilder
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct TemplateBuilder {
    template: Template,
}

impl TemplateBuilder {
    pub fn new(uid: impl Into<String>, start_step: impl Into<String>) -> Self {
        Self {
            template: Template {
                uid: uid.into(),
                start_step: start_step.into(),
                ..Default::default()
            },
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.template.name = name.into();
        self
    }

    pub fn builtin(mut self, builtin: bool) -> Self {
        self.template.builtin = builtin;
        self
    }

    pub fn end_step(mut self, step: impl Into<String>) -> Self {
        self.template.end_step.push(step.into());
        self
    }

    pub fn step(mut self, step: Step) -> Self {
        self.template.steps.push(step);
        self
    }

    pub fn steps(mut self, steps: impl IntoIterator<Item = Step>) -> Self {
        self.template.steps.extend(steps);
        self
    }

    /// Validate and wrap the assembled template.
    pub fn build(self) -> Result<ValidatedTemplate, TemplateError> {
        ValidatedTemplate::new(self.template)
    }

    /// Like [`build`](Self::build), but panics on an invalid template.
    pub fn build_or_panic(self) -> ValidatedTemplate {
        match self.build() {
            Ok(template) => template,
            Err(e) => panic!("invalid template: {e}"),
        }
    }
}

// ---------------------------------------------------------------------------
// StepBuilder
// ---------------------------------------------------------------------------

/// Assembles a [`Step`].  Defaults to `anyone_sign` with no edges.
#[derive(Debug, Clone)]
pub struct StepBuilder {
    step: Step,
}

impl StepBuilder {
    pub fn new(step: impl Into<String>, state: impl Into<String>) -> Self {
        Self {
            step: Step {
                step: step.into(),
                state: state.into(),
                disposal: Disposal::anyone(),
                ..Default::default()
            },
        }
    }

    pub fn operator<I, S>(mut self, users: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.step.operator.extend(users.into_iter().map(Into::into));
        self
    }

    pub fn next(mut self, step: impl Into<String>, operation: impl Into<String>) -> Self {
        self.step.next.push(NextStep::new(step, operation));
        self
    }

    pub fn disposal(mut self, disposal: Disposal) -> Self {
        self.step.disposal = disposal;
        self
    }

    /// Check the step on its own; graph-level rules are left to
    /// [`TemplateBuilder::build`].
    ///
    /// # Errors
    /// - [`TemplateError::BadStepConfig`] if the identifier is empty.
    /// - [`TemplateError::BadNextStep`] if an edge has an empty target or
    ///   operation.
    /// - [`TemplateError::BadSignType`] / [`TemplateError::BadJointSignRate`]
    ///   for a bad disposal.
    pub fn build(self) -> Result<Step, TemplateError> {
        if self.step.step.is_empty() {
            return Err(TemplateError::BadStepConfig);
        }
        if self
            .step
            .next
            .iter()
            .any(|n| n.step.is_empty() || n.operation.is_empty())
        {
            return Err(TemplateError::BadNextStep(self.step.step.clone()));
        }
        Validator::default().check_disposal(&self.step)?;
        Ok(self.step)
    }

    pub fn build_or_panic(self) -> Step {
        match self.build() {
            Ok(step) => step,
            Err(e) => panic!("invalid step: {e}"),
        }
    }
}

// ---------------------------------------------------------------------------
// TicketBuilder
// ---------------------------------------------------------------------------

/// Rebuilds a [`Ticket`] from stored parts.  Status defaults to `running`.
#[derive(Debug, Clone)]
pub struct TicketBuilder {
    ticket: Ticket,
    status: String,
}

impl TicketBuilder {
    pub fn new(
        uid: impl Into<String>,
        order_num: impl Into<String>,
        step: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            ticket: Ticket {
                uid: uid.into(),
                order_num: order_num.into(),
                step: step.into(),
                name: name.into(),
                ..Default::default()
            },
            status: TicketStatus::Running.to_string(),
        }
    }

    pub fn status(mut self, status: impl Into<String>) -> Self {
        self.status = status.into();
        self
    }

    pub fn operator<I, S>(mut self, users: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ticket.operator.extend(users.into_iter().map(Into::into));
        self
    }

    pub fn operated_user<I, S>(mut self, users: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ticket.operated_user.extend(users.into_iter().map(Into::into));
        self
    }

    pub fn memo(mut self, memo: impl Into<String>) -> Self {
        self.ticket.memo = memo.into();
        self
    }

    /// # Errors
    /// [`EngineError::UnknownStatus`] if the status is not
    /// `running`, `passed` or `rejected`.
    pub fn build(self) -> Result<Ticket, EngineError> {
        let status = self.status.parse::<TicketStatus>()?;
        Ok(Ticket { status, ..self.ticket })
    }

    pub fn build_or_panic(self) -> Ticket {
        match self.build() {
            Ok(ticket) => ticket,
            Err(e) => panic!("invalid ticket: {e}"),
        }
    }
}

// ---------------------------------------------------------------------------
// JSON loading
// ---------------------------------------------------------------------------

/// Deserialise a template from JSON and validate it.
#[instrument(skip_all)]
pub fn load_template(json: &str) -> Result<ValidatedTemplate, EngineError> {
    let template: Template = serde_json::from_str(json)?;
    Ok(ValidatedTemplate::new(template)?)
}
